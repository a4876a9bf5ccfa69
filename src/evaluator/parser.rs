//! Shared response parsing for the model-backed evaluators.
//!
//! Model output arrives as free-form text, usually a JSON object and often
//! wrapped in a Markdown code fence. This module strips the fence, decodes
//! the payload, injects the identity fields the backend does not produce,
//! and runs full schema validation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::EvalError;
use crate::model::{Decision, Emotion, Offer, Persona, PersonaResponse};

/// Strip a surrounding Markdown code fence, labeled or not.
///
/// Unfenced text passes through unchanged apart from whitespace trimming.
pub fn extract_json_payload(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.strip_prefix("json").unwrap_or(rest);
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// The fields the model itself is asked to produce.
///
/// Metadata is accepted when the payload carries it (so re-parsing our own
/// serialized output is lossless) but never required.
#[derive(Debug, Deserialize)]
struct RawResponse {
    primary_emotion: Emotion,
    emotion_intensity: f64,
    emotional_reasoning: String,
    first_impression: String,
    detailed_reasoning: String,
    perceived_value: f64,
    decision: Decision,
    confidence_score: f64,
    #[serde(default)]
    alignment_with_values: BTreeMap<String, f64>,
    #[serde(default)]
    pain_points_addressed: Vec<String>,
    #[serde(default)]
    objections: Vec<String>,
    #[serde(default)]
    what_would_convince: Option<String>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    response_time_ms: Option<u64>,
}

/// Decode raw backend output into a validated [`PersonaResponse`].
///
/// Identity fields come from the persona and offer, never from the model.
/// A payload that does not decode fails with [`EvalError::Parse`] carrying
/// the raw text; one that decodes but breaks a bound fails with
/// [`EvalError::Validation`].
pub fn parse_response(
    raw_output: &str,
    persona: &Persona,
    offer: &Offer,
    backend: &str,
    latency_ms: Option<u64>,
) -> Result<PersonaResponse, EvalError> {
    let payload = extract_json_payload(raw_output);
    let raw: RawResponse = serde_json::from_str(payload).map_err(|e| EvalError::Parse {
        reason: e.to_string(),
        raw: raw_output.to_string(),
    })?;

    let response = PersonaResponse {
        persona_id: persona.id.clone(),
        persona_name: persona.display_name(),
        test_id: offer.test_id.clone().unwrap_or_else(generated_test_id),
        offer_headline: offer.headline.clone(),
        primary_emotion: raw.primary_emotion,
        emotion_intensity: raw.emotion_intensity,
        emotional_reasoning: raw.emotional_reasoning,
        first_impression: raw.first_impression,
        detailed_reasoning: raw.detailed_reasoning,
        perceived_value: raw.perceived_value,
        decision: raw.decision,
        confidence_score: raw.confidence_score,
        alignment_with_values: raw.alignment_with_values,
        pain_points_addressed: raw.pain_points_addressed,
        objections: raw.objections,
        what_would_convince: raw.what_would_convince,
        timestamp: raw.timestamp.unwrap_or_else(Utc::now),
        model_used: backend.to_string(),
        response_time_ms: latency_ms.or(raw.response_time_ms),
    };

    response.validate()?;
    Ok(response)
}

/// Fallback test id when the offer carries none.
pub(crate) fn generated_test_id() -> String {
    Utc::now().format("test-%Y%m%d-%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgeBracket, IncomeBracket, PersonalityTrait, Triggers};
    use pretty_assertions::assert_eq;

    fn persona() -> Persona {
        Persona {
            id: "anna-student".to_string(),
            name: "Anna".to_string(),
            description: "third-year university student".to_string(),
            age_bracket: AgeBracket::Age18To23,
            income_bracket: IncomeBracket::Low,
            occupation: "student".to_string(),
            location: "Moscow".to_string(),
            personality_traits: vec![PersonalityTrait::Impulsive],
            values: vec!["saving money".to_string(), "looking good".to_string()],
            pain_points: vec!["tight budget".to_string(), "no time".to_string()],
            goals: vec!["look good".to_string(), "save up".to_string()],
            triggers: Triggers::default(),
            decision_factors: vec!["price".to_string(), "reviews".to_string()],
            background_story: String::new(),
            created_at: None,
            custom: false,
        }
    }

    fn offer() -> Offer {
        Offer::builder(
            "Laser hair removal: first session 990 RUB",
            "Smooth skin without razors, certified staff.",
            "Book now",
        )
        .test_id("test-parser-001")
        .build()
        .expect("valid offer")
    }

    fn model_json() -> String {
        r#"{
            "primary_emotion": "excited",
            "emotion_intensity": 0.8,
            "emotional_reasoning": "This is exactly my price range.",
            "first_impression": "Finally affordable.",
            "detailed_reasoning": "The discount makes it easy to try once.",
            "perceived_value": 7.5,
            "decision": "maybe_yes",
            "confidence_score": 0.8,
            "alignment_with_values": {"saving money": 0.9},
            "pain_points_addressed": ["tight budget"],
            "objections": ["no address listed"],
            "what_would_convince": "reviews with photos"
        }"#
        .to_string()
    }

    // ==== Fence stripping ====

    #[test]
    fn unfenced_text_passes_through() {
        assert_eq!(extract_json_payload("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn strips_labeled_fence() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(extract_json_payload(raw), "{\"a\": 1}");
    }

    #[test]
    fn strips_bare_fence() {
        let raw = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json_payload(raw), "{\"a\": 1}");
    }

    #[test]
    fn strips_single_line_fence() {
        assert_eq!(extract_json_payload("```json{\"a\": 1}```"), "{\"a\": 1}");
    }

    #[test]
    fn tolerates_missing_closing_fence() {
        let raw = "```json\n{\"a\": 1}";
        assert_eq!(extract_json_payload(raw), "{\"a\": 1}");
    }

    // ==== Decoding and field injection ====

    #[test]
    fn parses_clean_json_and_injects_identity() {
        let response =
            parse_response(&model_json(), &persona(), &offer(), "test-model", Some(250))
                .expect("parse");

        assert_eq!(response.persona_id, "anna-student");
        assert_eq!(
            response.persona_name,
            "Anna (third-year university student)"
        );
        assert_eq!(response.test_id, "test-parser-001");
        assert_eq!(
            response.offer_headline,
            "Laser hair removal: first session 990 RUB"
        );
        assert_eq!(response.primary_emotion, Emotion::Excited);
        assert_eq!(response.decision, Decision::MaybeYes);
        assert_eq!(response.model_used, "test-model");
        assert_eq!(response.response_time_ms, Some(250));
    }

    #[test]
    fn parses_fenced_output() {
        let raw = format!("```json\n{}\n```", model_json());
        let response =
            parse_response(&raw, &persona(), &offer(), "test-model", None).expect("parse");
        assert_eq!(response.decision, Decision::MaybeYes);
    }

    #[test]
    fn generates_test_id_when_offer_has_none() {
        let offer = Offer::builder(
            "Laser hair removal: first session 990 RUB",
            "Smooth skin without razors, certified staff.",
            "Book now",
        )
        .build()
        .expect("valid offer");

        let response =
            parse_response(&model_json(), &persona(), &offer, "test-model", None).expect("parse");
        assert!(
            response.test_id.starts_with("test-20"),
            "got {}",
            response.test_id
        );
    }

    #[test]
    fn missing_required_field_is_parse_error_with_raw() {
        let raw = r#"{"primary_emotion": "excited"}"#;
        let err = parse_response(raw, &persona(), &offer(), "test-model", None).unwrap_err();
        match err {
            EvalError::Parse { raw: kept, .. } => assert_eq!(kept, raw),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn non_json_text_is_parse_error() {
        let raw = "I would rather answer in prose.";
        let err = parse_response(raw, &persona(), &offer(), "test-model", None).unwrap_err();
        assert!(matches!(err, EvalError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn out_of_range_score_is_validation_error_not_parse() {
        let raw = model_json().replace("\"perceived_value\": 7.5", "\"perceived_value\": 11.0");
        let err = parse_response(&raw, &persona(), &offer(), "test-model", None).unwrap_err();
        assert!(matches!(err, EvalError::Validation(_)), "got {err:?}");
    }

    #[test]
    fn unknown_enum_value_is_parse_error() {
        let raw = model_json().replace("\"excited\"", "\"ecstatic\"");
        let err = parse_response(&raw, &persona(), &offer(), "test-model", None).unwrap_err();
        assert!(matches!(err, EvalError::Parse { .. }), "got {err:?}");
    }

    #[test]
    fn argument_latency_wins_over_payload_field() {
        let raw = model_json().replace(
            "\"what_would_convince\": \"reviews with photos\"",
            "\"what_would_convince\": \"reviews with photos\", \"response_time_ms\": 9999",
        );
        let response =
            parse_response(&raw, &persona(), &offer(), "test-model", Some(120)).expect("parse");
        assert_eq!(response.response_time_ms, Some(120));

        let response = parse_response(&raw, &persona(), &offer(), "test-model", None).expect("parse");
        assert_eq!(response.response_time_ms, Some(9999));
    }

    #[test]
    fn reparsing_serialized_output_is_identical() {
        let first =
            parse_response(&model_json(), &persona(), &offer(), "test-model", Some(250))
                .expect("first parse");
        let serialized = serde_json::to_string(&first).expect("serialize");
        let second = parse_response(&serialized, &persona(), &offer(), "test-model", None)
            .expect("second parse");

        // Timestamp and latency survive the round trip instead of being
        // regenerated, so both passes agree exactly.
        assert_eq!(second.timestamp, first.timestamp);
        assert_eq!(second.response_time_ms, first.response_time_ms);
        assert_eq!(
            serde_json::to_value(&second).unwrap(),
            serde_json::to_value(&first).unwrap()
        );
    }
}
