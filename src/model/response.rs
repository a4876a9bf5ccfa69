//! Structured persona responses.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Emotional reaction to an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Excited,
    Interested,
    Neutral,
    Skeptical,
    Annoyed,
    Offended,
    Curious,
    Hopeful,
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Excited => "excited",
            Self::Interested => "interested",
            Self::Neutral => "neutral",
            Self::Skeptical => "skeptical",
            Self::Annoyed => "annoyed",
            Self::Offended => "offended",
            Self::Curious => "curious",
            Self::Hopeful => "hopeful",
        };
        write!(f, "{name}")
    }
}

/// Decision about engaging with the offer, ordered from most to least
/// favorable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    StrongYes,
    MaybeYes,
    Neutral,
    ProbablyNot,
    StrongNo,
}

impl Decision {
    /// Favorability on a 0-4 scale, strong_no = 0 through strong_yes = 4.
    pub fn score(self) -> u8 {
        match self {
            Self::StrongYes => 4,
            Self::MaybeYes => 3,
            Self::Neutral => 2,
            Self::ProbablyNot => 1,
            Self::StrongNo => 0,
        }
    }

    /// Whether this decision counts toward conversion.
    pub fn is_positive(self) -> bool {
        matches!(self, Self::StrongYes | Self::MaybeYes)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::StrongYes => "strong_yes",
            Self::MaybeYes => "maybe_yes",
            Self::Neutral => "neutral",
            Self::ProbablyNot => "probably_not",
            Self::StrongNo => "strong_no",
        };
        write!(f, "{name}")
    }
}

/// One persona's structured judgment of one offer.
///
/// Constructed exactly once per successful evaluation and never mutated;
/// ownership passes from evaluator to orchestrator to caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaResponse {
    // Identity
    pub persona_id: String,
    /// Composed "Name (description)".
    pub persona_name: String,
    pub test_id: String,
    pub offer_headline: String,

    // Emotional
    pub primary_emotion: Emotion,
    /// 0 = faint, 1 = overwhelming.
    pub emotion_intensity: f64,
    pub emotional_reasoning: String,

    // Cognitive
    pub first_impression: String,
    pub detailed_reasoning: String,
    /// 0 = worthless, 10 = exceptional.
    pub perceived_value: f64,

    // Decision
    pub decision: Decision,
    /// 0 = unsure, 1 = certain.
    pub confidence_score: f64,

    // Segmentation
    /// Value name -> how well the offer aligns with it, each in [0, 1].
    #[serde(default)]
    pub alignment_with_values: BTreeMap<String, f64>,
    #[serde(default)]
    pub pain_points_addressed: Vec<String>,
    #[serde(default)]
    pub objections: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub what_would_convince: Option<String>,

    // Metadata
    pub timestamp: DateTime<Utc>,
    /// Backend identifier: model name, "claude-cli", or "synthetic".
    pub model_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

impl PersonaResponse {
    /// Check every bound and required field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("persona_id", &self.persona_id),
            ("persona_name", &self.persona_name),
            ("test_id", &self.test_id),
            ("offer_headline", &self.offer_headline),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::Empty { field });
            }
        }

        check_unit_range("emotion_intensity", self.emotion_intensity)?;
        check_unit_range("confidence_score", self.confidence_score)?;
        if !(0.0..=10.0).contains(&self.perceived_value) {
            return Err(ValidationError::OutOfRange {
                field: "perceived_value",
                min: 0.0,
                max: 10.0,
                value: self.perceived_value,
            });
        }
        for score in self.alignment_with_values.values() {
            check_unit_range("alignment_with_values", *score)?;
        }
        Ok(())
    }
}

fn check_unit_range(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min: 0.0,
            max: 1.0,
            value,
        })
    }
}
