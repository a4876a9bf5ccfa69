//! Synthetic evaluator: heuristic persona responses without any backend.
//!
//! Used for fast iteration and deterministic-shape testing. The output is
//! flavored by persona attributes (income, traits) and the offer's price
//! and discount, with bounded random jitter. Randomness is isolated in a
//! seedable generator so tests can pin it down.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::EvalError;
use crate::evaluator::{parser, OfferEvaluator};
use crate::model::{Decision, Emotion, Offer, Persona, PersonaResponse};

/// Price strings containing one of these read as attractive anchors.
const PRICE_ANCHORS: [&str; 3] = ["990", "1000", "1500"];

/// The single anchor that excites price-sensitive personas on its own.
const LOW_PRICE_ANCHOR: &str = "990";

/// Fixed catalog of generic objections.
pub const OBJECTION_CATALOG: [&str; 6] = [
    "Not clear what equipment they use",
    "No information about staff qualifications",
    "The price is suspiciously low, quality may match it",
    "No customer reviews",
    "The studio address is not listed",
    "No idea how many sessions I would need",
];

const CONVINCERS: [&str; 5] = [
    "Reviews from real clients with before and after photos",
    "Information about certification and staff experience",
    "A money-back guarantee if I do not like the result",
    "A thorough consultation before the procedure",
    "Clear information about how many sessions are needed",
];

const EMOTION_REASONS: [&str; 4] = [
    "it matches my price expectations",
    "I was looking for something like this",
    "I need more information",
    "it sounds too good to be true",
];

const IMPRESSION_DOUBTS: [&str; 3] = [
    "I need to think about it",
    "I have my doubts",
    "I want to know more",
];

const IMPRESSION_SOUNDS: [&str; 3] = ["tempting", "decent", "attractive"];

const IMPRESSION_HESITATIONS: [&str; 3] = [
    "not sure",
    "I should check the reviews first",
    "too cheap?",
];

/// Heuristic evaluator bound to one persona.
#[derive(Debug)]
pub struct SyntheticEvaluator {
    persona: Arc<Persona>,
    rng: Mutex<StdRng>,
}

impl SyntheticEvaluator {
    pub fn new(persona: Arc<Persona>) -> Self {
        Self {
            persona,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Fixed seed for reproducible output.
    pub fn with_seed(persona: Arc<Persona>, seed: u64) -> Self {
        Self {
            persona,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Generate a response for `offer`.
    ///
    /// Synchronous and infallible for any persona that passed validation.
    pub fn generate(&self, offer: &Offer) -> PersonaResponse {
        let mut rng = self.rng.lock().expect("rng lock poisoned");
        let rng = &mut *rng;

        let emotion = self.pick_emotion(offer);
        let decision = self.pick_decision(offer);

        let alignment_with_values: BTreeMap<String, f64> = self
            .persona
            .values
            .iter()
            .take(3)
            .map(|value| (value.clone(), rng.gen_range(0.3..0.9)))
            .collect();

        let pain_points_addressed: Vec<String> = self
            .persona
            .pain_points
            .choose_multiple(rng, 2)
            .cloned()
            .collect();

        let objection_count = rng.gen_range(1..=3);
        let objections: Vec<String> = OBJECTION_CATALOG
            .choose_multiple(rng, objection_count)
            .map(|s| s.to_string())
            .collect();

        PersonaResponse {
            persona_id: self.persona.id.clone(),
            persona_name: self.persona.display_name(),
            test_id: offer
                .test_id
                .clone()
                .unwrap_or_else(parser::generated_test_id),
            offer_headline: offer.headline.clone(),
            primary_emotion: emotion,
            emotion_intensity: rng.gen_range(0.6..0.95),
            emotional_reasoning: format!(
                "As {}, I feel {} because {}",
                self.persona.name,
                emotion,
                choose(rng, &EMOTION_REASONS),
            ),
            first_impression: self.first_impression(rng),
            detailed_reasoning: self.detailed_reasoning(offer, rng),
            perceived_value: self.perceived_value(offer, rng),
            decision,
            confidence_score: rng.gen_range(0.7..0.9),
            alignment_with_values,
            pain_points_addressed,
            objections,
            what_would_convince: Some(choose(rng, &CONVINCERS).to_string()),
            timestamp: Utc::now(),
            model_used: "synthetic".to_string(),
            response_time_ms: Some(rng.gen_range(100..=300)),
        }
    }

    fn pick_emotion(&self, offer: &Offer) -> Emotion {
        if self.persona.is_price_sensitive() {
            let low_anchor = offer
                .price
                .as_deref()
                .is_some_and(|p| p.contains(LOW_PRICE_ANCHOR));
            return if offer.discount.is_some() || low_anchor {
                Emotion::Excited
            } else {
                Emotion::Skeptical
            };
        }
        if self.persona.is_skeptic() {
            return Emotion::Skeptical;
        }
        if self.persona.is_analytical_buyer() {
            return Emotion::Interested;
        }
        Emotion::Curious
    }

    fn pick_decision(&self, offer: &Offer) -> Decision {
        if self.persona.is_skeptic() {
            Decision::ProbablyNot
        } else if self.persona.is_impulsive() {
            Decision::StrongYes
        } else if offer.discount.is_some() {
            Decision::MaybeYes
        } else {
            Decision::Neutral
        }
    }

    fn perceived_value(&self, offer: &Offer, rng: &mut StdRng) -> f64 {
        let mut value: f64 = 5.0;
        if offer.discount.is_some() {
            value += 2.0;
        }
        let price = offer.price.as_deref().map(str::to_lowercase);
        if price.is_some_and(|p| PRICE_ANCHORS.iter().any(|anchor| p.contains(anchor))) {
            value += 1.5;
        }
        if self.persona.is_skeptic() {
            value -= 2.0;
        }
        (value + rng.gen_range(-1.0..1.0)).clamp(0.0, 10.0)
    }

    fn first_impression(&self, rng: &mut StdRng) -> String {
        match rng.gen_range(0..3) {
            0 => format!("Interesting, but {}", choose(rng, &IMPRESSION_DOUBTS)),
            1 => format!("Sounds {}", choose(rng, &IMPRESSION_SOUNDS)),
            _ => format!("Hmm, {}", choose(rng, &IMPRESSION_HESITATIONS)),
        }
    }

    fn detailed_reasoning(&self, offer: &Offer, rng: &mut StdRng) -> String {
        let price = offer.price.as_deref().unwrap_or("Not listed");
        let price_read = if self.persona.is_price_sensitive() {
            "affordable for me"
        } else {
            "acceptable"
        };
        let discount = offer.discount.as_deref().unwrap_or("None");
        let discount_read = if offer.discount.is_some() {
            "motivates me to try"
        } else {
            "an actual promotion would help"
        };
        let trigger_read = if offer.discount.is_some() {
            "hits my positive triggers"
        } else {
            "not all of my triggers are engaged"
        };
        let fit = rng.gen_range(60..=85);

        format!(
            "Reading this offer as {}:\n\n\
             1. **Price**: {} - {}\n\
             2. **Discount**: {} - {}\n\
             3. **Value**: matches my needs at {}%\n\
             4. **Triggers**: {}\n",
            self.persona.name, price, price_read, discount, discount_read, fit, trigger_read,
        )
    }
}

fn choose<'a>(rng: &mut StdRng, pool: &'a [&'a str]) -> &'a str {
    // Pools are non-empty constants.
    pool.choose(rng).copied().unwrap_or(pool[0])
}

#[async_trait]
impl OfferEvaluator for SyntheticEvaluator {
    fn persona(&self) -> &Arc<Persona> {
        &self.persona
    }

    fn backend_name(&self) -> String {
        "synthetic".to_string()
    }

    async fn evaluate(&self, offer: &Offer) -> Result<PersonaResponse, EvalError> {
        Ok(self.generate(offer))
    }
}
