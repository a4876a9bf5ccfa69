//! Persona definitions.
//!
//! A persona is a synthetic consumer profile: demographics, psychographics,
//! and behavioral triggers. Personas are immutable once loaded and shared
//! read-only (`Arc<Persona>`) across concurrent evaluations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Age bracket, serialized as the range label ("18-23", ..., "55+").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeBracket {
    #[serde(rename = "18-23")]
    Age18To23,
    #[serde(rename = "24-29")]
    Age24To29,
    #[serde(rename = "30-39")]
    Age30To39,
    #[serde(rename = "40-54")]
    Age40To54,
    #[serde(rename = "55+")]
    Age55Plus,
}

impl std::fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Age18To23 => write!(f, "18-23"),
            Self::Age24To29 => write!(f, "24-29"),
            Self::Age30To39 => write!(f, "30-39"),
            Self::Age40To54 => write!(f, "40-54"),
            Self::Age55Plus => write!(f, "55+"),
        }
    }
}

/// Monthly income bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeBracket {
    Low,
    Medium,
    High,
    Luxury,
}

impl std::fmt::Display for IncomeBracket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Luxury => write!(f, "luxury"),
        }
    }
}

/// Closed set of personality traits a persona may carry (1 to 3 of them).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonalityTrait {
    Analytical,
    Emotional,
    Skeptical,
    Impulsive,
    Cautious,
    Optimistic,
    Practical,
    StatusSeeking,
    /// Budget-conscious regardless of income.
    Frugal,
}

impl std::fmt::Display for PersonalityTrait {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Analytical => "analytical",
            Self::Emotional => "emotional",
            Self::Skeptical => "skeptical",
            Self::Impulsive => "impulsive",
            Self::Cautious => "cautious",
            Self::Optimistic => "optimistic",
            Self::Practical => "practical",
            Self::StatusSeeking => "status_seeking",
            Self::Frugal => "frugal",
        };
        write!(f, "{name}")
    }
}

/// Keyword lists that attract or repel this persona.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Triggers {
    #[serde(default)]
    pub positive: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
}

/// Synthetic consumer persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    /// Unique identifier within a loaded set (e.g. "anna-student").
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// One-line description (e.g. "third-year university student").
    pub description: String,

    // Demographics
    pub age_bracket: AgeBracket,
    pub income_bracket: IncomeBracket,
    pub occupation: String,
    #[serde(default = "default_location")]
    pub location: String,

    // Psychographics
    pub personality_traits: Vec<PersonalityTrait>,
    /// Core values, at least two.
    pub values: Vec<String>,
    /// Problems this persona lives with, at least two.
    pub pain_points: Vec<String>,
    /// What this persona wants to achieve, at least two.
    pub goals: Vec<String>,

    // Behavioral
    #[serde(default)]
    pub triggers: Triggers,
    /// What weighs in a purchase decision, at least two.
    pub decision_factors: Vec<String>,

    /// Short narrative used to ground generated responses.
    #[serde(default)]
    pub background_story: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// User-defined persona, as opposed to a shipped default.
    #[serde(default)]
    pub custom: bool,
}

fn default_location() -> String {
    "Moscow".to_string()
}

impl Persona {
    /// Check cardinalities and required fields.
    ///
    /// The store refuses personas that fail this, so everything downstream
    /// can rely on the bounds holding.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::Empty { field: "id" });
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty { field: "name" });
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::Empty { field: "description" });
        }
        if self.personality_traits.is_empty() {
            return Err(ValidationError::TooFew {
                field: "personality_traits",
                min: 1,
                len: 0,
            });
        }
        if self.personality_traits.len() > 3 {
            return Err(ValidationError::TooMany {
                field: "personality_traits",
                max: 3,
                len: self.personality_traits.len(),
            });
        }
        for (field, len) in [
            ("values", self.values.len()),
            ("pain_points", self.pain_points.len()),
            ("goals", self.goals.len()),
            ("decision_factors", self.decision_factors.len()),
        ] {
            if len < 2 {
                return Err(ValidationError::TooFew { field, min: 2, len });
            }
        }
        Ok(())
    }

    /// Name as it appears on responses: `"Name (description)"`.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.description)
    }

    pub fn has_trait(&self, wanted: PersonalityTrait) -> bool {
        self.personality_traits.contains(&wanted)
    }

    /// Reacts strongly to price: low income or the frugal trait.
    pub fn is_price_sensitive(&self) -> bool {
        self.income_bracket == IncomeBracket::Low || self.has_trait(PersonalityTrait::Frugal)
    }

    pub fn is_skeptic(&self) -> bool {
        self.has_trait(PersonalityTrait::Skeptical)
    }

    pub fn is_impulsive(&self) -> bool {
        self.has_trait(PersonalityTrait::Impulsive)
    }

    /// Weighs offers rationally: high income or the analytical trait.
    pub fn is_analytical_buyer(&self) -> bool {
        matches!(
            self.income_bracket,
            IncomeBracket::High | IncomeBracket::Luxury
        ) || self.has_trait(PersonalityTrait::Analytical)
    }
}
