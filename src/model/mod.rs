//! Core data types: personas, the offers they react to, and the structured
//! responses every evaluation yields.

pub mod offer;
pub mod persona;
pub mod response;

pub use offer::Offer;
pub use persona::{AgeBracket, IncomeBracket, Persona, PersonalityTrait, Triggers};
pub use response::{Decision, Emotion, PersonaResponse};
