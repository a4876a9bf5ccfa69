//! Synthetic consumer panel for advertising offers.
//!
//! A panel of personas, each defined by demographics, values, pains and
//! decision habits, reacts to an [`model::Offer`] with a structured
//! [`model::PersonaResponse`]: an emotional read, a rational read and a
//! purchase decision. Three interchangeable backends produce those
//! responses behind [`evaluator::OfferEvaluator`]:
//!
//! - `api`: the Anthropic Messages API
//! - `cli`: a local `claude` binary
//! - `synthetic`: a deterministic-ish heuristic for offline runs
//!
//! [`orchestrator::Orchestrator`] fans one offer out across many personas,
//! concurrently or one at a time, and reports per-persona failures without
//! aborting the batch.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod orchestrator;
pub mod prompts;
pub mod store;

pub use config::PanelConfig;
pub use error::{Error, Result};
pub use model::{Offer, Persona, PersonaResponse};
pub use orchestrator::{BatchOutcome, Orchestrator};
pub use store::PersonaStore;
