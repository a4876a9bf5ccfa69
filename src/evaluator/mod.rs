//! Offer evaluation backends.
//!
//! Each evaluator binds exactly one persona to one backend: the Anthropic
//! Messages API, the claude CLI, or the local synthetic heuristic. The
//! orchestrator only ever sees the [`OfferEvaluator`] trait.

mod anthropic;
mod cli;
mod parser;
mod synthetic;

pub use anthropic::AnthropicEvaluator;
pub use cli::CliEvaluator;
pub use parser::{extract_json_payload, parse_response};
pub use synthetic::{SyntheticEvaluator, OBJECTION_CATALOG};

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::PanelConfig;
use crate::error::EvalError;
use crate::model::{Offer, Persona, PersonaResponse};

/// One persona judging offers through one backend.
#[async_trait]
pub trait OfferEvaluator: std::fmt::Debug + Send + Sync {
    /// The persona this evaluator speaks as.
    fn persona(&self) -> &Arc<Persona>;

    /// Backend identifier for logs and the `model_used` field.
    fn backend_name(&self) -> String;

    /// Evaluate one offer in character.
    ///
    /// Failures are scoped to this persona's attempt; no retries happen
    /// at this layer.
    async fn evaluate(&self, offer: &Offer) -> Result<PersonaResponse, EvalError>;
}

/// Which backend evaluators are built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorKind {
    /// Anthropic Messages API over HTTP.
    Api,
    /// claude CLI subprocess.
    Cli,
    /// Local heuristic, no network.
    Synthetic,
}

impl std::str::FromStr for EvaluatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "api" | "anthropic" => Ok(Self::Api),
            "cli" | "claude-cli" | "claude_cli" => Ok(Self::Cli),
            "synthetic" | "mock" => Ok(Self::Synthetic),
            _ => Err(format!(
                "invalid evaluator kind '{}', expected one of: api, cli, synthetic",
                s
            )),
        }
    }
}

impl std::fmt::Display for EvaluatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api => write!(f, "api"),
            Self::Cli => write!(f, "cli"),
            Self::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Builds one evaluator per persona.
///
/// The orchestrator goes through this seam so tests can substitute
/// scripted or failing backends. Construction failures (for example a
/// missing API credential) are scoped to that persona's attempt.
pub trait EvaluatorFactory: Send + Sync {
    fn build(&self, persona: Arc<Persona>) -> Result<Arc<dyn OfferEvaluator>, EvalError>;
}

/// Production factory: builds evaluators of one [`EvaluatorKind`] from
/// the panel configuration.
pub struct KindFactory {
    kind: EvaluatorKind,
    config: PanelConfig,
}

impl KindFactory {
    pub fn new(kind: EvaluatorKind, config: PanelConfig) -> Self {
        Self { kind, config }
    }

    pub fn kind(&self) -> EvaluatorKind {
        self.kind
    }
}

impl EvaluatorFactory for KindFactory {
    fn build(&self, persona: Arc<Persona>) -> Result<Arc<dyn OfferEvaluator>, EvalError> {
        let evaluator: Arc<dyn OfferEvaluator> = match self.kind {
            EvaluatorKind::Api => Arc::new(AnthropicEvaluator::new(persona, &self.config)?),
            EvaluatorKind::Cli => Arc::new(CliEvaluator::new(persona, &self.config)),
            EvaluatorKind::Synthetic => Arc::new(SyntheticEvaluator::new(persona)),
        };
        Ok(evaluator)
    }
}
