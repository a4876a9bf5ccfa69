//! Batch orchestration: one offer fanned out across many personas.
//!
//! Partial failure is the expected steady state. Every persona's failure,
//! whether at evaluator construction or during evaluation, is recorded
//! next to the successes instead of aborting the batch.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::EvalError;
use crate::evaluator::EvaluatorFactory;
use crate::model::{Offer, Persona, PersonaResponse};

/// One persona's failure inside a batch.
#[derive(Debug)]
pub struct BatchFailure {
    pub persona_id: String,
    pub error: EvalError,
}

/// Outcome of one batch: successes in issue order plus per-persona failures.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub responses: Vec<PersonaResponse>,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty() && self.failures.is_empty()
    }
}

/// Fans one offer out across personas through an evaluator factory.
pub struct Orchestrator {
    factory: Arc<dyn EvaluatorFactory>,
}

impl Orchestrator {
    pub fn new(factory: Arc<dyn EvaluatorFactory>) -> Self {
        Self { factory }
    }

    /// Evaluate `offer` against every persona.
    ///
    /// Successes come back in the order personas were supplied, in both
    /// modes. An empty persona list yields an empty outcome, not an error;
    /// the caller decides what an empty batch means.
    pub async fn run_batch(
        &self,
        offer: &Offer,
        personas: &[Arc<Persona>],
        parallel: bool,
    ) -> BatchOutcome {
        tracing::info!(
            offer = %offer.headline,
            personas = personas.len(),
            parallel,
            "Starting batch evaluation"
        );

        let results = if parallel {
            self.run_parallel(offer, personas).await
        } else {
            self.run_sequential(offer, personas).await
        };

        let mut outcome = BatchOutcome::default();
        for (persona, result) in personas.iter().zip(results) {
            match result {
                Ok(response) => outcome.responses.push(response),
                Err(error) => {
                    tracing::warn!(persona = %persona.id, %error, "Persona evaluation failed");
                    outcome.failures.push(BatchFailure {
                        persona_id: persona.id.clone(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            succeeded = outcome.responses.len(),
            failed = outcome.failures.len(),
            "Batch finished"
        );
        outcome
    }

    /// Issue every persona task before awaiting any, then slot results
    /// back by index so the outcome keeps issue order. No concurrency cap:
    /// every persona gets an in-flight task.
    async fn run_parallel(
        &self,
        offer: &Offer,
        personas: &[Arc<Persona>],
    ) -> Vec<Result<PersonaResponse, EvalError>> {
        let mut slots: Vec<Option<Result<PersonaResponse, EvalError>>> =
            (0..personas.len()).map(|_| None).collect();

        let mut join_set = JoinSet::new();
        for (idx, persona) in personas.iter().enumerate() {
            // Construction failure is scoped to this persona's slot.
            match self.factory.build(persona.clone()) {
                Ok(evaluator) => {
                    let offer = offer.clone();
                    join_set.spawn(async move {
                        let result = evaluator.evaluate(&offer).await;
                        (idx, result)
                    });
                }
                Err(error) => {
                    slots[idx] = Some(Err(error));
                }
            }
        }

        while let Some(join_result) = join_set.join_next().await {
            match join_result {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => {
                    if e.is_panic() {
                        tracing::error!("Evaluation task panicked: {e}");
                    } else {
                        tracing::error!("Evaluation task cancelled: {e}");
                    }
                }
            }
        }

        // A slot left empty means its task died without settling.
        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(EvalError::Backend {
                        backend: "task".to_string(),
                        reason: "Evaluation task died before settling".to_string(),
                    })
                })
            })
            .collect()
    }

    async fn run_sequential(
        &self,
        offer: &Offer,
        personas: &[Arc<Persona>],
    ) -> Vec<Result<PersonaResponse, EvalError>> {
        let mut results = Vec::with_capacity(personas.len());
        for persona in personas {
            let result = match self.factory.build(persona.clone()) {
                Ok(evaluator) => evaluator.evaluate(offer).await,
                Err(error) => Err(error),
            };
            results.push(result);
        }
        results
    }
}
