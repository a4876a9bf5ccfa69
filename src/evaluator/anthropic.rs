//! Anthropic Messages API evaluator.
//!
//! One HTTP call per evaluation: the persona's system prompt plus a single
//! user message carrying the offer. No retries at this layer; failures
//! propagate to the orchestrator, which scopes them to the persona.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::PanelConfig;
use crate::error::{ConfigError, EvalError};
use crate::evaluator::{parser, OfferEvaluator};
use crate::model::{Offer, Persona, PersonaResponse};
use crate::prompts;

const API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2048;
const TEMPERATURE: f32 = 0.7;

/// Evaluator backed by the Anthropic Messages API.
#[derive(Debug)]
pub struct AnthropicEvaluator {
    persona: Arc<Persona>,
    client: Client,
    api_key: SecretString,
    model: String,
    timeout: Duration,
}

impl AnthropicEvaluator {
    /// Fails fast when no API credential is configured.
    pub fn new(persona: Arc<Persona>, config: &PanelConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?;

        // The configured timeout applies to every request on this client.
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Ok(Self {
            persona,
            client,
            api_key,
            model: config.model.clone(),
            timeout: config.timeout,
        })
    }

    async fn send_request(&self, request: &MessagesRequest) -> Result<String, EvalError> {
        let url = format!("{API_BASE}/v1/messages");

        tracing::debug!(
            persona = %self.persona.id,
            model = %self.model,
            "Sending evaluation request to Anthropic"
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("anthropic-version", API_VERSION)
            .header("x-api-key", self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(EvalError::Backend {
                backend: self.model.clone(),
                reason: format!("HTTP {status}: {body}"),
            });
        }

        let envelope: MessagesResponse =
            serde_json::from_str(&body).map_err(|e| EvalError::Backend {
                backend: self.model.clone(),
                reason: format!("Malformed API envelope: {e}. Raw: {body}"),
            })?;

        let text = envelope
            .content
            .iter()
            .map(|ContentBlock::Text { text }| text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(text)
    }

    fn request_error(&self, e: reqwest::Error) -> EvalError {
        if e.is_timeout() {
            EvalError::Timeout {
                backend: self.model.clone(),
                timeout: self.timeout,
            }
        } else {
            EvalError::Backend {
                backend: self.model.clone(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl OfferEvaluator for AnthropicEvaluator {
    fn persona(&self) -> &Arc<Persona> {
        &self.persona
    }

    fn backend_name(&self) -> String {
        self.model.clone()
    }

    async fn evaluate(&self, offer: &Offer) -> Result<PersonaResponse, EvalError> {
        let request = MessagesRequest {
            model: self.model.clone(),
            messages: vec![ApiMessage {
                role: "user",
                content: prompts::evaluation_prompt(offer, &self.persona),
            }],
            max_tokens: MAX_TOKENS,
            system: prompts::system_prompt(&self.persona),
            temperature: TEMPERATURE,
        };

        let started = Instant::now();
        let raw = self.send_request(&request).await?;
        let latency_ms = started.elapsed().as_millis() as u64;

        tracing::debug!(persona = %self.persona.id, latency_ms, "Received Anthropic response");

        parser::parse_response(&raw, &self.persona, offer, &self.model, Some(latency_ms))
    }
}

// -- Messages API request/response types --

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<ApiMessage>,
    max_tokens: u32,
    system: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock {
    Text { text: String },
}
