//! claude CLI evaluator.
//!
//! Writes the combined prompt to a scoped temporary file, invokes the CLI
//! with a structured-output flag, and hands its stdout to the parser. The
//! prompt file is removed on every exit path when its handle drops.

use std::io::Write;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::PanelConfig;
use crate::error::EvalError;
use crate::evaluator::{parser, OfferEvaluator};
use crate::model::{Offer, Persona, PersonaResponse};
use crate::prompts;

/// Backend identifier used in logs and `model_used`.
const BACKEND: &str = "claude-cli";

/// Hard cap on one CLI invocation.
const CLI_TIMEOUT: Duration = Duration::from_secs(60);

/// Evaluator that shells out to the claude CLI.
#[derive(Debug)]
pub struct CliEvaluator {
    persona: Arc<Persona>,
    binary: String,
}

impl CliEvaluator {
    pub fn new(persona: Arc<Persona>, config: &PanelConfig) -> Self {
        Self {
            persona,
            binary: config.cli_binary.clone(),
        }
    }

    fn invocation_args(prompt_path: &str) -> [&str; 4] {
        ["--message-file", prompt_path, "--format", "json"]
    }

    fn backend_error(&self, reason: String) -> EvalError {
        EvalError::Backend {
            backend: BACKEND.to_string(),
            reason,
        }
    }
}

#[async_trait]
impl OfferEvaluator for CliEvaluator {
    fn persona(&self) -> &Arc<Persona> {
        &self.persona
    }

    fn backend_name(&self) -> String {
        BACKEND.to_string()
    }

    async fn evaluate(&self, offer: &Offer) -> Result<PersonaResponse, EvalError> {
        let prompt = prompts::combined_prompt(&self.persona, offer);

        let mut prompt_file = tempfile::NamedTempFile::new()
            .map_err(|e| self.backend_error(format!("Failed to create prompt file: {e}")))?;
        prompt_file
            .write_all(prompt.as_bytes())
            .map_err(|e| self.backend_error(format!("Failed to write prompt file: {e}")))?;
        let prompt_path = prompt_file.path().display().to_string();

        tracing::debug!(
            persona = %self.persona.id,
            binary = %self.binary,
            "Invoking claude CLI"
        );

        let started = Instant::now();
        // Dropping the output future on timeout kills the child.
        let result = tokio::time::timeout(
            CLI_TIMEOUT,
            tokio::process::Command::new(&self.binary)
                .args(Self::invocation_args(&prompt_path))
                .stdin(Stdio::null())
                .output(),
        )
        .await;

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(self.backend_error(format!("Failed to run {}: {e}", self.binary)));
            }
            Err(_) => {
                return Err(EvalError::Timeout {
                    backend: BACKEND.to_string(),
                    timeout: CLI_TIMEOUT,
                });
            }
        };
        let latency_ms = started.elapsed().as_millis() as u64;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.backend_error(format!(
                "Exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parser::parse_response(&stdout, &self.persona, offer, BACKEND, Some(latency_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AgeBracket, IncomeBracket, PersonalityTrait, Triggers};

    fn persona() -> Arc<Persona> {
        Arc::new(Persona {
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
        })
    }

    fn offer() -> Offer {
        Offer::builder(
            "Laser hair removal: first session 990 RUB",
            "Smooth skin without razors, certified staff.",
            "Book now",
        )
        .test_id("test-cli")
        .build()
        .expect("valid offer")
    }

    fn with_binary(binary: &str) -> CliEvaluator {
        let config = PanelConfig {
            cli_binary: binary.to_string(),
            ..PanelConfig::default()
        };
        CliEvaluator::new(persona(), &config)
    }

    #[test]
    fn invocation_args_request_json_output() {
        let args = CliEvaluator::invocation_args("/tmp/prompt.txt");
        assert_eq!(args, ["--message-file", "/tmp/prompt.txt", "--format", "json"]);
    }

    #[tokio::test]
    async fn missing_binary_is_a_backend_error() {
        let evaluator = with_binary("/nonexistent/claude-binary");
        let err = evaluator.evaluate(&offer()).await.unwrap_err();
        match err {
            EvalError::Backend { backend, reason } => {
                assert_eq!(backend, "claude-cli");
                assert!(reason.contains("Failed to run"), "reason: {reason}");
            }
            other => panic!("expected Backend, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stdout_that_is_not_json_is_a_parse_error() {
        // echo prints the arguments back, which is not a valid payload.
        let evaluator = with_binary("echo");
        let err = evaluator.evaluate(&offer()).await.unwrap_err();
        assert!(matches!(err, EvalError::Parse { .. }), "got {err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_reports_code_and_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("failing-claude");
        std::fs::write(&script, "#!/bin/sh\necho 'model exploded' >&2\nexit 3\n")
            .expect("write script");
        let mut perms = std::fs::metadata(&script).expect("metadata").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).expect("chmod");

        let evaluator = with_binary(&script.display().to_string());
        let err = evaluator.evaluate(&offer()).await.unwrap_err();
        match err {
            EvalError::Backend { reason, .. } => {
                assert!(reason.contains("model exploded"), "reason: {reason}");
                assert!(reason.contains("3"), "reason: {reason}");
            }
            other => panic!("expected Backend, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_run_parses_stdout() {
        use std::os::unix::fs::PermissionsExt;

        let json = r#"{
            "primary_emotion": "excited",
            "emotion_intensity": 0.8,
            "emotional_reasoning": "Right in my price range.",
            "first_impression": "Finally affordable.",
            "detailed_reasoning": "The discount makes it easy to try once.",
            "perceived_value": 7.5,
            "decision": "maybe_yes",
            "confidence_score": 0.8
        }"#;

        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("fake-claude");
        std::fs::write(&script, format!("#!/bin/sh\ncat <<'EOF'\n{json}\nEOF\n"))
            .expect("write script");
        let mut perms = std::fs::metadata(&script).expect("metadata").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).expect("chmod");

        let evaluator = with_binary(&script.display().to_string());
        let response = evaluator.evaluate(&offer()).await.expect("evaluate");
        assert_eq!(response.model_used, "claude-cli");
        assert_eq!(response.persona_id, "anna-student");
        assert_eq!(response.test_id, "test-cli");
        assert!(response.response_time_ms.is_some());
    }
}
