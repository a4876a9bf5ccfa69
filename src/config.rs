//! Configuration for adpanel.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Model used by the api backend unless overridden.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Main configuration for the panel.
///
/// Everything resolves from environment variables so the binary and the
/// library share one source of truth. Only the api backend needs the key;
/// resolution therefore never fails just because it is absent.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Anthropic API key (`ANTHROPIC_API_KEY`).
    pub api_key: Option<SecretString>,
    /// Model for the api backend (`ADPANEL_MODEL`).
    pub model: String,
    /// Request timeout for the api backend (`ADPANEL_TIMEOUT_SECS`).
    pub timeout: Duration,
    /// Whether batches run personas concurrently (`ADPANEL_BATCH_PARALLEL`).
    pub batch_parallel: bool,
    /// Directory of persona definition files (`ADPANEL_PERSONAS_DIR`).
    pub personas_dir: PathBuf,
    /// Binary invoked by the cli backend (`ADPANEL_CLI_BINARY`).
    pub cli_binary: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
            batch_parallel: true,
            personas_dir: PathBuf::from("personas"),
            cli_binary: "claude".to_string(),
        }
    }
}

impl PanelConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            api_key: optional_env("ANTHROPIC_API_KEY")?.map(SecretString::from),
            model: optional_env("ADPANEL_MODEL")?.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(parse_optional_env("ADPANEL_TIMEOUT_SECS", 30u64)?),
            batch_parallel: parse_optional_env("ADPANEL_BATCH_PARALLEL", true)?,
            personas_dir: optional_env("ADPANEL_PERSONAS_DIR")?
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("personas")),
            cli_binary: optional_env("ADPANEL_CLI_BINARY")?.unwrap_or_else(|| "claude".to_string()),
        })
    }

    /// The API key, or the error telling the user how to set it.
    pub fn require_api_key(&self) -> Result<SecretString, ConfigError> {
        self.api_key
            .clone()
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "ANTHROPIC_API_KEY".to_string(),
                hint: "Set ANTHROPIC_API_KEY to use the api backend".to_string(),
            })
    }
}

pub(crate) fn optional_env(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(val) if val.is_empty() => Ok(None),
        Ok(val) => Ok(Some(val)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::ParseError(format!(
            "failed to read {key}: {e}"
        ))),
    }
}

pub(crate) fn parse_optional_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)?
        .map(|s| {
            s.parse().map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("{e}"),
            })
        })
        .transpose()
        .map(|opt| opt.unwrap_or(default))
}
