//! Error types for adpanel.

use std::time::Duration;

/// Top-level error type for the panel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Persona store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Persona store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Persona '{id}' not found. Available: {}", .available.join(", "))]
    NotFound { id: String, available: Vec<String> },

    #[error("Duplicate persona id '{id}': defined in {first} and again in {second}")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },

    #[error("No valid personas found in {dir}")]
    Empty { dir: String },

    #[error("Failed to read persona directory {dir}: {source}")]
    ReadDir {
        dir: String,
        #[source]
        source: std::io::Error,
    },
}

/// Violations of the data model's bounds and cardinalities.
///
/// Distinct from [`EvalError::Parse`]: a response that decodes but carries
/// an out-of-range score fails here, not there.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("{field} must be {min}-{max} characters, got {len}")]
    BadLength {
        field: &'static str,
        min: usize,
        max: usize,
        len: usize,
    },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} needs at least {min} entries, got {len}")]
    TooFew {
        field: &'static str,
        min: usize,
        len: usize,
    },

    #[error("{field} allows at most {max} entries, got {len}")]
    TooMany {
        field: &'static str,
        max: usize,
        len: usize,
    },
}

/// Errors from a single persona's evaluation attempt.
///
/// The orchestrator records these per persona; one failing persona never
/// aborts the rest of the batch.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("Backend {backend} failed: {reason}")]
    Backend { backend: String, reason: String },

    #[error("Backend {backend} timed out after {timeout:?}")]
    Timeout { backend: String, timeout: Duration },

    #[error("Failed to parse model response: {reason}")]
    Parse {
        reason: String,
        /// Raw model output, preserved for diagnosis.
        raw: String,
    },

    #[error("Response failed validation: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for the panel.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::MissingRequired {
            key: "ANTHROPIC_API_KEY".to_string(),
            hint: "Set ANTHROPIC_API_KEY to use the api backend".to_string(),
        };
        let msg = err.to_string();
        assert!(
            msg.contains("ANTHROPIC_API_KEY"),
            "Should mention the key: {msg}"
        );
        assert!(
            msg.contains("api backend"),
            "Should include the hint: {msg}"
        );

        let err = ConfigError::InvalidValue {
            key: "ADPANEL_TIMEOUT_SECS".to_string(),
            message: "must be a number".to_string(),
        };
        let msg = err.to_string();
        assert!(
            msg.contains("ADPANEL_TIMEOUT_SECS"),
            "Should mention the key: {msg}"
        );
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::NotFound {
            id: "nobody".to_string(),
            available: vec!["anna-student".to_string(), "dmitry-skeptic".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("nobody"), "Should mention the id: {msg}");
        assert!(
            msg.contains("anna-student, dmitry-skeptic"),
            "Should list available ids: {msg}"
        );

        let err = StoreError::DuplicateId {
            id: "anna-student".to_string(),
            first: "a.json".to_string(),
            second: "b.json".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("a.json") && msg.contains("b.json"));
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError::OutOfRange {
            field: "perceived_value",
            min: 0.0,
            max: 10.0,
            value: 11.5,
        };
        let msg = err.to_string();
        assert!(
            msg.contains("perceived_value"),
            "Should mention the field: {msg}"
        );
        assert!(msg.contains("11.5"), "Should mention the value: {msg}");

        let err = ValidationError::TooFew {
            field: "values",
            min: 2,
            len: 1,
        };
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn eval_error_display() {
        let err = EvalError::Timeout {
            backend: "claude-cli".to_string(),
            timeout: Duration::from_secs(60),
        };
        let msg = err.to_string();
        assert!(msg.contains("claude-cli"), "Should mention backend: {msg}");
        assert!(msg.contains("60"), "Should mention the timeout: {msg}");

        let err = EvalError::Parse {
            reason: "expected value at line 1".to_string(),
            raw: "not json".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("expected value"), "Should carry reason: {msg}");
        // Raw text is kept on the variant for callers, not dumped into Display.
        if let EvalError::Parse { raw, .. } = &err {
            assert_eq!(raw, "not json");
        }
    }

    #[test]
    fn top_level_error_from_conversions() {
        let config_err = ConfigError::ParseError("bad".to_string());
        let err: Error = config_err.into();
        assert!(matches!(err, Error::Config(_)));

        let store_err = StoreError::Empty {
            dir: "personas".to_string(),
        };
        let err: Error = store_err.into();
        assert!(matches!(err, Error::Store(_)));

        let validation_err = ValidationError::Empty { field: "id" };
        let err: Error = validation_err.into();
        assert!(matches!(err, Error::Validation(_)));

        let eval_err = EvalError::Backend {
            backend: "anthropic".to_string(),
            reason: "HTTP 500".to_string(),
        };
        let err: Error = eval_err.into();
        assert!(matches!(err, Error::Eval(_)));
    }

    #[test]
    fn validation_lifts_into_eval_error() {
        let validation_err = ValidationError::OutOfRange {
            field: "confidence_score",
            min: 0.0,
            max: 1.0,
            value: 2.0,
        };
        let err: EvalError = validation_err.into();
        assert!(matches!(err, EvalError::Validation(_)));
    }
}
