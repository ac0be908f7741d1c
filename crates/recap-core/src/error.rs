//! Error types for the Recap enhancement pipeline.
//!
//! Errors are organized by the component that raises them. Only
//! [`EnhanceError`] ever crosses the orchestrator boundary, and only when the
//! fallback policy is switched off.

use std::fmt;
use thiserror::Error;

/// Configuration-specific errors.
///
/// The fail-closed loader recovers from all of these by using defaults.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to parse JSON configuration
    #[error("Failed to parse JSON config: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Failures of the analysis step (credential, transport, remote service, parsing).
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The provider needs a credential and none was resolved
    #[error("No credential available for {provider}")]
    CredentialMissing { provider: String },

    /// The request could not be sent or the connection dropped
    #[error("{message}")]
    Transport { message: String },

    /// Non-success HTTP status or a rejected request
    #[error("{message}")]
    Request {
        message: String,
        status_code: Option<u16>,
    },

    /// The call did not complete in time
    #[error("Analysis timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The service replied, but no verdict could be extracted
    #[error("Malformed verdict: {message}")]
    MalformedVerdict { message: String },

    /// The source image could not be read or encoded
    #[error("Image error: {message}")]
    Image { message: String },
}

/// Pipeline state in which an enhancement attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CheckingEnabled,
    ResolvingCredential,
    PreparingImage,
    Delaying,
    CallingService,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::CheckingEnabled => "checking enabled",
            Stage::ResolvingCredential => "resolving credential",
            Stage::PreparingImage => "preparing image",
            Stage::Delaying => "delaying",
            Stage::CallingService => "calling service",
        };
        f.write_str(s)
    }
}

/// Reported enhancement failure, surfaced only when `fallback_to_original` is false.
#[derive(Error, Debug)]
#[error("Enhancement failed while {stage}: {source}")]
pub struct EnhanceError {
    pub stage: Stage,
    #[source]
    pub source: ServiceError,
}

impl EnhanceError {
    pub fn new(stage: Stage, source: ServiceError) -> Self {
        Self { stage, source }
    }
}

/// Convenience type alias for analysis results.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enhance_error_names_stage() {
        let err = EnhanceError::new(
            Stage::CallingService,
            ServiceError::Timeout { timeout_ms: 8000 },
        );
        let msg = err.to_string();
        assert!(msg.contains("calling service"), "Got: {msg}");
        assert!(msg.contains("8000ms"), "Got: {msg}");
    }

    #[test]
    fn test_credential_missing_message() {
        let err = ServiceError::CredentialMissing {
            provider: "gemini".to_string(),
        };
        assert_eq!(err.to_string(), "No credential available for gemini");
    }
}
