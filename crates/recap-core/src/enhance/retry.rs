//! Retry utilities for transient analysis failures.
//!
//! Provides classification of retryable errors and exponential backoff.

use crate::error::ServiceError;
use std::time::Duration;

/// Determine whether a service error is worth retrying.
///
/// Retryable errors: timeouts, transport failures, rate limits (429), server errors (5xx).
/// Non-retryable: missing credentials, auth failures, bad requests, malformed verdicts.
pub fn is_retryable(error: &ServiceError) -> bool {
    match error {
        ServiceError::Timeout { .. } | ServiceError::Transport { .. } => true,
        ServiceError::Request {
            status_code: Some(code),
            ..
        } => *code == 429 || (500..=599).contains(code),
        _ => false,
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(code: u16) -> ServiceError {
        ServiceError::Request {
            message: format!("HTTP {code}"),
            status_code: Some(code),
        }
    }

    #[test]
    fn test_timeout_and_transport_are_retryable() {
        assert!(is_retryable(&ServiceError::Timeout { timeout_ms: 8000 }));
        assert!(is_retryable(&ServiceError::Transport {
            message: "connection refused".to_string(),
        }));
    }

    #[test]
    fn test_rate_limit_and_server_errors_are_retryable() {
        assert!(is_retryable(&http(429)));
        assert!(is_retryable(&http(503)));
    }

    #[test]
    fn test_client_errors_not_retryable() {
        assert!(!is_retryable(&http(400)));
        assert!(!is_retryable(&http(401)));
        assert!(!is_retryable(&ServiceError::Request {
            message: "unknown provider".to_string(),
            status_code: None,
        }));
    }

    #[test]
    fn test_malformed_verdict_not_retryable() {
        assert!(!is_retryable(&ServiceError::MalformedVerdict {
            message: "no flag".to_string(),
        }));
        assert!(!is_retryable(&ServiceError::CredentialMissing {
            provider: "gemini".to_string(),
        }));
    }

    #[test]
    fn test_backoff_exponential() {
        assert_eq!(backoff_duration(0, 500), Duration::from_millis(500));
        assert_eq!(backoff_duration(1, 500), Duration::from_millis(1000));
        assert_eq!(backoff_duration(2, 500), Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_capped_at_30s() {
        assert_eq!(backoff_duration(10, 1000), Duration::from_millis(30_000));
    }
}
