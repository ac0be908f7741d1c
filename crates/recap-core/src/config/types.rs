//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Enhancement pipeline settings (`[enhancement_settings]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementConfig {
    /// Master switch; when false the original caption is always returned
    pub enabled: bool,

    /// Skip enhancement entirely when no credential is resolvable
    pub api_key_required: bool,

    /// Return the original caption on failure instead of reporting an error
    pub fallback_to_original: bool,

    /// Randomized pause before the service call, in seconds
    pub processing_delay: DelayRange,

    /// Per-call service timeout in milliseconds
    pub timeout_ms: u64,

    /// Extra attempts for transient service failures (0 = single attempt)
    pub retry_attempts: u32,

    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,

    /// Minimum fraction of original words a correction must keep.
    /// 0.0 disables the check.
    pub min_word_overlap: f32,

    /// Maximum concurrent enhancements in a batch
    pub parallel: usize,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_required: false,
            fallback_to_original: true,
            processing_delay: DelayRange::default(),
            timeout_ms: 8000,
            retry_attempts: 0,
            retry_delay_ms: 500,
            min_word_overlap: 0.0,
            parallel: 4,
        }
    }
}

impl EnhancementConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Bounds of the pre-call delay, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayRange {
    pub min: f64,
    pub max: f64,
}

impl Default for DelayRange {
    fn default() -> Self {
        Self { min: 0.5, max: 1.5 }
    }
}

impl DelayRange {
    /// A range that disables the delay.
    pub const ZERO: DelayRange = DelayRange { min: 0.0, max: 0.0 };

    /// Longest pause accepted by validation; sampling clamps to it.
    pub const MAX_SECS: f64 = 300.0;

    pub fn is_zero(&self) -> bool {
        self.max <= 0.0
    }
}

/// How to reach the Gemini analysis service (`[service]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// API base endpoint
    pub endpoint: String,

    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: "${GEMINI_API_KEY}".to_string(),
            model: "gemini-2.5-flash".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
