//! The enhancement orchestrator.
//!
//! State flow for one call:
//!
//! ```text
//! CheckingEnabled → ResolvingCredential → PreparingImage → Delaying → CallingService
//!        │                  │                  │              │            │
//!        ▼                  ▼                  └──────────────┴────────────┤
//!     Disabled           Skipped                                           ▼
//!                                        Corrected | Unchanged | Fallback | EnhanceError
//! ```
//!
//! Any failure after the enabled check ends in `Fallback` (original caption)
//! unless `fallback_to_original` is off, in which case it is reported once as
//! an [`EnhanceError`].

use super::retry;
use crate::analysis::{AnalysisClient, AnalysisVerdict, ImageInput, ProviderFactory};
use crate::config::{Config, EnhancementConfig};
use crate::credential::{Credential, CredentialResolver};
use crate::error::{EnhanceError, ServiceError, ServiceResult, Stage};
use crate::types::{CaptionRequest, EnhancementResult, ImageSource, Outcome};
use futures_util::{Stream, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Verifies captions against their images and corrects them.
///
/// Holds only immutable state; one instance can serve concurrent calls.
pub struct Enhancer {
    settings: EnhancementConfig,
    client: AnalysisClient,
    credentials: Arc<dyn CredentialResolver>,
}

impl Enhancer {
    pub fn new(
        settings: EnhancementConfig,
        client: AnalysisClient,
        credentials: Box<dyn CredentialResolver>,
    ) -> Self {
        Self {
            settings,
            client,
            credentials: Arc::from(credentials),
        }
    }

    /// Build an enhancer for the configured service, optionally overriding the model.
    pub fn from_config(config: &Config, model_override: Option<&str>) -> ServiceResult<Self> {
        let service = ProviderFactory::create(&config.service, model_override)?;
        Ok(Self::new(
            config.enhancement_settings.clone(),
            AnalysisClient::new(service.provider),
            service.credentials,
        ))
    }

    pub fn settings(&self) -> &EnhancementConfig {
        &self.settings
    }

    /// Check `original_caption` against `image` and return the caption to use.
    ///
    /// Only fails when `fallback_to_original` is false.
    pub async fn enhance(
        &self,
        image: &ImageSource,
        original_caption: &str,
    ) -> Result<EnhancementResult, EnhanceError> {
        self.run(image, original_caption, Budget::unbounded()).await
    }

    /// Like [`Enhancer::enhance`], with the delay, service call and retries
    /// all bounded by `deadline`.
    pub async fn enhance_within(
        &self,
        image: &ImageSource,
        original_caption: &str,
        deadline: Duration,
    ) -> Result<EnhancementResult, EnhanceError> {
        self.run(image, original_caption, Budget::within(deadline)).await
    }

    /// Caption-only convenience. Never fails: reported errors degrade to the original.
    pub async fn enhance_caption(&self, image: &ImageSource, original_caption: &str) -> String {
        match self.enhance(image, original_caption).await {
            Ok(result) => result.caption,
            Err(e) => {
                tracing::warn!("Caption enhancement failed, keeping original: {e}");
                original_caption.to_string()
            }
        }
    }

    /// Enhance many captions with bounded concurrency, preserving input order.
    pub async fn enhance_batch(
        &self,
        requests: &[CaptionRequest],
    ) -> Vec<Result<EnhancementResult, EnhanceError>> {
        self.enhance_stream(requests).collect().await
    }

    /// Like [`Enhancer::enhance_batch`], yielding each result in input order
    /// as soon as it and all earlier ones are done.
    pub fn enhance_stream<'a>(
        &'a self,
        requests: &'a [CaptionRequest],
    ) -> impl Stream<Item = Result<EnhancementResult, EnhanceError>> + 'a {
        futures_util::stream::iter(requests)
            .map(move |req| self.enhance(&req.image, &req.original_caption))
            .buffered(self.settings.parallel.max(1))
    }

    async fn run(
        &self,
        image: &ImageSource,
        original_caption: &str,
        budget: Budget,
    ) -> Result<EnhancementResult, EnhanceError> {
        tracing::trace!(stage = %Stage::CheckingEnabled);
        if !self.settings.enabled {
            tracing::debug!("Enhancement disabled, returning original caption");
            return Ok(EnhancementResult::original(original_caption, Outcome::Disabled));
        }

        tracing::trace!(stage = %Stage::ResolvingCredential);
        let credential = self.credentials.resolve();
        if credential.is_none() && self.settings.api_key_required {
            tracing::debug!("No credential resolved and one is required, skipping enhancement");
            return Ok(EnhancementResult::original(original_caption, Outcome::Skipped));
        }

        match self
            .attempt(image, original_caption, credential.as_ref(), budget)
            .await
        {
            Ok(result) => Ok(result),
            Err(e) if self.settings.fallback_to_original => {
                tracing::warn!("Caption enhancement failed, keeping original: {e}");
                Ok(EnhancementResult::original(original_caption, Outcome::Fallback))
            }
            Err(e) => Err(e),
        }
    }

    async fn attempt(
        &self,
        image: &ImageSource,
        original_caption: &str,
        credential: Option<&Credential>,
        budget: Budget,
    ) -> Result<EnhancementResult, EnhanceError> {
        if credential.is_none() && self.client.requires_credential() {
            return Err(EnhanceError::new(
                Stage::ResolvingCredential,
                ServiceError::CredentialMissing {
                    provider: self.client.provider_name().to_string(),
                },
            ));
        }

        tracing::trace!(stage = %Stage::PreparingImage);
        let image = load_image(image)
            .await
            .map_err(|e| EnhanceError::new(Stage::PreparingImage, e))?;

        tracing::trace!(stage = %Stage::Delaying);
        let pause = self.settings.processing_delay.sample(&mut rand::thread_rng());
        if !pause.is_zero() {
            budget
                .sleep(pause)
                .await
                .map_err(|e| EnhanceError::new(Stage::Delaying, e))?;
        }

        tracing::trace!(stage = %Stage::CallingService);
        let verdict = self
            .call_with_retry(&image, original_caption, credential, budget)
            .await
            .map_err(|e| EnhanceError::new(Stage::CallingService, e))?;

        Ok(self.apply_verdict(original_caption, &verdict))
    }

    async fn call_with_retry(
        &self,
        image: &ImageInput,
        original_caption: &str,
        credential: Option<&Credential>,
        budget: Budget,
    ) -> ServiceResult<AnalysisVerdict> {
        let max_retries = self.settings.retry_attempts;
        let mut attempt = 0u32;
        loop {
            let timeout = budget.cap(self.settings.timeout())?;
            match self
                .client
                .analyze(image, original_caption, credential, timeout)
                .await
            {
                Ok(verdict) => return Ok(verdict),
                Err(e) if attempt < max_retries && retry::is_retryable(&e) => {
                    let delay = retry::backoff_duration(attempt, self.settings.retry_delay_ms);
                    attempt += 1;
                    tracing::debug!("Retry {attempt}/{max_retries} after {delay:?}: {e}");
                    budget.sleep(delay).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn apply_verdict(&self, original_caption: &str, verdict: &AnalysisVerdict) -> EnhancementResult {
        let Some(corrected) = verdict.correction() else {
            if !verdict.is_accurate {
                tracing::debug!("Verdict flagged the caption but gave no usable correction");
            }
            return EnhancementResult::original(original_caption, Outcome::Unchanged);
        };

        if corrected == original_caption {
            return EnhancementResult::original(original_caption, Outcome::Unchanged);
        }

        let min_overlap = self.settings.min_word_overlap;
        if min_overlap > 0.0 {
            let overlap = word_overlap(original_caption, corrected);
            if overlap < min_overlap {
                tracing::debug!(
                    "Correction shares {overlap:.2} of the original words (< {min_overlap:.2}), keeping original"
                );
                return EnhancementResult::original(original_caption, Outcome::Unchanged);
            }
        }

        tracing::debug!(confidence = ?verdict.confidence, "Caption corrected");
        EnhancementResult::corrected(corrected.to_string())
    }
}

async fn load_image(image: &ImageSource) -> ServiceResult<ImageInput> {
    match image {
        ImageSource::Bytes(bytes) => ImageInput::from_bytes(bytes),
        ImageSource::Path(path) => {
            let bytes = tokio::fs::read(path)
                .await
                .map_err(|e| ServiceError::Image {
                    message: format!("Failed to read image {}: {e}", path.display()),
                })?;
            ImageInput::from_bytes(&bytes)
        }
    }
}

/// Fraction of the original caption's distinct words kept by the correction.
fn word_overlap(original: &str, corrected: &str) -> f32 {
    let words = |s: &str| -> HashSet<String> {
        s.split_whitespace()
            .map(|w| {
                w.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|w| !w.is_empty())
            .collect()
    };
    let original = words(original);
    if original.is_empty() {
        return 1.0;
    }
    let corrected = words(corrected);
    original.intersection(&corrected).count() as f32 / original.len() as f32
}

/// Optional overall deadline shared by the delay, the call and any retries.
#[derive(Debug, Clone, Copy)]
struct Budget {
    deadline: Option<(Instant, Duration)>,
}

impl Budget {
    fn unbounded() -> Self {
        Self { deadline: None }
    }

    /// A deadline too far out to represent is no deadline at all.
    fn within(limit: Duration) -> Self {
        match Instant::now().checked_add(limit) {
            Some(at) => Self {
                deadline: Some((at, limit)),
            },
            None => Self::unbounded(),
        }
    }

    fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|(at, _)| at.saturating_duration_since(Instant::now()))
    }

    fn expired(&self) -> ServiceError {
        let limit = self.deadline.map(|(_, limit)| limit).unwrap_or_default();
        ServiceError::Timeout {
            timeout_ms: limit.as_millis() as u64,
        }
    }

    /// Shrink a per-call timeout to what is left of the deadline.
    fn cap(&self, timeout: Duration) -> ServiceResult<Duration> {
        match self.remaining() {
            None => Ok(timeout),
            Some(left) if left.is_zero() => Err(self.expired()),
            Some(left) => Ok(timeout.min(left)),
        }
    }

    /// Sleep for `pause`, failing if the deadline arrives first.
    async fn sleep(&self, pause: Duration) -> ServiceResult<()> {
        match self.remaining() {
            Some(left) if pause >= left => {
                tokio::time::sleep(left).await;
                Err(self.expired())
            }
            _ => {
                tokio::time::sleep(pause).await;
                Ok(())
            }
        }
    }
}
