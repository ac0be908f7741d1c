//! Single-attempt caption analysis against a vision provider.

use super::provider::{AnalysisRequest, ImageInput, VisionProvider};
use super::verdict::{parse_verdict, AnalysisVerdict};
use crate::credential::Credential;
use crate::error::{ServiceError, ServiceResult};
use std::sync::Arc;
use std::time::Duration;

/// Sends (image, caption) to the service and returns its parsed verdict.
///
/// Performs exactly one network attempt per call; retrying is the
/// orchestrator's decision.
#[derive(Clone)]
pub struct AnalysisClient {
    provider: Arc<dyn VisionProvider>,
}

impl AnalysisClient {
    pub fn new(provider: Box<dyn VisionProvider>) -> Self {
        Self {
            provider: Arc::from(provider),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn requires_credential(&self) -> bool {
        self.provider.requires_credential()
    }

    pub async fn analyze(
        &self,
        image: &ImageInput,
        original_caption: &str,
        credential: Option<&Credential>,
        timeout: Duration,
    ) -> ServiceResult<AnalysisVerdict> {
        if self.provider.requires_credential() && credential.is_none() {
            return Err(ServiceError::CredentialMissing {
                provider: self.provider.name().to_string(),
            });
        }

        let request = AnalysisRequest::verify_caption(image, original_caption);
        let response = tokio::time::timeout(timeout, self.provider.generate(&request, credential))
            .await
            .map_err(|_| ServiceError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            })??;

        tracing::debug!(
            provider = self.provider.name(),
            model = %response.model,
            latency_ms = response.latency_ms,
            tokens = ?response.tokens_used,
            "Analysis reply received"
        );

        parse_verdict(&response.text)
    }
}
