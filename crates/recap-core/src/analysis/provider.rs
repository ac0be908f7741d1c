//! Vision provider trait and request/response types.
//!
//! Defines the interface every analysis backend implements, plus the
//! factory that builds the configured provider and its credential resolver.

use crate::config::ServiceConfig;
use super::gemini::GeminiProvider;
use crate::credential::{self, Credential, CredentialResolver};
use crate::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use base64::Engine;
use image::ImageFormat;

/// Base64-encoded image ready to send to a vision API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw encoded bytes, sniffing the format.
    ///
    /// Only formats the vision service accepts are allowed.
    pub fn from_bytes(bytes: &[u8]) -> ServiceResult<Self> {
        if bytes.is_empty() {
            return Err(ServiceError::Image {
                message: "image is empty".to_string(),
            });
        }
        let format = image::guess_format(bytes).map_err(|e| ServiceError::Image {
            message: format!("unrecognized image format: {e}"),
        })?;
        let media_type = match format {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
            other => {
                return Err(ServiceError::Image {
                    message: format!("unsupported image format {other:?}"),
                });
            }
        };

        Ok(Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        })
    }
}

/// A request asking the service to judge a caption against an image.
#[derive(Debug, Clone)]
pub struct AnalysisRequest<'a> {
    /// The image the caption claims to describe
    pub image: &'a ImageInput,
    /// Comparison instruction including the candidate caption
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl<'a> AnalysisRequest<'a> {
    /// Build the caption verification request.
    pub fn verify_caption(image: &'a ImageInput, caption: &str) -> Self {
        let prompt = format!(
            "You are checking an automatically generated image caption.\n\
             Caption: \"{}\"\n\n\
             Does this caption accurately describe this image's colors, clothing, \
             objects, and actions? If not, provide a corrected caption that keeps the \
             same short, plain style and length and fixes only the wrong details.\n\n\
             Reply with a single JSON object and nothing else:\n\
             {{\"is_accurate\": true or false, \
             \"corrected_caption\": \"...\" or null, \
             \"confidence\": number between 0 and 1}}",
            caption.replace('"', "'")
        );

        Self {
            image,
            prompt,
            max_tokens: 1024,
            temperature: 0.1,
        }
    }
}

/// Raw reply from a provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Generated text (expected to contain the verdict)
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all analysis backends implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the client holds an `Arc<dyn VisionProvider>`).
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name for logging (e.g., "gemini").
    fn name(&self) -> &str;

    /// Whether calls must carry a credential.
    fn requires_credential(&self) -> bool;

    /// Perform exactly one request against the service.
    async fn generate(
        &self,
        request: &AnalysisRequest<'_>,
        credential: Option<&Credential>,
    ) -> ServiceResult<ProviderResponse>;
}

/// Return the credential or a `CredentialMissing` error for `provider`.
pub(crate) fn require_credential<'c>(
    credential: Option<&'c Credential>,
    provider: &str,
) -> ServiceResult<&'c Credential> {
    credential.ok_or_else(|| ServiceError::CredentialMissing {
        provider: provider.to_string(),
    })
}

/// A provider together with the resolver for its credential.
pub struct ConfiguredService {
    pub provider: Box<dyn VisionProvider>,
    pub credentials: Box<dyn CredentialResolver>,
}

/// Factory that creates the configured provider.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create the Gemini provider and its credential resolver.
    ///
    /// # Arguments
    /// * `config` - The `[service]` config section
    /// * `model_override` - Optional model name replacing `config.model`
    pub fn create(
        config: &ServiceConfig,
        model_override: Option<&str>,
    ) -> ServiceResult<ConfiguredService> {
        let model = model_override.unwrap_or(&config.model).trim();
        if model.is_empty() {
            return Err(ServiceError::Request {
                message: "No analysis model configured".to_string(),
                status_code: None,
            });
        }

        let service = ConfiguredService {
            provider: Box::new(GeminiProvider::new(&config.endpoint, model)),
            credentials: credential::resolver_from_config(&config.api_key),
        };

        tracing::debug!("Using analysis provider '{}' ({model})", service.provider.name());
        Ok(service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10];

    #[test]
    fn test_image_input_sniffs_png() {
        let input = ImageInput::from_bytes(PNG_MAGIC).unwrap();
        assert_eq!(input.media_type, "image/png");
        assert!(!input.data.is_empty());
    }

    #[test]
    fn test_image_input_sniffs_jpeg() {
        let input = ImageInput::from_bytes(JPEG_MAGIC).unwrap();
        assert_eq!(input.media_type, "image/jpeg");
        assert!(input.data.starts_with("/9j/"));
    }

    #[test]
    fn test_image_input_rejects_garbage_and_empty() {
        assert!(matches!(
            ImageInput::from_bytes(b"definitely not an image"),
            Err(ServiceError::Image { .. })
        ));
        assert!(matches!(
            ImageInput::from_bytes(&[]),
            Err(ServiceError::Image { .. })
        ));
    }

    #[test]
    fn test_verify_caption_prompt() {
        let image = ImageInput::from_bytes(PNG_MAGIC).unwrap();
        let request = AnalysisRequest::verify_caption(&image, "a man in a \"red\" shirt");
        assert!(request.prompt.contains("a man in a 'red' shirt"));
        assert!(request.prompt.contains("colors, clothing, objects, and actions"));
        assert!(request.prompt.contains("corrected_caption"));
    }

    #[test]
    fn test_factory_builds_gemini() {
        let config = ServiceConfig::default();
        let service = ProviderFactory::create(&config, None).unwrap();
        assert_eq!(service.provider.name(), "gemini");
        assert!(service.provider.requires_credential());
    }

    #[test]
    fn test_factory_literal_key_resolves() {
        let config = ServiceConfig {
            api_key: "literal-key".to_string(),
            ..ServiceConfig::default()
        };
        let service = ProviderFactory::create(&config, Some("gemini-2.5-pro")).unwrap();
        assert_eq!(service.credentials.resolve().unwrap().expose(), "literal-key");
    }

    #[test]
    fn test_factory_rejects_blank_model() {
        let config = ServiceConfig::default();
        assert!(ProviderFactory::create(&config, Some("  ")).is_err());
    }
}
