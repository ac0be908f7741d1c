//! Request and result types crossing the pipeline boundary.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the image to check comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Raw encoded image bytes (JPEG, PNG, WebP or GIF)
    Bytes(Vec<u8>),
    /// Path to an image file, read at call time
    Path(PathBuf),
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

/// One caption to verify against its image.
#[derive(Debug, Clone)]
pub struct CaptionRequest {
    pub image: ImageSource,
    pub original_caption: String,
}

impl CaptionRequest {
    pub fn new(image: impl Into<ImageSource>, original_caption: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            original_caption: original_caption.into(),
        }
    }
}

/// How an enhancement call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Enhancement switched off in config
    Disabled,
    /// Credential required but absent
    Skipped,
    /// Service judged the caption accurate, or gave no usable correction
    Unchanged,
    /// Caption replaced by the service's correction
    Corrected,
    /// A step failed and the original caption was kept
    Fallback,
}

/// The caption to use, plus whether it was corrected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancementResult {
    pub caption: String,
    pub used_enhancement: bool,
    pub outcome: Outcome,
}

impl EnhancementResult {
    pub(crate) fn original(caption: &str, outcome: Outcome) -> Self {
        Self {
            caption: caption.to_string(),
            used_enhancement: false,
            outcome,
        }
    }

    pub(crate) fn corrected(caption: String) -> Self {
        Self {
            caption,
            used_enhancement: true,
            outcome: Outcome::Corrected,
        }
    }
}
