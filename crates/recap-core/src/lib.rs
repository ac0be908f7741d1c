//! Recap Core - caption verification and correction.
//!
//! Takes an image and a caption produced by a local captioning model, asks an
//! external vision service whether the caption is accurate, and returns the
//! caption to use: the service's correction when it offers one, the original
//! otherwise. Every failure degrades to the original caption unless the
//! fallback policy is switched off.
//!
//! # Architecture
//!
//! ```text
//! (image, caption) → enabled? → credential → delay → service → verdict → caption
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use recap_core::{Config, Enhancer, ImageSource};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_or_default(None);
//!     let enhancer = Enhancer::from_config(&config, None)?;
//!
//!     let image = ImageSource::Path("./photo.jpg".into());
//!     let result = enhancer.enhance(&image, "a man in a red shirt").await?;
//!     println!("{} (corrected: {})", result.caption, result.used_enhancement);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod credential;
pub mod enhance;
pub mod error;
pub mod types;

pub use analysis::{AnalysisClient, AnalysisVerdict, ProviderFactory, VisionProvider};
pub use config::Config;
pub use credential::{
    Credential, CredentialResolver, EnvCredentialResolver, StaticCredentialResolver,
};
pub use enhance::Enhancer;
pub use error::{ConfigError, EnhanceError, ServiceError, ServiceResult, Stage};
pub use types::{CaptionRequest, EnhancementResult, ImageSource, Outcome};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
