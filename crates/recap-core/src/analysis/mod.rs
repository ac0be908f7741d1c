//! External caption analysis.
//!
//! Provides the [`VisionProvider`] seam with its Gemini backend, the
//! single-attempt [`AnalysisClient`] and the defensive verdict parser.

pub(crate) mod client;
pub(crate) mod gemini;
pub(crate) mod provider;
pub(crate) mod verdict;

pub use client::AnalysisClient;
pub use provider::{
    AnalysisRequest, ConfiguredService, ImageInput, ProviderFactory, ProviderResponse,
    VisionProvider,
};
pub use verdict::{clean_caption, parse_verdict, AnalysisVerdict};
