//! Caption enhancement orchestration.
//!
//! The [`Enhancer`] decides whether to consult the analysis service, pauses
//! for the configured randomized delay, applies the verdict and contains
//! every failure according to the fallback policy.

mod delay;
pub(crate) mod enhancer;
pub(crate) mod retry;

pub use enhancer::Enhancer;
