//! Command handlers for the `recap` binary.

pub mod batch;
pub mod config;
pub mod enhance;

use recap_core::{Config, Enhancer};
use std::path::{Path, PathBuf};

/// Build the enhancer from config plus the `--model` override.
pub(crate) fn build_enhancer(config: &Config, model: Option<&str>) -> anyhow::Result<Enhancer> {
    let enhancer = Enhancer::from_config(config, model)?;
    Ok(enhancer)
}

/// Expand `~` and environment variables in a user-supplied path.
pub(crate) fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_enhancer_with_model_override() {
        let config = Config::default();
        assert!(build_enhancer(&config, Some("gemini-2.5-pro")).is_ok());
        assert!(build_enhancer(&config, Some("")).is_err());
    }

    #[test]
    fn test_expand_path_leaves_plain_paths() {
        assert_eq!(
            expand_path(Path::new("/tmp/photo.jpg")),
            PathBuf::from("/tmp/photo.jpg")
        );
    }
}
