//! Access credential resolution for the analysis service.
//!
//! The orchestrator never reads the environment directly; it asks an injected
//! [`CredentialResolver`]. Absence is reported as `None`, never as an error.

use std::fmt;

/// Opaque secret token. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token. Blank tokens are treated as absent.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// Raw token for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Capability that yields the current credential, if any.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self) -> Option<Credential>;
}

/// Reads one named environment variable on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentialResolver {
    var: String,
}

impl EnvCredentialResolver {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl CredentialResolver for EnvCredentialResolver {
    fn resolve(&self) -> Option<Credential> {
        std::env::var(&self.var).ok().and_then(Credential::new)
    }
}

/// Fixed credential (or fixed absence), for literal config values and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialResolver(Option<Credential>);

impl StaticCredentialResolver {
    pub fn new(credential: Option<Credential>) -> Self {
        Self(credential)
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl CredentialResolver for StaticCredentialResolver {
    fn resolve(&self) -> Option<Credential> {
        self.0.clone()
    }
}

/// Build a resolver from a config `api_key` value.
///
/// `${VAR}` reads `VAR` from the environment at resolve time, an empty value
/// means no credential, anything else is used literally.
pub fn resolver_from_config(value: &str) -> Box<dyn CredentialResolver> {
    let value = value.trim();
    if let Some(var) = value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        Box::new(EnvCredentialResolver::new(var))
    } else {
        Box::new(StaticCredentialResolver::new(Credential::new(value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_credential_is_absent() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   ").is_none());
        assert!(Credential::new("abc").is_some());
    }

    #[test]
    fn test_debug_is_redacted() {
        let cred = Credential::new("super-secret").unwrap();
        let shown = format!("{cred:?}");
        assert!(!shown.contains("super-secret"));
    }

    #[test]
    fn test_env_resolver_unset_is_none() {
        let resolver = EnvCredentialResolver::new("RECAP_DEFINITELY_NOT_SET_XYZ_123");
        assert!(resolver.resolve().is_none());
    }

    #[test]
    fn test_static_resolver() {
        let resolver = StaticCredentialResolver::new(Credential::new("k"));
        assert_eq!(resolver.resolve().unwrap().expose(), "k");
        assert!(StaticCredentialResolver::none().resolve().is_none());
    }

    #[test]
    fn test_resolver_from_config() {
        assert_eq!(
            resolver_from_config("plain-key").resolve().unwrap().expose(),
            "plain-key"
        );
        assert!(resolver_from_config("").resolve().is_none());
        assert!(resolver_from_config("${RECAP_DEFINITELY_NOT_SET_XYZ_456}")
            .resolve()
            .is_none());
    }
}
