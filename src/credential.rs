//! Bearer credential.

use std::fmt;
use std::sync::Arc;

/// Number of leading characters shown when a credential is printed.
const VISIBLE_PREFIX_CHARS: usize = 4;
/// Tokens shorter than this print no prefix at all.
const MIN_CHARS_FOR_PREFIX: usize = 16;

/// OAuth access token for one report generation.
///
/// Cloning is a reference-count bump; every adapter in a pipeline run shares
/// the same token read-only. `Debug` and `Display` print only a short prefix,
/// so a credential can be logged without leaking it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Arc<str>);

impl Credential {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header only.
    pub(crate) fn secret(&self) -> &str {
        &self.0
    }

    fn redacted(&self) -> String {
        if self.0.chars().count() < MIN_CHARS_FOR_PREFIX {
            return "…".to_string();
        }
        let prefix: String = self.0.chars().take(VISIBLE_PREFIX_CHARS).collect();
        format!("{prefix}…")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.redacted()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_are_redacted() {
        let credential = Credential::new("ya29.a0AfH6SMBsecretsecret");
        assert_eq!(credential.to_string(), "ya29…");
        let debug = format!("{credential:?}");
        assert!(!debug.contains("secret"), "leaked token in {debug}");
        assert!(debug.starts_with("Credential("));
    }

    #[test]
    fn test_short_token_prints_no_prefix() {
        assert_eq!(Credential::new("ab").to_string(), "…");
        assert_eq!(Credential::new("abcd").to_string(), "…");
        assert_eq!(Credential::new("ya29.test-token").to_string(), "…");
        let debug = format!("{:?}", Credential::new("abcd"));
        assert!(!debug.contains("abcd"), "leaked token in {debug}");
    }

    #[test]
    fn test_secret_returns_full_token() {
        let credential = Credential::new(String::from("token-123"));
        assert_eq!(credential.secret(), "token-123");
        assert_eq!(credential.clone(), credential);
    }
}
