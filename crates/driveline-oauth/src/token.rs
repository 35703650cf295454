//! Access tokens and the capability used to look them up.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque bearer credential issued by the identity provider.
///
/// The value is never printed by `Debug`; use [`AccessToken::secret`] when the
/// raw string is actually needed on the wire.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw bearer string.
    pub fn secret(&self) -> &str {
        &self.0
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"<redacted>").finish()
    }
}

impl From<String> for AccessToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AccessToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Something that can hand out the caller's current access token.
///
/// Upstream clients take a `&dyn TokenSource` per call instead of holding a
/// registered callback, so the token always comes from the request at hand.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// The current token, or `None` when no authorization has completed.
    async fn current(&self) -> Option<AccessToken>;
}

/// A fixed token (or the lack of one).
#[async_trait]
impl TokenSource for Option<AccessToken> {
    async fn current(&self) -> Option<AccessToken> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let token = AccessToken::new("eyJ0eXAiOiJKV1Qi");
        let printed = format!("{:?}", token);
        assert!(!printed.contains("eyJ0"));
        assert!(printed.contains("redacted"));
    }

    #[test]
    fn test_bearer_value() {
        let token = AccessToken::from("abc");
        assert_eq!(token.bearer(), "Bearer abc");
        assert_eq!(token.secret(), "abc");
    }

    #[test]
    fn test_serde_transparent() {
        let token = AccessToken::new("abc");
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, "\"abc\"");
        let back: AccessToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }

    #[tokio::test]
    async fn test_option_token_source() {
        let some: Option<AccessToken> = Some(AccessToken::new("t"));
        assert_eq!(some.current().await, Some(AccessToken::new("t")));

        let none: Option<AccessToken> = None;
        assert!(none.current().await.is_none());
    }
}
