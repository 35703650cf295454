//! Error types for the identity provider client.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, OAuthError>;

/// Errors that can occur while talking to the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// The token endpoint rejected the authorization code.
    ///
    /// `body` is the provider's error payload, kept verbatim for diagnostics.
    #[error("Token exchange failed ({status}): {body}")]
    Exchange { status: u16, body: String },

    /// The provider answered with a success status but an unusable body.
    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),
}

impl OAuthError {
    /// Provider status code, when the provider produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            OAuthError::Exchange { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Provider error payload, when the provider produced one.
    pub fn body(&self) -> Option<&str> {
        match self {
            OAuthError::Exchange { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(e: reqwest::Error) -> Self {
        OAuthError::Network(e.to_string())
    }
}
