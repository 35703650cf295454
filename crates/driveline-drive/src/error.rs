//! Error types for the drive client.

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, UpstreamError>;

/// Errors returned by the remote resource API or while reaching it.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The API answered with a non-success status.
    #[error("Upstream API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// Network/HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    /// Item metadata carried no pre-signed download URL.
    #[error("Item '{0}' has no download URL")]
    MissingDownloadUrl(String),

    /// The API answered 2xx with a body we could not read.
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// Upstream status code, when the upstream produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw upstream body, when the upstream produced one.
    pub fn body(&self) -> Option<&str> {
        match self {
            UpstreamError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        UpstreamError::Network(e.to_string())
    }
}
