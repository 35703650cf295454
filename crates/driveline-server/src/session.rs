//! Per-browser token storage.
//!
//! The `tower-sessions` layer gives each browser a cookie-identified session;
//! this module keeps at most one access token in it. Nothing here tracks
//! expiry: a stale token simply makes the next upstream call fail.

use async_trait::async_trait;
use tower_sessions::Session;

use driveline_oauth::{AccessToken, TokenSource};

use crate::error::{Result, ServerError};

/// Session attribute holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// The access-token slot of one browser session.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    session: Session,
}

impl SessionTokens {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Store `token`, replacing any earlier one.
    pub async fn put(&self, token: &AccessToken) -> Result<()> {
        self.session
            .insert(ACCESS_TOKEN_KEY, token)
            .await
            .map_err(|e| ServerError::Session(e.to_string()))
    }

    /// The stored token, or `None` if this session never completed sign-in.
    pub async fn get(&self) -> Result<Option<AccessToken>> {
        self.session
            .get::<AccessToken>(ACCESS_TOKEN_KEY)
            .await
            .map_err(|e| ServerError::Session(e.to_string()))
    }
}

#[async_trait]
impl TokenSource for SessionTokens {
    async fn current(&self) -> Option<AccessToken> {
        match self.get().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read access token from session");
                None
            }
        }
    }
}
