//! Application state shared across handlers.

use std::sync::Arc;

use driveline_drive::DriveClient;
use driveline_oauth::{AuthorizationRequest, IdentityProvider};

use crate::config::{RelayConfig, ServerConfig};
use crate::error::{Result, ServerError};

/// Application state shared across all handlers.
///
/// Holds no per-user data; tokens live in each request's session.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Identity provider client.
    pub identity: Arc<IdentityProvider>,

    /// Scopes and redirect URI used by both `/auth` and `/auth/callback`.
    pub auth_request: Arc<AuthorizationRequest>,

    /// Graph drive client.
    pub drive: Arc<DriveClient>,
}

impl AppState {
    /// Create application state from a full relay configuration.
    pub fn new(config: RelayConfig) -> Result<Self> {
        let identity = IdentityProvider::new(config.oauth)
            .map_err(|e| ServerError::Config(e.to_string()))?;
        let drive = DriveClient::with_base_url(config.graph_base_url);
        Ok(Self::from_parts(config.server, identity, drive))
    }

    /// Create application state from pre-built clients.
    pub fn from_parts(config: ServerConfig, identity: IdentityProvider, drive: DriveClient) -> Self {
        let auth_request = identity.config().authorization_request();
        Self {
            config: Arc::new(config),
            identity: Arc::new(identity),
            auth_request: Arc::new(auth_request),
            drive: Arc::new(drive),
        }
    }
}
