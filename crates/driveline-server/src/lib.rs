//! HTTP front door for the Driveline OneDrive relay.
//!
//! Signs browsers in through the Microsoft identity platform and relays a
//! handful of Graph drive calls on their behalf.
//!
//! # Routes
//!
//! - `GET /auth`: redirect to the provider's sign-in page
//! - `GET /auth/callback?code=`: redeem the code, keep the token, go to `/files`
//! - `GET /files`: children of the drive root
//! - `GET /download/{item_id}`: streamed item content
//! - `GET /permissions/{item_id}`: sharing permissions of an item
//!
//! # Example
//!
//! ```ignore
//! use driveline_server::{RelayConfig, Server};
//!
//! let config = RelayConfig::from_env()?;
//! Server::new(config)?.run().await?;
//! ```

pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;

pub use config::{ConfigError, RelayConfig, ServerConfig};
pub use error::{ErrorResponse, Result, ServerError};
pub use session::SessionTokens;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::{MemoryStore, SessionManagerLayer};
use tracing::info;

/// The relay server.
pub struct Server {
    /// Application state.
    state: AppState,
    /// Backing store for browser sessions. In-process only: records are never
    /// evicted, so it grows by one entry per sign-in until the process exits.
    sessions: MemoryStore,
}

impl Server {
    /// Create a server from configuration.
    pub fn new(config: RelayConfig) -> Result<Self> {
        Ok(Self::from_state(AppState::new(config)?))
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self {
            state,
            sessions: MemoryStore::default(),
        }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let session_layer = SessionManagerLayer::new(self.sessions.clone())
            .with_secure(self.state.config.secure_cookies)
            .with_same_site(SameSite::Lax);

        let router = Router::new()
            .route("/auth", get(routes::auth_handler))
            .route("/auth/callback", get(routes::callback_handler))
            .route("/files", get(routes::files_handler))
            .route("/download/{item_id}", get(routes::download_handler))
            .route("/permissions/{item_id}", get(routes::permissions_handler))
            .layer(session_layer)
            .with_state(self.state.clone());

        if self.state.config.request_logging {
            router.layer(TraceLayer::new_for_http())
        } else {
            router
        }
    }

    /// Run the server until the process ends.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        let listener = self.bind().await?;
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        info!("Server stopped");
        Ok(())
    }

    /// Run in the background with graceful shutdown, returning the bound address.
    pub async fn run_with_shutdown(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<SocketAddr> {
        let listener = self.bind().await?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(format!("Failed to read local address: {}", e)))?;
        let router = self.router();

        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
                .ok();
        });

        Ok(local_addr)
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }

    async fn bind(&self) -> Result<TcpListener> {
        let addr = self.state.config.bind_address;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

        let port = listener.local_addr().map(|a| a.port()).unwrap_or(addr.port());
        info!(addr = %addr, "Server is running on http://localhost:{}", port);
        Ok(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use driveline_drive::DriveClient;
    use driveline_oauth::{IdentityProvider, OAuthConfig};
    use tower::ServiceExt;

    fn create_test_server(authority: &str, graph: &str) -> Server {
        let oauth = OAuthConfig::new(
            "client-123",
            "tenant-abc",
            "s3cret",
            "http://localhost:4000/auth/callback",
        )
        .with_authority_host(authority);
        let state = AppState::from_parts(
            ServerConfig::default().with_request_logging(false),
            IdentityProvider::new(oauth).unwrap(),
            DriveClient::with_base_url(graph),
        );
        Server::from_state(state)
    }

    async fn get(router: Router, uri: &str) -> axum::response::Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_auth_redirects_to_provider() {
        let server = create_test_server("https://login.microsoftonline.com", "http://127.0.0.1:9");
        let response = get(server.router(), "/auth").await;

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with(
            "https://login.microsoftonline.com/tenant-abc/oauth2/v2.0/authorize?client_id=client-123&response_type=code"
        ));
        assert!(location.contains("redirect_uri=http%3A%2F%2Flocalhost%3A4000%2Fauth%2Fcallback"));
    }

    #[tokio::test]
    async fn test_auth_redirect_is_stable() {
        let server = create_test_server("https://login.microsoftonline.com", "http://127.0.0.1:9");
        let first = get(server.router(), "/auth").await;
        let second = get(server.router(), "/auth").await;
        assert_eq!(
            first.headers()[header::LOCATION],
            second.headers()[header::LOCATION]
        );
    }

    #[tokio::test]
    async fn test_callback_with_provider_error_is_500() {
        let server = create_test_server("http://127.0.0.1:9", "http://127.0.0.1:9");
        let response = get(
            server.router(),
            "/auth/callback?error=access_denied&error_description=User%20declined",
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["code"], "auth_exchange_error");
        assert_eq!(body["upstream_body"]["error"], "access_denied");
        assert_eq!(body["upstream_body"]["error_description"], "User declined");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let server = create_test_server("http://127.0.0.1:9", "http://127.0.0.1:9");
        let response = get(server.router(), "/health").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_server_config_builder() {
        let config = ServerConfig::default()
            .with_bind_address("127.0.0.1:9000".parse().unwrap())
            .with_request_logging(false)
            .with_secure_cookies(true);

        assert_eq!(config.bind_address.port(), 9000);
        assert!(!config.request_logging);
        assert!(config.secure_cookies);
    }
}
