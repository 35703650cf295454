//! Common test utilities for integration tests.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{Value, json};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use driveline_server::{RelayConfig, Server, ServerConfig};
use driveline_oauth::OAuthConfig;

pub const TENANT: &str = "tenant-abc";
pub const TOKEN_PATH: &str = "/tenant-abc/oauth2/v2.0/token";
pub const GRAPH_PREFIX: &str = "/v1.0";

/// A relay running in the background, wired to a fake provider and Graph API.
pub struct TestRelay {
    /// The relay's address.
    pub addr: SocketAddr,
    /// Cookie-keeping client that does not follow redirects.
    pub client: Client,
    /// Fake identity provider and Graph API.
    pub upstream: MockServer,
    _shutdown: oneshot::Sender<()>,
}

impl TestRelay {
    /// Start a relay against a fresh mock upstream.
    pub async fn start() -> Result<Self> {
        let upstream = MockServer::start().await;

        let oauth = OAuthConfig::new(
            "client-123",
            TENANT,
            "s3cret",
            "http://localhost:4000/auth/callback",
        )
        .with_authority_host(upstream.uri());
        let server_config = ServerConfig::default()
            .with_bind_address("127.0.0.1:0".parse()?)
            .with_request_logging(false);
        let config = RelayConfig::new(server_config, oauth)
            .with_graph_base_url(format!("{}{}", upstream.uri(), GRAPH_PREFIX));

        let (tx, rx) = oneshot::channel::<()>();
        let addr = Server::new(config)?
            .run_with_shutdown(async move {
                let _ = rx.await;
            })
            .await?;

        let client = Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            addr,
            client,
            upstream,
            _shutdown: tx,
        })
    }

    /// Get the base URL for the relay.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// GET a relay path with this relay's cookie jar.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Make the token endpoint accept `code` once, issuing `token`.
    pub async fn accept_code_once(&self, code: &str, token: &str) {
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains(format!("code={}", code)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "scope": "Files.Read Files.Read.All User.Read User.Read.All",
                "expires_in": 3599,
                "access_token": token
            })))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&self.upstream)
            .await;

        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "AADSTS70008: The provided authorization code or refresh token has expired or has already been redeemed."
            })))
            .with_priority(5)
            .mount(&self.upstream)
            .await;
    }

    /// Answer any Graph call without the right bearer token with 401.
    pub async fn require_token(&self) {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {
                    "code": "InvalidAuthenticationToken",
                    "message": "Access token is empty."
                }
            })))
            .with_priority(10)
            .mount(&self.upstream)
            .await;
    }

    /// Serve `body` for an authenticated Graph GET on `graph_path`.
    pub async fn graph_get(&self, graph_path: &str, token: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("{}{}", GRAPH_PREFIX, graph_path)))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .with_priority(1)
            .mount(&self.upstream)
            .await;
    }

    /// Sign the relay's cookie jar in with `token`.
    pub async fn sign_in(&self, token: &str) -> Result<()> {
        self.accept_code_once("VALIDCODE", token).await;
        let resp = self.get("/auth/callback?code=VALIDCODE").await?;
        anyhow::ensure!(
            resp.status().as_u16() == 302,
            "sign-in failed with {}",
            resp.status()
        );
        Ok(())
    }
}

/// The `name=value` pair of the session cookie a response sets.
pub fn session_cookie(resp: &reqwest::Response) -> Result<String> {
    let raw = resp
        .headers()
        .get("set-cookie")
        .context("response set no cookie")?
        .to_str()?;
    Ok(raw.split(';').next().unwrap_or_default().to_string())
}

/// Accept a single connection on a bare TCP listener and hand it to `handler`
/// once the request head has been read. Returns the listener's base URL.
///
/// For upstream behaviour wiremock cannot produce, such as slow chunked
/// bodies or bodies cut short of their `Content-Length`.
pub async fn serve_raw_once<F, Fut>(handler: F) -> Result<String>
where
    F: FnOnce(TcpStream) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        if read_request_head(&mut socket).await.is_ok() {
            handler(socket).await;
        }
    });

    Ok(format!("http://{}", addr))
}

async fn read_request_head(socket: &mut TcpStream) -> io::Result<()> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        head.extend_from_slice(&buf[..n]);
    }
    Ok(())
}
