//! Server configuration.
//!
//! Everything comes from the process environment. The identity fields are
//! required; the process refuses to start without them.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use driveline_drive::DEFAULT_GRAPH_BASE_URL;
use driveline_oauth::{DEFAULT_AUTHORITY_HOST, OAuthConfig};

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 4000;

pub const ENV_CLIENT_ID: &str = "CLIENT_ID";
pub const ENV_TENANT_ID: &str = "TENANT_ID";
pub const ENV_CLIENT_SECRET: &str = "CLIENT_SECRET";
pub const ENV_REDIRECT_URI: &str = "REDIRECT_URI";
pub const ENV_PORT: &str = "PORT";
pub const ENV_BIND_HOST: &str = "BIND_HOST";
pub const ENV_AUTHORITY_HOST: &str = "AUTHORITY_HOST";
pub const ENV_GRAPH_BASE_URL: &str = "GRAPH_BASE_URL";
pub const ENV_SESSION_SECURE: &str = "SESSION_SECURE";

/// Startup configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    /// `PORT` is not a valid port number.
    #[error("invalid port '{0}'")]
    InvalidPort(String),

    /// A variable that must hold a URL does not.
    #[error("invalid URL in {var}: '{value}'")]
    InvalidUrl { var: &'static str, value: String },

    /// A variable that must hold a boolean does not.
    #[error("invalid boolean in {var}: '{value}'")]
    InvalidBool { var: &'static str, value: String },

    /// `BIND_HOST` is not an IP address.
    #[error("invalid bind host '{0}'")]
    InvalidHost(String),
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Wrap the router in an HTTP trace layer.
    pub request_logging: bool,

    /// Mark the session cookie `Secure` (HTTPS only).
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            request_logging: true,
            secure_cookies: false,
        }
    }
}

impl ServerConfig {
    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Require HTTPS for the session cookie.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}

/// Everything the relay needs to start.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub oauth: OAuthConfig,
    pub graph_base_url: String,
}

impl RelayConfig {
    /// Build from explicit parts, with the public Graph endpoint.
    pub fn new(server: ServerConfig, oauth: OAuthConfig) -> Self {
        Self {
            server,
            oauth,
            graph_base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
        }
    }

    /// Use a different Graph base URL.
    pub fn with_graph_base_url(mut self, url: impl Into<String>) -> Self {
        self.graph_base_url = url.into();
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::MissingVar(key));

        let client_id = require(ENV_CLIENT_ID)?;
        let tenant_id = require(ENV_TENANT_ID)?;
        let client_secret = require(ENV_CLIENT_SECRET)?;
        let redirect_uri = require(ENV_REDIRECT_URI)?;
        check_url(ENV_REDIRECT_URI, &redirect_uri)?;

        let port = match get(ENV_PORT) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let host = match get(ENV_BIND_HOST) {
            Some(raw) => raw
                .trim()
                .parse::<IpAddr>()
                .map_err(|_| ConfigError::InvalidHost(raw))?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let authority_host =
            get(ENV_AUTHORITY_HOST).unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());
        check_url(ENV_AUTHORITY_HOST, &authority_host)?;

        let graph_base_url =
            get(ENV_GRAPH_BASE_URL).unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.to_string());
        check_url(ENV_GRAPH_BASE_URL, &graph_base_url)?;

        let secure_cookies = match get(ENV_SESSION_SECURE) {
            Some(raw) => parse_bool(ENV_SESSION_SECURE, &raw)?,
            None => false,
        };

        let server = ServerConfig::default()
            .with_bind_address(SocketAddr::new(host, port))
            .with_secure_cookies(secure_cookies);

        let oauth = OAuthConfig::new(client_id, tenant_id, client_secret, redirect_uri)
            .with_authority_host(authority_host);

        Ok(Self {
            server,
            oauth,
            graph_base_url,
        })
    }
}

fn check_url(var: &'static str, value: &str) -> Result<(), ConfigError> {
    let valid = (value.starts_with("http://") || value.starts_with("https://"))
        && value.len() > "https://".len();
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            var,
            value: value.to_string(),
        })
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}
