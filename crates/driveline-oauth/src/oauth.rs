//! OAuth 2.0 authorization-code flow against the Microsoft identity platform.
//!
//! A browser session moves through three phases: anonymous, authorization
//! requested (the browser was sent to [`IdentityProvider::authorization_url`]),
//! and authenticated (the code came back and
//! [`IdentityProvider::exchange_code_for_token`] succeeded). The provider owns
//! the code's lifetime; a code is redeemable once and only with the same
//! redirect URI and scopes it was issued for.

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::error::{OAuthError, Result};
use crate::token::AccessToken;

/// Default Azure AD authority host.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Scopes the relay asks for.
pub const DEFAULT_SCOPES: &[&str] = &["Files.Read", "Files.Read.All", "User.Read", "User.Read.All"];

/// OIDC scopes the identity platform always pairs with a user sign-in.
const OIDC_SCOPES: &[&str] = &["openid", "profile", "offline_access"];

/// Identity provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub tenant_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authority_host: String,
    pub scopes: Vec<String>,
}

impl OAuthConfig {
    /// Config for the public Azure cloud with the relay's default scopes.
    pub fn new(
        client_id: impl Into<String>,
        tenant_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            tenant_id: tenant_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Point the client at a different authority host (sovereign clouds, tests).
    pub fn with_authority_host(mut self, host: impl Into<String>) -> Self {
        self.authority_host = host.into();
        self
    }

    /// The authority URL, `{host}/{tenant}`.
    pub fn authority(&self) -> String {
        format!(
            "{}/{}",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }

    /// The request both halves of the flow must agree on.
    pub fn authorization_request(&self) -> AuthorizationRequest {
        AuthorizationRequest {
            scopes: self.scopes.clone(),
            redirect_uri: self.redirect_uri.clone(),
        }
    }
}

/// Scopes and redirect URI of one authorization request.
///
/// Built once and handed to both the redirect and the callback so the token
/// request always repeats exactly what the authorize request asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub scopes: Vec<String>,
    pub redirect_uri: String,
}

impl AuthorizationRequest {
    /// Space-separated `scope` parameter, OIDC scopes appended once each.
    pub fn scope_param(&self) -> String {
        let mut scopes: Vec<&str> = Vec::with_capacity(self.scopes.len() + OIDC_SCOPES.len());
        for scope in self
            .scopes
            .iter()
            .map(String::as_str)
            .chain(OIDC_SCOPES.iter().copied())
        {
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
        scopes.join(" ")
    }
}

/// Result of a successful code exchange.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: AccessToken,
    pub token_type: String,
    pub expires_in: u64,
    pub scope: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    expires_in: u64,
    #[serde(default)]
    scope: String,
}

/// Confidential client for the identity provider.
#[derive(Debug, Clone)]
pub struct IdentityProvider {
    client: Client,
    config: OAuthConfig,
    authorize_endpoint: Url,
    token_endpoint: Url,
}

impl IdentityProvider {
    /// Create a provider client.
    ///
    /// Fails only when the configuration cannot produce valid endpoint URLs,
    /// which is a startup problem rather than a per-request one.
    pub fn new(config: OAuthConfig) -> Result<Self> {
        Self::with_client(Client::new(), config)
    }

    /// Create with a caller-supplied HTTP client.
    pub fn with_client(client: Client, config: OAuthConfig) -> Result<Self> {
        if config.client_id.is_empty() {
            return Err(OAuthError::Config("client_id is empty".to_string()));
        }
        if config.tenant_id.is_empty() {
            return Err(OAuthError::Config("tenant_id is empty".to_string()));
        }

        let authority = config.authority();
        let authorize_endpoint = endpoint(&authority, "authorize")?;
        let token_endpoint = endpoint(&authority, "token")?;

        Ok(Self {
            client,
            config,
            authorize_endpoint,
            token_endpoint,
        })
    }

    /// Get the config.
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// The token endpoint URL.
    pub fn token_endpoint(&self) -> &Url {
        &self.token_endpoint
    }

    /// Build the URL the browser is redirected to for sign-in.
    ///
    /// Pure: identical inputs always produce identical query parameters.
    pub fn authorization_url(&self, request: &AuthorizationRequest) -> Url {
        let mut url = self.authorize_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &request.redirect_uri)
            .append_pair("response_mode", "query")
            .append_pair("scope", &request.scope_param());
        url
    }

    /// Redeem an authorization code for an access token.
    ///
    /// One round trip to the token endpoint. Any non-success reply (invalid,
    /// expired or already redeemed code, mismatched redirect URI or scopes)
    /// becomes [`OAuthError::Exchange`] with the provider's payload attached.
    pub async fn exchange_code_for_token(
        &self,
        code: &str,
        request: &AuthorizationRequest,
    ) -> Result<TokenGrant> {
        let scope = request.scope_param();
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", request.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
            ("scope", scope.as_str()),
        ];

        let response = self
            .client
            .post(self.token_endpoint.clone())
            .form(&form)
            .send()
            .await
            .map_err(|e| OAuthError::Network(format!("Token exchange request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(status = status.as_u16(), "Token endpoint rejected authorization code");
            return Err(OAuthError::Exchange {
                status: status.as_u16(),
                body,
            });
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::InvalidResponse(format!("Failed to parse token response: {}", e)))?;

        let access_token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| OAuthError::InvalidResponse("missing access_token".to_string()))?;

        tracing::debug!(expires_in = body.expires_in, "Authorization code redeemed");

        Ok(TokenGrant {
            access_token: AccessToken::new(access_token),
            token_type: body.token_type,
            expires_in: body.expires_in,
            scope: body.scope,
        })
    }
}

fn endpoint(authority: &str, name: &str) -> Result<Url> {
    let raw = format!("{}/oauth2/v2.0/{}", authority, name);
    Url::parse(&raw).map_err(|e| OAuthError::Config(format!("Invalid {} endpoint '{}': {}", name, raw, e)))
}
