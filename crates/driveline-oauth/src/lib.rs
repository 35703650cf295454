//! OAuth 2.0 authorization-code client for the Microsoft identity platform.
//!
//! Lets the relay sign a browser user in against Azure AD and obtain a bearer
//! token for Microsoft Graph without ever seeing the user's credentials.
//!
//! # Components
//!
//! - [`oauth`]: authorization URL construction and code-for-token exchange
//! - [`token`]: the opaque [`AccessToken`] and the [`TokenSource`] capability

pub mod error;
pub mod oauth;
pub mod token;

pub use error::{OAuthError, Result};
pub use oauth::{
    AuthorizationRequest, DEFAULT_AUTHORITY_HOST, DEFAULT_SCOPES, IdentityProvider, OAuthConfig,
    TokenGrant,
};
pub use token::{AccessToken, TokenSource};
