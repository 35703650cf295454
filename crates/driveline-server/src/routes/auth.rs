//! Sign-in endpoints.

use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{debug, info};

use crate::error::{Result, ServerError};
use crate::session::SessionTokens;
use crate::state::AppState;

use super::found;

/// Where the browser lands after a successful sign-in.
pub const AFTER_SIGN_IN: &str = "/files";

/// Query string the provider sends back to the callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /auth
///
/// Sends the browser to the provider's sign-in page.
pub async fn auth_handler(State(state): State<AppState>) -> Response {
    let url = state.identity.authorization_url(&state.auth_request);
    debug!(authority = %state.identity.config().authority(), "Redirecting to identity provider");
    found(url.as_str())
}

/// GET /auth/callback?code=
///
/// Redeems the code, keeps the token in the caller's session and moves on to
/// the file listing.
pub async fn callback_handler(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Result<Response> {
    if params.code.is_none()
        && let Some(error) = params.error
    {
        return Err(ServerError::AuthDenied {
            error,
            description: params.error_description.unwrap_or_default(),
        });
    }

    let code = params.code.unwrap_or_default();
    let grant = state
        .identity
        .exchange_code_for_token(&code, &state.auth_request)
        .await?;

    // New session id on sign-in; an id the browser held before never carries a token.
    session
        .cycle_id()
        .await
        .map_err(|e| ServerError::Session(e.to_string()))?;
    SessionTokens::new(session).put(&grant.access_token).await?;

    info!(expires_in = grant.expires_in, "Sign-in complete");
    Ok(found(AFTER_SIGN_IN))
}
