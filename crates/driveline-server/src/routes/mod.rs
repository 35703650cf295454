//! HTTP routes.

pub mod auth;
pub mod drive;

pub use auth::{CallbackParams, auth_handler, callback_handler};
pub use drive::{download_handler, files_handler, permissions_handler};

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

/// `302 Found` to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
