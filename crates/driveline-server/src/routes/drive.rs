//! Drive pass-through endpoints.
//!
//! Each handler reads the caller's token from the session and forwards one
//! logical operation to the Graph API. Results are returned as received.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use futures::TryStreamExt;
use tower_sessions::Session;

use driveline_drive::{DriveItem, Permission};

use crate::error::{Result, ServerError};
use crate::session::SessionTokens;
use crate::state::AppState;

/// GET /files
pub async fn files_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<DriveItem>>> {
    let tokens = SessionTokens::new(session);
    let items = state.drive.list_children(&tokens).await?;
    Ok(Json(items))
}

/// GET /permissions/{item_id}
pub async fn permissions_handler(
    State(state): State<AppState>,
    session: Session,
    Path(item_id): Path<String>,
) -> Result<Json<Vec<Permission>>> {
    let tokens = SessionTokens::new(session);
    let permissions = state.drive.list_permissions(&tokens, &item_id).await?;
    Ok(Json(permissions))
}

/// GET /download/{item_id}
///
/// Streams the item's content. Headers go out only once the pre-signed URL
/// has answered successfully; a failure after that point ends the connection.
pub async fn download_handler(
    State(state): State<AppState>,
    session: Session,
    Path(item_id): Path<String>,
) -> Result<Response> {
    let tokens = SessionTokens::new(session);
    let download = state.drive.download_content(&tokens, &item_id).await?;

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_DISPOSITION, content_disposition(&download.filename))
        .header(
            header::CONTENT_TYPE,
            download
                .content_type
                .as_deref()
                .unwrap_or("application/octet-stream"),
        );
    if let Some(len) = download.content_length {
        response = response.header(header::CONTENT_LENGTH, len);
    }

    let stream = download.stream.inspect_err(move |e| {
        tracing::warn!(item_id = %item_id, error = %e, "Download aborted mid-stream");
    });

    response
        .body(Body::from_stream(stream))
        .map_err(|e| ServerError::Internal(format!("Failed to build response: {}", e)))
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}
