//! Bearer-authenticated client for the Graph drive endpoints.

use std::fmt;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::{Client, RequestBuilder, header};
use serde::de::DeserializeOwned;

use driveline_oauth::TokenSource;

use crate::error::{Result, UpstreamError};
use crate::types::{Collection, DriveItem, Permission};

/// Microsoft Graph v1.0 base URL.
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// An item's content, ready to be pulled chunk by chunk.
///
/// Nothing is buffered: each poll of `stream` reads from the pre-signed URL's
/// response body, and dropping the stream closes that connection.
pub struct Download {
    /// The item's display name.
    pub filename: String,
    /// `Content-Type` of the pre-signed response, if any.
    pub content_type: Option<String>,
    /// `Content-Length` of the pre-signed response, if any.
    pub content_length: Option<u64>,
    pub stream: BoxStream<'static, Result<Bytes>>,
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Client for the signed-in user's drive.
#[derive(Debug, Clone)]
pub struct DriveClient {
    client: Client,
    base_url: String,
}

impl DriveClient {
    /// Create a client against the public Graph endpoint.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_GRAPH_BASE_URL)
    }

    /// Create against a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List the children of the drive root.
    pub async fn list_children(&self, tokens: &dyn TokenSource) -> Result<Vec<DriveItem>> {
        let page: Collection<DriveItem> = self.get_json("/me/drive/root/children", tokens).await?;
        Ok(page.value)
    }

    /// Fetch one item's metadata.
    pub async fn get_item(&self, tokens: &dyn TokenSource, item_id: &str) -> Result<DriveItem> {
        let path = format!("/me/drive/items/{}", urlencoding::encode(item_id));
        self.get_json(&path, tokens).await
    }

    /// List the sharing permissions on an item.
    pub async fn list_permissions(
        &self,
        tokens: &dyn TokenSource,
        item_id: &str,
    ) -> Result<Vec<Permission>> {
        let path = format!("/me/drive/items/{}/permissions", urlencoding::encode(item_id));
        let page: Collection<Permission> = self.get_json(&path, tokens).await?;
        Ok(page.value)
    }

    /// Open an item's content for streaming.
    ///
    /// Resolves the item's pre-signed URL with an authenticated metadata call,
    /// then fetches that URL without a bearer token. Errors from either call
    /// surface before any byte is produced.
    pub async fn download_content(
        &self,
        tokens: &dyn TokenSource,
        item_id: &str,
    ) -> Result<Download> {
        let item = self.get_item(tokens, item_id).await?;

        let download_url = item
            .download_url()
            .ok_or_else(|| UpstreamError::MissingDownloadUrl(item_id.to_string()))?;
        let filename = item.name().unwrap_or(item_id).to_string();

        let response = self
            .client
            .get(download_url)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(format!("Failed to open download: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = response.content_length();

        tracing::debug!(item_id, filename = %filename, ?content_length, "Streaming item content");

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| UpstreamError::Network(format!("Download interrupted: {}", e))))
            .boxed();

        Ok(Download {
            filename,
            content_type,
            content_length,
            stream,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, tokens: &dyn TokenSource) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let request = self.authorize(self.client.get(&url), tokens).await;

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::Network(format!("Request to {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(format!("Failed to parse {}: {}", path, e)))
    }

    /// Attach the caller's bearer token, if there is one.
    async fn authorize(&self, request: RequestBuilder, tokens: &dyn TokenSource) -> RequestBuilder {
        match tokens.current().await {
            Some(token) => request.header(header::AUTHORIZATION, token.bearer()),
            None => {
                tracing::debug!("No access token available, sending request unauthenticated");
                request
            }
        }
    }
}

impl Default for DriveClient {
    fn default() -> Self {
        Self::new()
    }
}
