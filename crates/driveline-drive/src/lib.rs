//! Microsoft Graph drive client.
//!
//! Issues bearer-authenticated calls for the signed-in user's OneDrive and
//! hands results back untouched. Downloads resolve the item's pre-signed URL
//! and expose its body as a pull-based byte stream.

pub mod client;
pub mod error;
pub mod types;

pub use client::{DEFAULT_GRAPH_BASE_URL, Download, DriveClient};
pub use error::{Result, UpstreamError};
pub use types::{DOWNLOAD_URL_FIELD, DriveItem, Permission};
