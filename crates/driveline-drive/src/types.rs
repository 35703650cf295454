//! Pass-through records from the Graph API.
//!
//! Neither type validates or reshapes what the upstream sent; serializing one
//! back out yields the upstream JSON unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Item property holding the short-lived pre-signed content URL.
pub const DOWNLOAD_URL_FIELD: &str = "@microsoft.graph.downloadUrl";

/// A drive item as returned by the upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriveItem(pub Value);

impl DriveItem {
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// The pre-signed content URL, if the item has content.
    pub fn download_url(&self) -> Option<&str> {
        self.0
            .get(DOWNLOAD_URL_FIELD)
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
    }

    /// Whether the upstream describes this item as a folder.
    pub fn is_folder(&self) -> bool {
        self.0.get("folder").is_some()
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// A sharing permission as returned by the upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(pub Value);

impl Permission {
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn into_inner(self) -> Value {
        self.0
    }
}

/// Graph collection envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Collection<T> {
    pub value: Vec<T>,
}
