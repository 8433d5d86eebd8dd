//! OBS data types.

use serde::{Deserialize, Serialize};

/// One entry of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSummary {
    /// Object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Entity tag, quotes stripped.
    pub etag: Option<String>,
    /// Last modification time as reported by OBS (ISO-8601).
    pub last_modified: Option<String>,
}

/// One page of a `ListObjects` (V1, marker-based) response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListObjectsPage {
    /// Objects on this page, in key order.
    pub objects: Vec<ObjectSummary>,
    /// Whether more objects follow.
    pub is_truncated: bool,
    /// `NextMarker`, only present when a delimiter was sent.
    pub next_marker: Option<String>,
}

impl ListObjectsPage {
    /// Marker for the next request, or `None` when the listing is complete.
    ///
    /// Falls back to the last key of the page when OBS omits `NextMarker`.
    #[must_use]
    pub fn continuation_marker(&self) -> Option<String> {
        if !self.is_truncated {
            return None;
        }
        self.next_marker
            .clone()
            .filter(|m| !m.is_empty())
            .or_else(|| self.objects.last().map(|o| o.key.clone()))
    }
}

/// Result of initiating a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiatedUpload {
    /// Bucket of the upload.
    pub bucket: String,
    /// Object key of the upload.
    pub key: String,
    /// Upload id to pass to subsequent part operations.
    pub upload_id: String,
}

/// A part that has been uploaded and will be referenced on completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPart {
    /// Part number, starting at 1.
    pub part_number: u32,
    /// Entity tag returned by the upload, as received (quoted).
    pub etag: String,
}

/// Per-key failure of a batch delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteError {
    /// The key that could not be deleted.
    pub key: String,
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}

/// Result of a batch delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteResult {
    /// Keys reported as deleted (empty in quiet mode).
    pub deleted: Vec<String>,
    /// Keys that failed.
    pub errors: Vec<DeleteError>,
}
