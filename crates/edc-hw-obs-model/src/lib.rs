//! OBS request and response types.
//!
//! Plain data types exchanged with the S3-compatible OBS API, plus the
//! [`ObsError`] taxonomy and its retry classification.

pub mod error;
pub mod types;

pub use error::{ErrorReason, ObsError, ObsErrorCode, ObsResult};
pub use types::{
    CompletedPart, DeleteError, DeleteResult, InitiatedUpload, ListObjectsPage, ObjectSummary,
};

/// Maximum number of keys per batch delete request.
pub const MAX_DELETE_BATCH: usize = 1000;

/// Maximum number of keys requested per listing page.
pub const MAX_LIST_KEYS: u32 = 1000;

/// Highest part number accepted by a multipart upload.
pub const MAX_PART_NUMBER: u32 = 10_000;
