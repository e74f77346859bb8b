#![warn(clippy::unwrap_in_result)]
#![warn(clippy::unwrap_used)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A full metadata row describing one stored blob.
///
/// One record exists per uploaded file. The record and the blob on disk
/// have independent lifetimes: a row may outlive its blob and a blob may
/// outlive its row, nothing reconciles the two.
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct FileRecord {
    /// Unique numeric identifier assigned on insert
    pub id: i64,
    /// Client-supplied file name, kept exactly as received
    pub original_name: String,
    /// Generated on-disk name, unique by construction
    pub stored_name: String,
    /// Client-declared content type, never verified against the bytes
    pub mime_type: String,
    /// Size in bytes as counted from the upload stream
    pub size: i64,
    /// Blob location, `<uploads-dir>/<stored_name>`
    pub path: String,
    /// Insertion time in UTC, set by the metadata store
    pub uploaded_at: DateTime<Utc>,
}

/// A listing entry, the subset of [`FileRecord`] returned by the files index.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct FileSummary {
    /// Unique numeric identifier for the file
    pub id: i64,
    /// Client-supplied file name
    pub original_name: String,
    /// Client-declared content type
    pub mime_type: String,
    /// Size of the file in bytes
    pub size: i64,
    /// Insertion time in UTC
    pub uploaded_at: DateTime<Utc>,
}

/// The freshly stored file as reported back to the uploader.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct StoredFile {
    /// Unique numeric identifier assigned on insert
    pub id: i64,
    /// Client-supplied file name
    pub original_name: String,
    /// Generated on-disk name
    pub stored_name: String,
    /// Client-declared content type
    pub mime_type: String,
    /// Size of the file in bytes
    pub size: i64,
    /// Blob location, `<uploads-dir>/<stored_name>`
    pub path: String,
}

/// Response body of a successful upload.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Human readable confirmation
    pub message: String,
    /// The stored file with its generated id
    pub file: StoredFile,
}

/// Response body of a metadata lookup.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct FileInfoResponse {
    /// The full metadata row
    pub file: FileRecord,
}

/// Response body of the files index.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct FileListResponse {
    /// All records, newest upload first
    pub files: Vec<FileSummary>,
}

/// Plain confirmation body used by liveness and delete responses.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Human readable confirmation
    pub message: String,
}

/// Error body returned for every failed request.
///
/// Carries the class-level message only, raw error detail stays in the
/// server log.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Generic description of the failure class
    pub error: String,
}
