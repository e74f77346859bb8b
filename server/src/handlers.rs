#![allow(clippy::unused_async)]
use crate::domain::{NewFileRecord, Storage};
use crate::error::ApiError;
use crate::file_reply::FileReply;
use crate::sqlite::{Mode, Sqlite};
use crate::ServiceState;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use futures::{Stream, TryStreamExt};
use futures_util::StreamExt;
use kernel::{
    ErrorResponse, FileInfoResponse, FileListResponse, MessageResponse, StoredFile, UploadResponse,
};
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::io::StreamReader;

use axum::{
    extract::{Multipart, Path},
    http::StatusCode,
};

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is up", body = MessageResponse)
    ),
    tag = "service",
)]
pub async fn health() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "File manager API is running".to_owned(),
    })
}

/// Stores the multipart `file` field on disk and indexes it.
#[utoipa::path(
    post,
    path = "/upload",
    responses(
        (status = 201, description = "File stored and indexed", body = UploadResponse),
        (status = 400, description = "No file part in the form", body = ErrorResponse),
        (status = 500, description = "Storage or database error", body = ErrorResponse)
    ),
    tag = "files",
)]
pub async fn upload(
    State(state): State<Arc<ServiceState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut incoming = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let (data, read_bytes) = read_from_stream(field).await?;
        incoming = Some((original_name, mime_type, data, read_bytes));
        break;
    }

    let Some((original_name, mime_type, data, read_bytes)) = incoming else {
        return Err(ApiError::MissingFilePart);
    };

    let stored_name = crate::naming::stored_name(&original_name);
    let written = state.blobs.save(&stored_name, &data).await?;
    tracing::info!("file: {original_name} read: {read_bytes} written: {written} as: {stored_name}");

    let path = state.blobs.record_path(&stored_name);
    let record = NewFileRecord {
        original_name,
        stored_name,
        mime_type,
        size: read_bytes as i64,
        path,
    };

    // Blob first, row second. A failed insert below leaves an orphan blob.
    let file = execute(&state.db, Mode::ReadWrite, move |mut repository| {
        let id = repository.insert_record(&record)?;
        Ok(StoredFile {
            id,
            original_name: record.original_name,
            stored_name: record.stored_name,
            mime_type: record.mime_type,
            size: record.size,
            path: record.path,
        })
    })?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File uploaded successfully".to_owned(),
            file,
        }),
    ))
}

/// Lists all records, newest upload first.
#[utoipa::path(
    get,
    path = "/files",
    responses(
        (status = 200, description = "All records listed", body = FileListResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "files",
)]
pub async fn list_files(
    State(state): State<Arc<ServiceState>>,
) -> Result<Json<FileListResponse>, ApiError> {
    let files = execute(&state.db, Mode::ReadOnly, |mut repository| {
        repository.list_records().map_err(ApiError::from)
    })?;
    Ok(Json(FileListResponse { files }))
}

/// Gets the full metadata row by file id.
#[utoipa::path(
    get,
    path = "/files/{id}",
    responses(
        (status = 200, description = "Metadata row", body = FileInfoResponse),
        (status = 404, description = "No row for this id", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "files",
    params(
        ("id" = i64, Path, description = "File id")
    ),
)]
pub async fn get_file(
    Path(id): Path<i64>,
    State(state): State<Arc<ServiceState>>,
) -> Result<Json<FileInfoResponse>, ApiError> {
    let file = execute(&state.db, Mode::ReadOnly, move |mut repository| {
        repository.get_record(id).map_err(ApiError::from)
    })?
    .ok_or(ApiError::NotFound)?;
    Ok(Json(FileInfoResponse { file }))
}

/// Serves the blob bytes as an attachment named after the original upload.
#[utoipa::path(
    get,
    path = "/files/{id}/download",
    responses(
        (status = 200, description = "File binary content", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 404, description = "No row for this id, or blob missing on disk", body = ErrorResponse),
        (status = 500, description = "Storage or database error", body = ErrorResponse)
    ),
    tag = "files",
    params(
        ("id" = i64, Path, description = "File id")
    ),
)]
pub async fn download_file(
    Path(id): Path<i64>,
    State(state): State<Arc<ServiceState>>,
) -> Result<FileReply, ApiError> {
    let file = execute(&state.db, Mode::ReadOnly, move |mut repository| {
        repository.get_record(id).map_err(ApiError::from)
    })?
    .ok_or(ApiError::NotFound)?;

    if !state.blobs.exists(&file.stored_name).await {
        return Err(ApiError::MissingBlob);
    }

    let content = state.blobs.read(&file.stored_name).await?;
    tracing::info!("file: {} served: {} bytes", file.stored_name, content.len());
    Ok(FileReply::new(content, file))
}

/// Deletes the metadata row, then the blob.
///
/// Row first, blob second: a failed unlink is logged and swallowed, the
/// client still gets a success and the blob stays behind as an orphan.
#[utoipa::path(
    delete,
    path = "/files/{id}",
    responses(
        (status = 200, description = "File deleted", body = MessageResponse),
        (status = 404, description = "No row for this id", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "files",
    params(
        ("id" = i64, Path, description = "File id")
    ),
)]
pub async fn delete_file(
    Path(id): Path<i64>,
    State(state): State<Arc<ServiceState>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let file = execute(&state.db, Mode::ReadWrite, move |mut repository| {
        let Some(file) = repository.get_record(id).map_err(ApiError::from)? else {
            return Err(ApiError::NotFound);
        };
        repository.delete_record(id).map_err(ApiError::from)?;
        Ok(file)
    })?;

    match state.blobs.delete(&file.stored_name).await {
        Ok(()) => tracing::info!("file: {id} deleted"),
        Err(e) => tracing::error!("blob {} not removed after row delete: {e}", file.stored_name),
    }

    Ok(Json(MessageResponse {
        message: "File deleted successfully".to_owned(),
    }))
}

fn execute<F, R>(db: &std::path::Path, mode: Mode, action: F) -> Result<R, ApiError>
where
    F: FnOnce(Sqlite) -> Result<R, ApiError>,
{
    let start = Instant::now();
    let repository = Sqlite::open(db, mode)?;
    let res = action(repository);
    let duration = start.elapsed();
    tracing::info!("DB query time: {:?}", duration);
    res
}

async fn read_from_stream<S, E>(stream: S) -> io::Result<(Vec<u8>, usize)>
where
    S: Stream<Item = Result<Bytes, E>> + StreamExt,
    E: Sync + std::error::Error + Send + 'static,
{
    // Convert the stream into an `AsyncRead`.
    let body_with_io_error = stream.map_err(io::Error::other);
    let body_reader = StreamReader::new(body_with_io_error);
    futures::pin_mut!(body_reader);
    let mut buffer = Vec::new();

    let copied_bytes = tokio::io::copy(&mut body_reader, &mut buffer).await?;
    let copied_bytes = usize::try_from(copied_bytes).unwrap_or(usize::MAX);
    Ok((buffer, copied_bytes))
}
