use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kernel::ErrorResponse;
use thiserror::Error;

/// Everything a handler can fail with.
///
/// Mapped to an HTTP response in exactly one place, [`IntoResponse`]
/// below: the raw error goes to the log, the client only ever sees the
/// class-level message.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Upload form carried no `file` part.
    #[error("upload request carries no file part")]
    MissingFilePart,

    /// No metadata row for the requested id.
    #[error("no row for requested id")]
    NotFound,

    /// A metadata row exists but its blob is absent on disk.
    #[error("row exists but blob is absent on disk")]
    MissingBlob,

    /// The multipart payload could not be read.
    #[error("malformed multipart payload: {0}")]
    Multipart(#[from] MultipartError),

    /// Disk write, read or unlink failure.
    #[error("storage i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Any SQL failure, connectivity included.
    #[error("database failure: {0}")]
    Database(#[from] rusqlite::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFilePart | ApiError::Multipart(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound | ApiError::MissingBlob => StatusCode::NOT_FOUND,
            ApiError::Io(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> &'static str {
        match self {
            ApiError::MissingFilePart => "No file uploaded",
            ApiError::Multipart(_) => "Malformed upload",
            ApiError::NotFound => "File not found",
            ApiError::MissingBlob => "File missing on disk",
            ApiError::Io(_) => "Storage failure",
            ApiError::Database(_) => "Database failure",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("{self}");
        let status = self.status();
        let body = ErrorResponse {
            error: self.client_message().to_owned(),
        };
        (status, Json(body)).into_response()
    }
}
