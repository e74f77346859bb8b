use std::{path::PathBuf, sync::Arc};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    classify::ServerErrorsFailureClass, limit::RequestBodyLimitLayer, services::ServeDir,
    trace::TraceLayer,
};
use tracing::Span;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod blob;
pub mod domain;
pub mod error;
pub mod file_reply;
mod handlers;
pub mod naming;
pub mod sqlite;

use crate::blob::BlobStore;
use crate::domain::Storage;
use crate::sqlite::{Mode, Sqlite};
use std::env;
use std::net::SocketAddr;
use std::path::Path;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DB_FILE: &str = "fstore.db";
const CURRENT_DIR: &str = "./";
const UPLOADS_DIR: &str = "uploads";
const DEFAULT_PORT: &str = "3000";

/// Process-wide context handed to every handler: where the database
/// lives and where blobs go.
pub struct ServiceState {
    pub db: PathBuf,
    pub blobs: BlobStore,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::upload,
        handlers::list_files,
        handlers::get_file,
        handlers::download_file,
        handlers::delete_file
    ),
    components(schemas(
        kernel::FileRecord,
        kernel::FileSummary,
        kernel::StoredFile,
        kernel::UploadResponse,
        kernel::FileInfoResponse,
        kernel::FileListResponse,
        kernel::MessageResponse,
        kernel::ErrorResponse
    ))
)]
struct ApiDoc;

pub async fn run() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "fstore=debug,server=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Configuration from environment
    let db_file = env::var("FSTORE_DATA_FILE").unwrap_or_else(|_| String::from(DB_FILE));
    let dir = env::var("FSTORE_DATA_DIR").unwrap_or_else(|_| String::from(CURRENT_DIR));
    let uploads = env::var("FSTORE_UPLOADS_DIR").unwrap_or_else(|_| String::from(UPLOADS_DIR));
    let port = env::var("FSTORE_PORT").unwrap_or_else(|_| String::from(DEFAULT_PORT));

    // Start init
    let db = Path::new(&dir).join(&db_file);
    if !db.exists() {
        Sqlite::open(db.clone(), Mode::ReadWrite)
            .expect("Database file cannot be created")
            .new_database()
            .unwrap_or_default();
    }
    std::fs::create_dir_all(&uploads).expect("Uploads directory cannot be created");

    let socket: SocketAddr = format!("0.0.0.0:{port}").parse().unwrap();
    tracing::debug!("listening on {socket}");

    let app = create_routes(db, PathBuf::from(uploads));

    let listener = tokio::net::TcpListener::bind(socket)
        .await
        .expect("Listener cannot be bound");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

pub fn create_routes(db: PathBuf, uploads: PathBuf) -> Router {
    let blobs = BlobStore::new(uploads);
    // Direct directory exposure: anything under the uploads root is
    // fetchable by path, registered in the database or not.
    let serve_uploads = ServeDir::new(blobs.root().to_path_buf());
    let state = Arc::new(ServiceState { db, blobs });
    Router::new()
        .route("/", get(handlers::health))
        .route("/upload", post(handlers::upload))
        .route("/files", get(handlers::list_files))
        .route(
            "/files/:id",
            get(handlers::get_file).delete(handlers::delete_file),
        )
        .route("/files/:id/download", get(handlers::download_file))
        .nest_service("/uploads", serve_uploads)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().on_failure(
                    |error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                        tracing::error!("Server error: {error}");
                    },
                ))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(
                    2 * 1024 * 1024 * 1024, /* 2GB */
                ))
                .into_inner(),
        )
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    println!("signal received, starting graceful shutdown");
}
