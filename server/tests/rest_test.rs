use futures::channel::oneshot;
use futures::channel::oneshot::Sender;
use futures::future::join_all;
use kernel::{ErrorResponse, FileInfoResponse, FileListResponse, MessageResponse, UploadResponse};
use rand::Rng;
use reqwest::multipart;
use reqwest::Client;
use reqwest::StatusCode;
use serial_test::serial;
use server::domain::Storage;
use server::sqlite::Mode;
use server::sqlite::Sqlite;
use std::net::SocketAddr;
use std::net::TcpListener;
use std::{env, path::PathBuf};
use test_context::{test_context, AsyncTestContext};
use tokio::task::JoinHandle;
use uuid::Uuid;

const FSTORE_TEST_ROOT: &str = "fstore_test";
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ\
                            abcdefghijklmnopqrstuvwxyz\
                            0123456789_";
const DB_LEN: usize = 20;

struct FstoreAsyncContext {
    uploads: PathBuf,
    db: PathBuf,
    port: String,
    shutdown: Sender<()>,
    join: JoinHandle<()>,
}

fn get_available_port() -> Option<u16> {
    loop {
        let port = rand::thread_rng().gen_range(8000..9000);
        if port_is_available(port) {
            return Some(port);
        }
    }
}

fn port_is_available(port: u16) -> bool {
    TcpListener::bind(("0.0.0.0", port)).is_ok()
}

impl FstoreAsyncContext {
    async fn remove_db(db_path: PathBuf) {
        tokio::fs::remove_file(db_path.clone())
            .await
            .unwrap_or_default();
        let base_db_file = db_path.as_os_str().to_str().unwrap().to_owned();
        let journal_file = base_db_file + "-journal";
        tokio::fs::remove_file(journal_file).await.unwrap_or_default();
    }

    fn uri(&self, path: &str) -> String {
        format!("http://localhost:{}{path}", self.port)
    }
}

impl AsyncTestContext for FstoreAsyncContext {
    async fn setup() -> FstoreAsyncContext {
        let tmp_dir = env::temp_dir();
        let uploads = tmp_dir
            .join(FSTORE_TEST_ROOT)
            .join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&uploads).await.unwrap();

        let db_file: String = (0..DB_LEN)
            .map(|_| {
                let idx = rand::thread_rng().gen_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect();

        let db = tmp_dir.join(db_file + ".db");
        if db.exists() {
            FstoreAsyncContext::remove_db(db.clone()).await;
        }

        Sqlite::open(db.clone(), Mode::ReadWrite)
            .expect("Database file cannot be created")
            .new_database()
            .unwrap();

        let mut port = 0;

        if let Some(available_port) = get_available_port() {
            println!("port `{available_port}` is available");
            port = available_port;
        }

        let port = port.to_string();

        let (send, recv) = oneshot::channel::<()>();

        let cloned_db = db.clone();
        let cloned_uploads = uploads.clone();
        let cloned_port = port.clone();
        let task = tokio::spawn(async move {
            let app = server::create_routes(cloned_db, cloned_uploads);
            let socket: SocketAddr = format!("0.0.0.0:{cloned_port}").parse().unwrap();
            let listener = tokio::net::TcpListener::bind(socket).await.unwrap();
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    recv.await.unwrap_or_default();
                })
                .await
                .unwrap();
        });

        FstoreAsyncContext {
            uploads,
            db,
            port,
            shutdown: send,
            join: task,
        }
    }

    async fn teardown(self) {
        self.shutdown.send(()).unwrap_or_default();
        self.join.await.unwrap_or_default();
        FstoreAsyncContext::remove_db(self.db).await;
        tokio::fs::remove_dir_all(self.uploads)
            .await
            .unwrap_or_default();
    }
}

async fn upload_file(
    client: &Client,
    uri: String,
    name: &str,
    content: &'static [u8],
    mime: &str,
) -> reqwest::Response {
    let part = multipart::Part::bytes(content)
        .file_name(name.to_owned())
        .mime_str(mime)
        .unwrap();
    let form = multipart::Form::new().part("file", part);
    client.post(uri).multipart(form).send().await.unwrap()
}

#[test_context(FstoreAsyncContext)]
#[tokio::test]
#[serial]
async fn health_check(ctx: &mut FstoreAsyncContext) {
    // Arrange
    let client = Client::new();

    // Act
    let result = client.get(ctx.uri("/")).send().await.unwrap();

    // Assert
    assert_eq!(result.status(), StatusCode::OK);
    let r: MessageResponse = result.json().await.unwrap();
    assert!(!r.message.is_empty());
}

#[test_context(FstoreAsyncContext)]
#[tokio::test]
#[serial]
async fn upload_single_file(ctx: &mut FstoreAsyncContext) {
    // Arrange
    let client = Client::new();

    // Act
    let result = upload_file(
        &client,
        ctx.uri("/upload"),
        "a.txt",
        b"hello world",
        "text/plain",
    )
    .await;

    // Assert
    assert_eq!(result.status(), StatusCode::CREATED);
    let r: UploadResponse = result.json().await.unwrap();
    assert_eq!(r.message, "File uploaded successfully");
    assert_eq!(r.file.original_name, "a.txt");
    assert_eq!(r.file.size, 11);
    assert_eq!(r.file.mime_type, "text/plain");
    assert!(r.file.stored_name.ends_with(".txt"));
    assert!(r.file.path.ends_with(&r.file.stored_name));
    assert!(r.file.id > 0);
}

#[test_context(FstoreAsyncContext)]
#[tokio::test]
#[serial]
async fn upload_without_file_part(ctx: &mut FstoreAsyncContext) {
    // Arrange
    let client = Client::new();
    let form = multipart::Form::new().text("comment", "not a file");

    // Act
    let result = client
        .post(ctx.uri("/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(result.status(), StatusCode::BAD_REQUEST);
    let r: ErrorResponse = result.json().await.unwrap();
    assert_eq!(r.error, "No file uploaded");

    // No row may appear from a rejected upload
    let result = client.get(ctx.uri("/files")).send().await.unwrap();
    let r: FileListResponse = result.json().await.unwrap();
    assert!(r.files.is_empty());
}

#[test_context(FstoreAsyncContext)]
#[tokio::test]
#[serial]
async fn list_files_newest_first(ctx: &mut FstoreAsyncContext) {
    // Arrange
    let client = Client::new();
    upload_file(&client, ctx.uri("/upload"), "a.txt", b"first", "text/plain").await;
    upload_file(
        &client,
        ctx.uri("/upload"),
        "b.bin",
        b"second!",
        "application/octet-stream",
    )
    .await;

    // Act
    let result = client.get(ctx.uri("/files")).send().await.unwrap();

    // Assert
    assert_eq!(result.status(), StatusCode::OK);
    let r: FileListResponse = result.json().await.unwrap();
    assert_eq!(r.files.len(), 2);
    assert_eq!(r.files[0].original_name, "b.bin");
    assert_eq!(r.files[1].original_name, "a.txt");
}

#[test_context(FstoreAsyncContext)]
#[tokio::test]
#[serial]
async fn list_and_get_agree(ctx: &mut FstoreAsyncContext) {
    // Arrange
    let client = Client::new();
    upload_file(&client, ctx.uri("/upload"), "a.txt", b"first", "text/plain").await;
    upload_file(
        &client,
        ctx.uri("/upload"),
        "b.bin",
        b"second!",
        "application/octet-stream",
    )
    .await;
    let listed: FileListResponse = client
        .get(ctx.uri("/files"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    for entry in listed.files {
        // Act
        let result = client
            .get(ctx.uri(&format!("/files/{}", entry.id)))
            .send()
            .await
            .unwrap();

        // Assert
        assert_eq!(result.status(), StatusCode::OK);
        let r: FileInfoResponse = result.json().await.unwrap();
        assert_eq!(r.file.original_name, entry.original_name);
        assert_eq!(r.file.mime_type, entry.mime_type);
        assert_eq!(r.file.size, entry.size);
    }
}

#[test_context(FstoreAsyncContext)]
#[tokio::test]
#[serial]
async fn get_unexist_file_info(ctx: &mut FstoreAsyncContext) {
    // Arrange
    let client = Client::new();

    // Act
    let result = client.get(ctx.uri("/files/30000")).send().await.unwrap();

    // Assert
    assert_eq!(result.status(), StatusCode::NOT_FOUND);
    let r: ErrorResponse = result.json().await.unwrap();
    assert_eq!(r.error, "File not found");
}

#[test_context(FstoreAsyncContext)]
#[tokio::test]
#[serial]
async fn download_file_content(ctx: &mut FstoreAsyncContext) {
    // Arrange
    let client = Client::new();
    let uploaded: UploadResponse = upload_file(
        &client,
        ctx.uri("/upload"),
        "a.txt",
        b"hello world",
        "text/plain",
    )
    .await
    .json()
    .await
    .unwrap();

    // Act
    let result = client
        .get(ctx.uri(&format!("/files/{}/download", uploaded.file.id)))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(result.status(), StatusCode::OK);
    let disposition = result
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert_eq!(disposition, r#"attachment; filename="a.txt""#);
    let body = result.bytes().await.unwrap();
    assert_eq!(&body[..], b"hello world");
}

#[test_context(FstoreAsyncContext)]
#[tokio::test]
#[serial]
async fn download_file_missing_on_disk(ctx: &mut FstoreAsyncContext) {
    // Arrange
    let client = Client::new();
    let uploaded: UploadResponse = upload_file(
        &client,
        ctx.uri("/upload"),
        "a.txt",
        b"hello world",
        "text/plain",
    )
    .await
    .json()
    .await
    .unwrap();

    // Stale row: the blob disappears underneath the metadata
    tokio::fs::remove_file(&uploaded.file.path).await.unwrap();

    // Act
    let result = client
        .get(ctx.uri(&format!("/files/{}/download", uploaded.file.id)))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(result.status(), StatusCode::NOT_FOUND);
    let r: ErrorResponse = result.json().await.unwrap();
    assert_eq!(r.error, "File missing on disk");
}

#[test_context(FstoreAsyncContext)]
#[tokio::test]
#[serial]
async fn delete_file_success(ctx: &mut FstoreAsyncContext) {
    // Arrange
    let client = Client::new();
    let uploaded: UploadResponse = upload_file(
        &client,
        ctx.uri("/upload"),
        "a.txt",
        b"hello world",
        "text/plain",
    )
    .await
    .json()
    .await
    .unwrap();
    let id = uploaded.file.id;

    // Act
    let result = client
        .delete(ctx.uri(&format!("/files/{id}")))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(result.status(), StatusCode::OK);
    let r: MessageResponse = result.json().await.unwrap();
    assert_eq!(r.message, "File deleted successfully");

    let result = client
        .get(ctx.uri(&format!("/files/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(result.status(), StatusCode::NOT_FOUND);

    assert!(!tokio::fs::try_exists(&uploaded.file.path).await.unwrap());
}

#[test_context(FstoreAsyncContext)]
#[tokio::test]
#[serial]
async fn delete_unexist_file(ctx: &mut FstoreAsyncContext) {
    // Arrange
    let client = Client::new();

    // Act
    let result = client.delete(ctx.uri("/files/1111111")).send().await.unwrap();

    // Assert
    assert_eq!(result.status(), StatusCode::NOT_FOUND);
    let r: ErrorResponse = result.json().await.unwrap();
    assert_eq!(r.error, "File not found");
}

#[test_context(FstoreAsyncContext)]
#[tokio::test]
#[serial]
async fn static_mount_serves_uploaded_blob(ctx: &mut FstoreAsyncContext) {
    // Arrange
    let client = Client::new();
    let uploaded: UploadResponse = upload_file(
        &client,
        ctx.uri("/upload"),
        "a.txt",
        b"hello world",
        "text/plain",
    )
    .await
    .json()
    .await
    .unwrap();

    // Act
    let result = client
        .get(ctx.uri(&format!("/uploads/{}", uploaded.file.stored_name)))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(result.status(), StatusCode::OK);
    let body = result.bytes().await.unwrap();
    assert_eq!(&body[..], b"hello world");
}

#[test_context(FstoreAsyncContext)]
#[tokio::test]
#[serial]
async fn upload_many_concurrently(ctx: &mut FstoreAsyncContext) {
    let mut handles = Vec::new();
    for number in 0..20 {
        let uri = ctx.uri("/upload");
        let task = tokio::spawn(async move {
            // Arrange
            let client = Client::new();
            let name = format!("f{number}.txt");

            // Act
            let result = upload_file(&client, uri, &name, b"cc", "text/plain").await;

            // Assert
            assert_eq!(result.status(), StatusCode::CREATED);
        });
        handles.push(task);
    }

    let results = join_all(handles).await;
    for r in results {
        assert!(r.is_ok());
    }

    let client = Client::new();
    let listed: FileListResponse = client
        .get(ctx.uri("/files"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.files.len(), 20);
}

#[test_context(FstoreAsyncContext)]
#[tokio::test]
#[serial]
async fn upload_list_delete_scenario(ctx: &mut FstoreAsyncContext) {
    // Arrange
    let client = Client::new();

    // Act / Assert: upload
    let result = upload_file(
        &client,
        ctx.uri("/upload"),
        "a.txt",
        b"hello world",
        "text/plain",
    )
    .await;
    assert_eq!(result.status(), StatusCode::CREATED);
    let uploaded: UploadResponse = result.json().await.unwrap();
    assert_eq!(uploaded.file.size, 11);
    assert_eq!(uploaded.file.original_name, "a.txt");

    // list contains exactly that file
    let listed: FileListResponse = client
        .get(ctx.uri("/files"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.files.len(), 1);
    assert_eq!(listed.files[0].original_name, "a.txt");

    // delete it
    let result = client
        .delete(ctx.uri(&format!("/files/{}", uploaded.file.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(result.status(), StatusCode::OK);

    // gone afterwards
    let result = client
        .get(ctx.uri(&format!("/files/{}", uploaded.file.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(result.status(), StatusCode::NOT_FOUND);
}
