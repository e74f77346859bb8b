use std::path::PathBuf;

use comfy_table::{presets::UTF8_HORIZONTAL_ONLY, Attribute, Cell, ContentArrangement, Table};
use endpoint::Endpoint;
use kernel::{ErrorResponse, FileInfoResponse, FileListResponse, MessageResponse, UploadResponse};
use reqwest::multipart;
use reqwest::Client;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

pub mod endpoint;

pub struct FileParams {
    pub uri: String,
    pub file: String,
}

pub async fn upload_file(params: FileParams) {
    let Some(endpoint) = Endpoint::new(&params.uri) else {
        println!("invalid uri: {}", params.uri);
        return;
    };

    let path = PathBuf::from(&params.file);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let error_message = format!("no such file {}", &params.file);
    let f = File::open(&params.file).await.expect(&error_message);
    let meta = f.metadata().await.expect(&error_message);
    let stream = ReaderStream::new(f);
    let body = reqwest::Body::wrap_stream(stream);
    let part = multipart::Part::stream_with_length(body, meta.len()).file_name(file_name);
    let form = multipart::Form::new().part("file", part);

    let client = Client::new();
    let result = client.post(endpoint.upload()).multipart(form).send().await;
    match result {
        Ok(response) if response.status().is_success() => {
            match response.json::<UploadResponse>().await {
                Ok(r) => {
                    println!(
                        "file {} uploaded. id: {} stored as: {}",
                        params.file, r.file.id, r.file.stored_name
                    );
                }
                Err(e) => println!("JSON decode error: {e}"),
            }
        }
        Ok(response) => {
            println!(
                "file {} not uploaded. Status: {}",
                params.file,
                response.status()
            );
        }
        Err(e) => {
            println!("upload error: {e}");
        }
    }
}

pub async fn list_files(uri: &str) {
    let Some(endpoint) = Endpoint::new(uri) else {
        println!("invalid uri: {uri}");
        return;
    };

    let client = Client::new();

    match client.get(endpoint.files()).send().await {
        Ok(response) => match response.json::<FileListResponse>().await {
            Ok(r) => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_HORIZONTAL_ONLY)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_width(120)
                    .set_header(vec![
                        Cell::new("Id").add_attribute(Attribute::Bold),
                        Cell::new("Name").add_attribute(Attribute::Bold),
                        Cell::new("Mime type").add_attribute(Attribute::Bold),
                        Cell::new("Size").add_attribute(Attribute::Bold),
                        Cell::new("Uploaded at").add_attribute(Attribute::Bold),
                    ]);

                for f in r.files {
                    table.add_row(vec![
                        Cell::new(f.id),
                        Cell::new(f.original_name),
                        Cell::new(f.mime_type),
                        Cell::new(f.size),
                        Cell::new(f.uploaded_at),
                    ]);
                }
                println!("{table}");
            }
            Err(e) => println!("JSON decode error: {e}"),
        },
        Err(e) => {
            println!("error: {e}");
        }
    }
}

pub async fn file_info(uri: &str, id: i64) {
    let Some(endpoint) = Endpoint::new(uri) else {
        println!("invalid uri: {uri}");
        return;
    };

    let client = Client::new();

    match client.get(endpoint.file(id)).send().await {
        Ok(response) if response.status().is_success() => {
            match response.json::<FileInfoResponse>().await {
                Ok(r) => {
                    println!("Id             : {}", r.file.id);
                    println!("Name           : {}", r.file.original_name);
                    println!("Stored as      : {}", r.file.stored_name);
                    println!("Mime type      : {}", r.file.mime_type);
                    println!("Size           : {}", r.file.size);
                    println!("Path           : {}", r.file.path);
                    println!("Uploaded at    : {}", r.file.uploaded_at);
                }
                Err(e) => println!("JSON decode error: {e}"),
            }
        }
        Ok(response) => match response.json::<ErrorResponse>().await {
            Ok(r) => println!("file {id}: {}", r.error),
            Err(e) => println!("JSON decode error: {e}"),
        },
        Err(e) => {
            println!("error: {e}");
        }
    }
}

pub async fn download_file(uri: &str, id: i64, output: Option<&str>) {
    let Some(endpoint) = Endpoint::new(uri) else {
        println!("invalid uri: {uri}");
        return;
    };

    let client = Client::new();

    match client.get(endpoint.download(id)).send().await {
        Ok(response) if response.status().is_success() => {
            let target = output
                .map(str::to_owned)
                .or_else(|| {
                    response
                        .headers()
                        .get("content-disposition")
                        .and_then(|v| v.to_str().ok())
                        .and_then(attachment_name)
                })
                .unwrap_or_else(|| format!("file-{id}"));
            match response.bytes().await {
                Ok(data) => match tokio::fs::write(&target, &data).await {
                    Ok(()) => {
                        println!("file {id} downloaded to {target} ({} bytes)", data.len());
                    }
                    Err(e) => println!("write error: {e}"),
                },
                Err(e) => println!("download error: {e}"),
            }
        }
        Ok(response) => match response.json::<ErrorResponse>().await {
            Ok(r) => println!("file {id}: {}", r.error),
            Err(e) => println!("JSON decode error: {e}"),
        },
        Err(e) => {
            println!("error: {e}");
        }
    }
}

pub async fn delete_file(uri: &str, id: i64) {
    let Some(endpoint) = Endpoint::new(uri) else {
        println!("invalid uri: {uri}");
        return;
    };

    let client = Client::new();

    match client.delete(endpoint.file(id)).send().await {
        Ok(response) if response.status().is_success() => {
            match response.json::<MessageResponse>().await {
                Ok(r) => println!("{}", r.message),
                Err(e) => println!("JSON decode error: {e}"),
            }
        }
        Ok(response) => match response.json::<ErrorResponse>().await {
            Ok(r) => println!("file {id}: {}", r.error),
            Err(e) => println!("JSON decode error: {e}"),
        },
        Err(e) => {
            println!("error: {e}");
        }
    }
}

/// File name carried by a `content-disposition: attachment` header.
fn attachment_name(header: &str) -> Option<String> {
    let ix = header.find("filename=")?;
    let name = header[ix + "filename=".len()..].trim().trim_matches('"');
    if name.is_empty() {
        None
    } else {
        Some(name.to_owned())
    }
}
