use client::FileParams;

pub async fn upload_single_file(params: FileParams) {
    client::upload_file(params).await;
}

pub async fn list_files(uri: &str) {
    client::list_files(uri).await;
}

pub async fn file_info(uri: &str, id: i64) {
    client::file_info(uri, id).await;
}

pub async fn download_file(uri: &str, id: i64, output: Option<&str>) {
    client::download_file(uri, id, output).await;
}

pub async fn delete_file(uri: &str, id: i64) {
    client::delete_file(uri, id).await;
}
