use axum::{
    body::Body,
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use kernel::FileRecord;

/// Blob bytes served as an attachment named after the original upload.
pub struct FileReply {
    data: Vec<u8>,
    file: FileRecord,
}

impl FileReply {
    #[must_use]
    pub fn new(data: Vec<u8>, file: FileRecord) -> Self {
        Self { data, file }
    }

    fn content_type(&self) -> HeaderValue {
        HeaderValue::from_str(&self.file.mime_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
    }

    fn content_disposition(&self) -> String {
        format!(r#"attachment; filename="{}""#, self.file.original_name)
    }
}

impl IntoResponse for FileReply {
    fn into_response(self) -> Response {
        let content_type = self.content_type();
        let attachment = self.content_disposition();
        let len = self.data.len().to_string();
        let mut res = Body::from(self.data).into_response();
        res.headers_mut().insert("content-type", content_type);
        if let Ok(val) = HeaderValue::from_str(attachment.as_str()) {
            res.headers_mut().insert("content-disposition", val);
        }
        if let Ok(val) = HeaderValue::from_str(len.as_str()) {
            res.headers_mut().insert("content-length", val);
        }

        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rstest::rstest;

    fn file(original_name: &str, mime_type: &str) -> FileRecord {
        FileRecord {
            id: 1,
            original_name: original_name.to_owned(),
            stored_name: "1-1.bin".to_owned(),
            mime_type: mime_type.to_owned(),
            size: 1,
            path: "uploads/1-1.bin".to_owned(),
            uploaded_at: Utc::now(),
        }
    }

    #[rstest]
    #[case("report.pdf", r#"attachment; filename="report.pdf""#)]
    #[case("a.txt", r#"attachment; filename="a.txt""#)]
    #[case("no extension", r#"attachment; filename="no extension""#)]
    #[trace]
    fn disposition_uses_original_name(#[case] name: &str, #[case] expected: &str) {
        // Arrange
        let reply = FileReply::new(Vec::new(), file(name, "text/plain"));

        // Act
        let disposition = reply.content_disposition();

        // Assert
        assert_eq!(disposition, expected);
    }

    #[rstest]
    #[case("text/plain", "text/plain")]
    #[case("application/pdf", "application/pdf")]
    #[case("not a\nheader value", "application/octet-stream")]
    #[trace]
    fn content_type_falls_back_to_octet_stream(#[case] mime: &str, #[case] expected: &str) {
        // Arrange
        let reply = FileReply::new(Vec::new(), file("a.bin", mime));

        // Act
        let value = reply.content_type();

        // Assert
        assert_eq!(value.to_str().unwrap(), expected);
    }

    #[test]
    fn response_carries_headers_and_body_length() {
        // Arrange
        let reply = FileReply::new(b"hello world".to_vec(), file("a.txt", "text/plain"));

        // Act
        let response = reply.into_response();

        // Assert
        let headers = response.headers();
        assert_eq!(headers.get("content-type").unwrap(), "text/plain");
        assert_eq!(
            headers.get("content-disposition").unwrap(),
            r#"attachment; filename="a.txt""#
        );
        assert_eq!(headers.get("content-length").unwrap(), "11");
    }
}
