use core::fmt;

use url::Url;

/// Server endpoint addresses derived from one base URI.
#[derive(Clone)]
pub struct Endpoint {
    base: Url,
}

impl Endpoint {
    #[must_use]
    pub fn new(uri: &str) -> Option<Endpoint> {
        let base = Url::parse(uri).ok()?;
        Some(Endpoint { base })
    }

    #[must_use]
    pub fn upload(&self) -> String {
        self.join("upload")
    }

    #[must_use]
    pub fn files(&self) -> String {
        self.join("files")
    }

    #[must_use]
    pub fn file(&self, id: i64) -> String {
        self.join(&format!("files/{id}"))
    }

    #[must_use]
    pub fn download(&self, id: i64) -> String {
        self.join(&format!("files/{id}/download"))
    }

    fn join(&self, path: &str) -> String {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(path.split('/'));
        }
        url.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.base)
    }
}
