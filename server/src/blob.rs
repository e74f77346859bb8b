use std::io;
use std::path::{Path, PathBuf};

/// Flat on-disk blob directory, one file per stored name, no sharding.
///
/// Lifetimes of blobs and metadata rows are independent: callers decide
/// ordering and nothing here reconciles drift between the two.
#[derive(Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path recorded in the metadata row, `<uploads-dir>/<stored_name>`.
    #[must_use]
    pub fn record_path(&self, stored_name: &str) -> String {
        self.root.join(stored_name).display().to_string()
    }

    /// Writes the blob and reports the byte count written.
    pub async fn save(&self, stored_name: &str, data: &[u8]) -> io::Result<u64> {
        tokio::fs::write(self.root.join(stored_name), data).await?;
        Ok(data.len() as u64)
    }

    pub async fn read(&self, stored_name: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.root.join(stored_name)).await
    }

    pub async fn exists(&self, stored_name: &str) -> bool {
        tokio::fs::try_exists(self.root.join(stored_name))
            .await
            .unwrap_or(false)
    }

    /// Removes the blob. A name that is already gone is a silent no-op.
    pub async fn delete(&self, stored_name: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.root.join(stored_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
