//! Blob store on the local filesystem.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::{BlobError, BlobStore, join_url, validate_key};

/// Stores blobs as files under a media directory.
///
/// The server mounts the directory at `/media`, so `public_base` is normally
/// `{base_url}/media`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base: String,
}

impl LocalBlobStore {
    /// Create a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<String, BlobError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), "Wrote blob");
        Ok(self.url_for(key))
    }

    fn url_for(&self, key: &str) -> String {
        join_url(&self.public_base, key)
    }

    async fn delete(&self, key: &str) -> bool {
        let path = match self.path_for(key) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Refusing to delete blob");
                return false;
            }
        };
        match fs::remove_file(&path).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to delete blob");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "http://localhost:3000/media/");

        let url = store
            .put("grocery_items/a.png", b"png-bytes", "image/png")
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:3000/media/grocery_items/a.png");
        let written = std::fs::read(dir.path().join("grocery_items/a.png")).unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[tokio::test]
    async fn test_delete_reports_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "/media");
        store.put("f/a.bin", b"x", "application/octet-stream").await.unwrap();

        assert!(store.delete("f/a.bin").await);
        assert!(!store.delete("f/a.bin").await);
        assert!(!store.delete("../outside").await);
    }

    #[tokio::test]
    async fn test_put_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "/media");
        let result = store.put("../escape.png", b"x", "image/png").await;
        assert!(matches!(result, Err(BlobError::InvalidKey(_))));
    }
}
