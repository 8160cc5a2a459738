//! Image storage for uploaded item pictures.
//!
//! [`BlobStore`] is the storage port; [`LocalBlobStore`] writes to a media
//! directory served by this process and [`HttpBlobStore`] talks to an
//! object-store endpoint. Handlers never call a store directly: they go
//! through [`ImageUploader`], which turns every failure into "no image".

mod http;
mod local;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use http::HttpBlobStore;
pub use local::LocalBlobStore;

/// Folder uploaded item images are stored under.
pub const DEFAULT_UPLOAD_FOLDER: &str = "grocery_items";

/// Content type used when the client sends none.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Errors that can occur when storing or removing a blob.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The object store answered with a non-success status.
    #[error("object store returned {status}")]
    Rejected {
        /// HTTP status code.
        status: u16,
    },

    /// The key would escape the store's namespace.
    #[error("invalid blob key: {0}")]
    InvalidKey(String),
}

/// Storage for uploaded files, addressed by key.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key` and return its public URL.
    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, BlobError>;

    /// Public URL for `key`.
    fn url_for(&self, key: &str) -> String;

    /// Remove `key`. Failures are logged and reported as `false`.
    async fn delete(&self, key: &str) -> bool;
}

/// An uploaded image as received from a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Client-side file name, used only for its extension.
    pub filename: Option<String>,
    /// Declared MIME type.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

/// Build a collision-free key: `{folder}/{uuid}.{ext}`.
///
/// The extension comes from the client file name, lower-cased; names without
/// a plain alphanumeric extension get `bin`.
#[must_use]
pub fn object_key(folder: &str, filename: Option<&str>) -> String {
    let extension = filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map_or_else(|| "bin".to_owned(), str::to_ascii_lowercase);
    format!(
        "{}/{}.{extension}",
        folder.trim_matches('/'),
        Uuid::new_v4()
    )
}

/// Join a public base URL and a key.
pub(crate) fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

/// Reject keys that are empty, absolute or climb out of the namespace.
pub(crate) fn validate_key(key: &str) -> Result<(), BlobError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..");
    if bad {
        return Err(BlobError::InvalidKey(key.to_owned()));
    }
    Ok(())
}

/// Uploads item images, degrading failures to "no image".
#[derive(Clone)]
pub struct ImageUploader {
    store: Arc<dyn BlobStore>,
    folder: String,
}

impl ImageUploader {
    /// Create an uploader writing under `folder`.
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>, folder: impl Into<String>) -> Self {
        Self {
            store,
            folder: folder.into(),
        }
    }

    /// Store an image and return its URL, or `None` if storing failed.
    pub async fn upload(&self, image: &ImageUpload) -> Option<String> {
        let key = object_key(&self.folder, image.filename.as_deref());
        let content_type = image
            .content_type
            .as_deref()
            .unwrap_or(FALLBACK_CONTENT_TYPE);

        match self.store.put(&key, &image.bytes, content_type).await {
            Ok(url) => {
                tracing::debug!(key = %key, bytes = image.bytes.len(), "Stored image");
                Some(url)
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Image upload failed, continuing without image");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct FailingStore;

    #[async_trait]
    impl BlobStore for FailingStore {
        async fn put(&self, _: &str, _: &[u8], _: &str) -> Result<String, BlobError> {
            Err(BlobError::Rejected { status: 503 })
        }

        fn url_for(&self, key: &str) -> String {
            key.to_owned()
        }

        async fn delete(&self, _: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_object_key_keeps_lowercased_extension() {
        let key = object_key("grocery_items", Some("Photo.JPG"));
        assert!(key.starts_with("grocery_items/"));
        assert!(key.ends_with(".jpg"));
        let stem = key
            .trim_start_matches("grocery_items/")
            .trim_end_matches(".jpg");
        assert!(Uuid::parse_str(stem).is_ok());
    }

    #[test]
    fn test_object_key_without_extension() {
        assert!(object_key("f", Some("README")).ends_with(".bin"));
        assert!(object_key("f", None).ends_with(".bin"));
        assert!(object_key("f", Some("x.p/ng")).ends_with(".bin"));
    }

    #[test]
    fn test_object_keys_are_unique() {
        assert_ne!(
            object_key("f", Some("a.png")),
            object_key("f", Some("a.png"))
        );
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("grocery_items/a.png").is_ok());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs.png").is_err());
        assert!(validate_key("a//b").is_err());
        assert!(validate_key("").is_err());
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://cdn.example.com/", "grocery_items/a.png"),
            "https://cdn.example.com/grocery_items/a.png"
        );
    }

    #[tokio::test]
    async fn test_upload_failure_degrades_to_none() {
        let uploader = ImageUploader::new(Arc::new(FailingStore), DEFAULT_UPLOAD_FOLDER);
        let image = ImageUpload {
            filename: Some("a.png".to_owned()),
            content_type: Some("image/png".to_owned()),
            bytes: vec![1, 2, 3],
        };
        assert!(uploader.upload(&image).await.is_none());
    }
}
