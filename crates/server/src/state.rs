//! Application state shared across handlers.

use std::sync::Arc;

use crate::blob::{BlobError, BlobStore, HttpBlobStore, ImageUploader, LocalBlobStore};
use crate::config::{BasketConfig, BlobConfig};
use crate::db::Store;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like storage and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BasketConfig,
    store: Arc<dyn Store>,
    uploader: ImageUploader,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `store` - Storage for users, lists and items
    /// * `blobs` - Storage for uploaded images
    #[must_use]
    pub fn new(config: BasketConfig, store: Arc<dyn Store>, blobs: Arc<dyn BlobStore>) -> Self {
        let uploader = ImageUploader::new(blobs, config.upload_folder.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                uploader,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &BasketConfig {
        &self.inner.config
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the image uploader.
    #[must_use]
    pub fn uploader(&self) -> &ImageUploader {
        &self.inner.uploader
    }
}

/// Build the blob store selected by configuration.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn blob_store_from_config(config: &BlobConfig) -> Result<Arc<dyn BlobStore>, BlobError> {
    let store: Arc<dyn BlobStore> = match config {
        BlobConfig::Local {
            media_dir,
            public_url,
        } => Arc::new(LocalBlobStore::new(media_dir.clone(), public_url.clone())),
        BlobConfig::Http {
            endpoint,
            token,
            public_url,
        } => Arc::new(HttpBlobStore::new(
            endpoint.as_str(),
            token.clone(),
            public_url.clone(),
        )?),
    };
    Ok(store)
}
