//! Blob store behind an HTTP object-store endpoint.
//!
//! Objects are written with `PUT {endpoint}/{key}` and removed with
//! `DELETE {endpoint}/{key}`, authenticated with a bearer token. Public URLs
//! are built from a separate base (usually a CDN domain).

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};

use super::{BlobError, BlobStore, join_url, validate_key};

/// Object store client.
#[derive(Clone)]
pub struct HttpBlobStore {
    client: reqwest::Client,
    endpoint: String,
    token: SecretString,
    public_base: String,
}

impl std::fmt::Debug for HttpBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBlobStore")
            .field("endpoint", &self.endpoint)
            .field("token", &"[REDACTED]")
            .field("public_base", &self.public_base)
            .finish()
    }
}

impl HttpBlobStore {
    /// Create a new object store client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(
        endpoint: impl Into<String>,
        token: SecretString,
        public_base: impl Into<String>,
    ) -> Result<Self, BlobError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
            public_base: public_base.into(),
        })
    }

    fn object_url(&self, key: &str) -> Result<String, BlobError> {
        validate_key(key)?;
        Ok(join_url(&self.endpoint, key))
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, BlobError> {
        let url = self.object_url(key)?;

        let response = self
            .client
            .put(&url)
            .bearer_auth(self.token.expose_secret())
            .header(CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BlobError::Rejected {
                status: status.as_u16(),
            });
        }

        Ok(self.url_for(key))
    }

    fn url_for(&self, key: &str) -> String {
        join_url(&self.public_base, key)
    }

    async fn delete(&self, key: &str) -> bool {
        let url = match self.object_url(key) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Refusing to delete blob");
                return false;
            }
        };

        let result = self
            .client
            .delete(&url)
            .bearer_auth(self.token.expose_secret())
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(key = %key, status = %response.status(), "Object store refused delete");
                false
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to delete blob");
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::body::Bytes;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::put;

    use super::*;

    #[derive(Clone, Default)]
    struct Received {
        puts: Arc<Mutex<Vec<(String, String, String, Vec<u8>)>>>,
    }

    async fn accept(
        State(received): State<Received>,
        Path(key): Path<String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> StatusCode {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_owned()
        };
        received.puts.lock().unwrap().push((
            key,
            header("authorization"),
            header("content-type"),
            body.to_vec(),
        ));
        StatusCode::OK
    }

    async fn spawn_object_store(status_for_delete: StatusCode) -> (String, Received) {
        let received = Received::default();
        let app = Router::new()
            .route(
                "/bucket/{*key}",
                put(accept).delete(move || async move { status_for_delete }),
            )
            .with_state(received.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/bucket"), received)
    }

    #[tokio::test]
    async fn test_put_sends_object_with_token_and_content_type() {
        let (endpoint, received) = spawn_object_store(StatusCode::NO_CONTENT).await;
        let store = HttpBlobStore::new(
            endpoint,
            SecretString::from("tok-123"),
            "https://cdn.example.com",
        )
        .unwrap();

        let url = store
            .put("grocery_items/a.png", b"img", "image/png")
            .await
            .unwrap();

        assert_eq!(url, "https://cdn.example.com/grocery_items/a.png");
        let puts = received.puts.lock().unwrap();
        assert_eq!(puts.len(), 1);
        let (key, auth, content_type, body) = &puts[0];
        assert_eq!(key, "grocery_items/a.png");
        assert_eq!(auth, "Bearer tok-123");
        assert_eq!(content_type, "image/png");
        assert_eq!(body, b"img");
    }

    #[tokio::test]
    async fn test_delete_maps_status_to_bool() {
        let (endpoint, _) = spawn_object_store(StatusCode::NO_CONTENT).await;
        let store =
            HttpBlobStore::new(endpoint, SecretString::from("t"), "https://cdn.example.com")
                .unwrap();
        assert!(store.delete("grocery_items/a.png").await);

        let (endpoint, _) = spawn_object_store(StatusCode::FORBIDDEN).await;
        let store =
            HttpBlobStore::new(endpoint, SecretString::from("t"), "https://cdn.example.com")
                .unwrap();
        assert!(!store.delete("grocery_items/a.png").await);
    }

    #[tokio::test]
    async fn test_put_unreachable_endpoint_is_error() {
        let store = HttpBlobStore::new(
            "http://127.0.0.1:9/bucket",
            SecretString::from("t"),
            "https://cdn.example.com",
        )
        .unwrap();
        assert!(store.put("f/a.png", b"x", "image/png").await.is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let store = HttpBlobStore::new(
            "http://localhost/bucket",
            SecretString::from("very-secret-token"),
            "https://cdn.example.com",
        )
        .unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("very-secret-token"));
    }
}
