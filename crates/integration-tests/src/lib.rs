//! End-to-end test harness for Basket.
//!
//! [`TestApp::spawn`] serves the full router on an ephemeral local port with
//! in-memory users/lists, in-memory sessions and a temporary media directory,
//! so the tests in `tests/` need no database or external services.
//!
//! ```rust,ignore
//! let app = TestApp::spawn().await;
//! let alice = app.client();
//! app.signup(&alice, "alice").await;
//! let resp = alice.get(app.url("/")).send().await.unwrap();
//! assert_eq!(resp.status(), 200);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::{Client, Response, redirect};
use secrecy::SecretString;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tower_sessions::MemoryStore;
use url::Url;

use basket_server::blob::{DEFAULT_UPLOAD_FOLDER, LocalBlobStore};
use basket_server::config::{BasketConfig, BlobConfig, SentryConfig};
use basket_server::db::InMemoryStore;
use basket_server::routes;
use basket_server::state::AppState;

/// Password used by [`TestApp::signup`].
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Upload limit used by test servers.
const TEST_MAX_UPLOAD_BYTES: usize = 64 * 1024;

/// A running server and its media directory.
pub struct TestApp {
    pub base_url: String,
    pub media: TempDir,
    server: JoinHandle<()>,
}

impl TestApp {
    /// Start a server on `127.0.0.1` with a random port.
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let base_url = format!("http://{addr}");

        let media = tempfile::tempdir().expect("Failed to create media directory");
        let media_url = format!("{base_url}/media");

        let config = BasketConfig {
            database_url: SecretString::from("postgres://unused/basket_test"),
            host: addr.ip(),
            port: addr.port(),
            base_url: Url::parse(&base_url).expect("Invalid base URL"),
            blob: BlobConfig::Local {
                media_dir: media.path().to_path_buf(),
                public_url: media_url.clone(),
            },
            upload_folder: DEFAULT_UPLOAD_FOLDER.to_string(),
            max_upload_bytes: TEST_MAX_UPLOAD_BYTES,
            sentry: SentryConfig::default(),
        };

        let blobs = Arc::new(LocalBlobStore::new(media.path(), media_url));
        let state = AppState::new(config, Arc::new(InMemoryStore::new()), blobs);
        let app = routes::app(state, MemoryStore::default());

        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test server failed");
        });

        Self {
            base_url,
            media,
            server,
        }
    }

    /// Absolute URL for a path on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A fresh browser: own cookie jar, redirects not followed.
    #[must_use]
    pub fn client(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Sign up `username` with [`TEST_PASSWORD`]; the client is then logged in.
    pub async fn signup(&self, client: &Client, username: &str) -> Response {
        let resp = client
            .post(self.url("/signup"))
            .form(&[
                ("username", username),
                ("password", TEST_PASSWORD),
                ("password_confirm", TEST_PASSWORD),
            ])
            .send()
            .await
            .expect("Sign-up request failed");
        assert!(
            resp.status().is_redirection(),
            "sign-up of {username} failed: {}",
            resp.status()
        );
        resp
    }

    /// Create a list through the form and return its id.
    pub async fn create_list(&self, client: &Client, fields: &[(&str, &str)]) -> i32 {
        let resp = client
            .post(self.url("/lists"))
            .form(fields)
            .send()
            .await
            .expect("Create list request failed");
        let location = location(&resp);
        location
            .strip_prefix("/lists/")
            .and_then(|id| id.parse().ok())
            .unwrap_or_else(|| panic!("unexpected redirect after create: {location}"))
    }

    /// Fetch a list view as JSON.
    pub async fn list_json(&self, client: &Client, list_id: i32) -> serde_json::Value {
        let resp = client
            .get(self.url(&format!("/lists/{list_id}")))
            .send()
            .await
            .expect("List request failed");
        assert_eq!(resp.status(), 200, "list {list_id} not viewable");
        resp.json().await.expect("List body is not JSON")
    }

    /// Files written to the media directory, relative to it.
    #[must_use]
    pub fn media_files(&self) -> Vec<PathBuf> {
        let folder = self.media.path().join(DEFAULT_UPLOAD_FOLDER);
        std::fs::read_dir(&folder)
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|entry| PathBuf::from(DEFAULT_UPLOAD_FOLDER).join(entry.file_name()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(resp: &Response) -> String {
    assert!(
        resp.status().is_redirection(),
        "expected a redirect, got {}",
        resp.status()
    );
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Redirect without Location")
        .to_owned()
}
