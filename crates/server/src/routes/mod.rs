//! HTTP route handlers.
//!
//! GET views answer JSON documents; form posts answer redirects.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                   - Liveness
//! GET  /health/ready             - Readiness (store ping)
//!
//! # Auth
//! GET  /login                    - Login form data (sanitized `next`)
//! POST /login                    - Login action
//! POST /signup                   - Sign-up action
//! POST /logout                   - Logout action
//!
//! # Lists (requires auth)
//! GET  /                         - Dashboard
//! GET  /catalogue                - Catalogue
//! POST /lists                    - Create list
//! GET  /lists/{list_id}          - List with items and totals
//! POST /lists/{list_id}/edit     - Rename and replace items (owner)
//! POST /lists/{list_id}/delete   - Delete list (owner)
//! POST /lists/{list_id}/items    - Add free-form item (multipart)
//! POST /lists/{list_id}/share    - Issue share link (owner)
//! POST /items/{item_id}/edit     - Edit item (multipart)
//! POST /items/{item_id}/delete   - Delete item
//!
//! # Sharing
//! GET  /share/{token}            - Redeem share link
//!
//! # Media
//! GET  /media/*                  - Uploaded images (local blob backend)
//! ```

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod items;
pub mod lists;
pub mod share;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionStore;
use tracing::Span;

use crate::config::BlobConfig;
use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/logout", post(auth::logout))
}

/// Create the list routes router.
pub fn list_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(lists::create))
        .route("/{list_id}", get(lists::show))
        .route("/{list_id}/edit", post(lists::edit))
        .route("/{list_id}/delete", post(lists::delete))
        .route("/{list_id}/items", post(items::add))
        .route("/{list_id}/share", post(lists::share))
}

/// Create the item routes router.
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/{item_id}/edit", post(items::edit))
        .route("/{item_id}/delete", post(items::delete))
}

/// Create all application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/", get(dashboard::dashboard))
        .route("/catalogue", get(dashboard::catalogue))
        .route("/share/{token}", get(share::redeem))
        .merge(auth_routes())
        .nest("/lists", list_routes())
        .nest("/items", item_routes())
}

/// Build the complete application over a session store.
///
/// Sentry layers are added by the binary; everything else (sessions, body
/// limits, media files, request ids, tracing) is wired here so tests run the
/// same stack.
pub fn app<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let config = state.config();
    let max_upload_bytes = config.max_upload_bytes;

    let mut router = routes()
        .layer(create_session_layer(session_store, config))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(max_upload_bytes));

    if let BlobConfig::Local { media_dir, .. } = &config.blob {
        router = router.nest_service("/media", ServeDir::new(media_dir));
    }

    router
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
