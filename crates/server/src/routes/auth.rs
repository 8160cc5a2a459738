//! Sign-up, login and logout handlers.

use axum::{
    Form, Json,
    extract::{Query, State},
    response::Redirect,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use basket_core::access::safe_next_path;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::AuthService;
use crate::state::AppState;

/// Where users land after logging in without a `next` target.
const HOME_PATH: &str = "/";

/// Sign-up form data.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub password_confirm: String,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// Query parameters of the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// What the login page needs to render its form.
#[derive(Debug, Serialize)]
pub struct LoginPage {
    /// Sanitized resume path, echoed back as a hidden field.
    pub next: Option<String>,
}

/// Describe the login form.
pub async fn login_page(Query(query): Query<LoginQuery>) -> Json<LoginPage> {
    Json(LoginPage {
        next: query
            .next
            .as_deref()
            .and_then(safe_next_path)
            .map(str::to_owned),
    })
}

/// Register a user and log them in.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Redirect> {
    let user = AuthService::new(state.store())
        .register(&form.username, &form.password, &form.password_confirm)
        .await?;

    start_session(&session, &user).await?;
    Ok(Redirect::to(HOME_PATH))
}

/// Log a user in, resuming at `next` when it is a same-site path.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect> {
    let user = AuthService::new(state.store())
        .login(&form.username, &form.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Login failed"))?;

    start_session(&session, &user).await?;

    let target = form
        .next
        .as_deref()
        .and_then(safe_next_path)
        .unwrap_or(HOME_PATH);
    Ok(Redirect::to(target))
}

/// Log the current user out.
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/login"))
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, user.username.as_str());
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(())
}
