//! Sign-up, login and logout flows.

#![allow(clippy::unwrap_used)]

use basket_integration_tests::{TEST_PASSWORD, TestApp, location};

#[tokio::test]
async fn test_anonymous_dashboard_redirects_to_login() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let resp = client.get(app.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/login?next=%2F");
}

#[tokio::test]
async fn test_anonymous_post_redirects_to_plain_login() {
    let app = TestApp::spawn().await;
    let resp = app
        .client()
        .post(app.url("/lists"))
        .form(&[("name", "Weekly")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/login");
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::spawn().await;
    let resp = app.client().get(app.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_signup_logs_in_and_shows_dashboard() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let resp = app.signup(&client, "alice").await;
    assert_eq!(location(&resp), "/");

    let dashboard: serde_json::Value = client
        .get(app.url("/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dashboard["user"]["username"], "alice");
    assert_eq!(dashboard["lists"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = TestApp::spawn().await;
    app.signup(&app.client(), "alice").await;

    let resp = app
        .client()
        .post(app.url("/signup"))
        .form(&[
            ("username", "alice"),
            ("password", TEST_PASSWORD),
            ("password_confirm", TEST_PASSWORD),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn test_signup_rejects_mismatched_confirmation() {
    let app = TestApp::spawn().await;
    let resp = app
        .client()
        .post(app.url("/signup"))
        .form(&[
            ("username", "alice"),
            ("password", TEST_PASSWORD),
            ("password_confirm", "something else entirely"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_login_resumes_at_safe_next_only() {
    let app = TestApp::spawn().await;
    app.signup(&app.client(), "alice").await;

    let client = app.client();
    let resp = client
        .post(app.url("/login"))
        .form(&[
            ("username", "alice"),
            ("password", TEST_PASSWORD),
            ("next", "/catalogue"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/catalogue");

    let client = app.client();
    let resp = client
        .post(app.url("/login"))
        .form(&[
            ("username", "alice"),
            ("password", TEST_PASSWORD),
            ("next", "//evil.example/steal"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&resp), "/");
}

#[tokio::test]
async fn test_login_with_wrong_password_is_rejected() {
    let app = TestApp::spawn().await;
    app.signup(&app.client(), "alice").await;

    let client = app.client();
    let resp = client
        .post(app.url("/login"))
        .form(&[("username", "alice"), ("password", "not the password")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client.get(app.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), 303);
}

#[tokio::test]
async fn test_login_page_drops_unsafe_next() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let page: serde_json::Value = client
        .get(app.url("/login?next=%2Flists%2F3"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["next"], "/lists/3");

    let page: serde_json::Value = client
        .get(app.url("/login?next=https%3A%2F%2Fevil.example"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(page["next"].is_null());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::spawn().await;
    let client = app.client();
    app.signup(&client, "alice").await;

    let resp = client.post(app.url("/logout")).send().await.unwrap();
    assert_eq!(location(&resp), "/login");

    let resp = client.get(app.url("/")).send().await.unwrap();
    assert_eq!(resp.status(), 303);
}
