//! Router tests for auth and validation paths.
//!
//! The pool points at a closed port and is never connected: every request
//! here must be answered before a connection is checked out.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use chrono::Duration;
use jobly_server::auth::JwtKeys;
use jobly_server::{AppState, router};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &[u8] = b"secret-dev";

fn keys() -> JwtKeys {
    JwtKeys::new(SECRET, Duration::hours(1))
}

fn app() -> Router {
    let pool = jobly::create_pool_with_config("postgres://jobly@127.0.0.1:1/jobly", 1).unwrap();
    router(AppState::new(pool, keys()))
}

fn token(username: &str, is_admin: bool) -> String {
    keys().issue(username, is_admin).unwrap()
}

async fn send(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

fn message(body: &Value) -> &str {
    body["error"]["message"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn health_is_public() {
    let (status, body) = send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn unknown_route_is_404_with_error_body() {
    let (status, body) = send(Method::GET, "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["status"], 404);
}

#[tokio::test]
async fn listing_users_requires_a_token() {
    let (status, body) = send(Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["status"], 401);
    assert_eq!(message(&body), "Unauthorized");
}

#[tokio::test]
async fn invalid_token_is_anonymous() {
    let (status, _) = send(Method::GET, "/users", Some("not.a.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let forged = JwtKeys::new(b"other", Duration::hours(1))
        .issue("admin", true)
        .unwrap();
    let (status, _) = send(Method::GET, "/users", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_users_requires_admin() {
    let user = token("u1", false);
    let (status, _) = send(Method::GET, "/users", Some(&user), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn company_search_rejects_inverted_range() {
    let (status, body) = send(
        Method::GET,
        "/companies?minEmployees=10&maxEmployees=5",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        message(&body),
        "minEmployees cannot be greater than maxEmployees"
    );
}

#[tokio::test]
async fn company_search_rejects_unknown_filter() {
    let (status, body) = send(Method::GET, "/companies?foo=1", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Unknown field: foo");
}

#[tokio::test]
async fn job_search_rejects_negative_salary() {
    let (status, body) = send(Method::GET, "/jobs?minSalary=-5", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message(&body).contains("minSalary"));
}

#[tokio::test]
async fn job_search_rejects_bad_flag() {
    let (status, _) = send(Method::GET, "/jobs?hasEquity=maybe", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_patch_is_rejected() {
    let user = token("u1", false);
    let (status, body) = send(
        Method::PATCH,
        "/companies/c1",
        Some(&user),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "No data");
}

#[tokio::test]
async fn company_handle_is_not_patchable() {
    let user = token("u1", false);
    let (status, body) = send(
        Method::PATCH,
        "/companies/c1",
        Some(&user),
        Some(json!({"handle": "c2"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Unknown field: handle");
}

#[tokio::test]
async fn patching_a_company_requires_login() {
    let (status, _) = send(
        Method::PATCH,
        "/companies/c1",
        None,
        Some(json!({"name": "New"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn creating_a_company_rejects_unknown_fields() {
    let user = token("u1", false);
    let (status, _) = send(
        Method::POST,
        "/companies",
        Some(&user),
        Some(json!({"handle": "c1", "name": "C1", "description": "d", "admin": true})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn creating_a_company_validates_handle() {
    let user = token("u1", false);
    let (status, body) = send(
        Method::POST,
        "/companies",
        Some(&user),
        Some(json!({"handle": "Not A Slug", "name": "C1", "description": "d"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message(&body).starts_with("handle"));
}

#[tokio::test]
async fn job_writes_require_admin() {
    let user = token("u1", false);
    let (status, _) = send(
        Method::PATCH,
        "/jobs/1",
        Some(&user),
        Some(json!({"title": "New"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        Method::POST,
        "/jobs",
        Some(&user),
        Some(json!({"title": "J", "companyHandle": "c1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(Method::DELETE, "/jobs/1", Some(&user), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn job_id_must_be_numeric() {
    let (status, body) = send(Method::GET, "/jobs/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(message(&body), "Invalid job id: abc");
}

#[tokio::test]
async fn admin_job_patch_checks_equity_before_connecting() {
    let admin = token("admin", true);
    let (status, _) = send(
        Method::PATCH,
        "/jobs/1",
        Some(&admin),
        Some(json!({"equity": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn users_cannot_see_each_other() {
    let user = token("u1", false);
    let (status, _) = send(Method::GET, "/users/u2", Some(&user), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(Method::POST, "/users/u2/jobs/1", Some(&user), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(Method::DELETE, "/users/u2/jobs", Some(&user), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn users_cannot_promote_themselves() {
    let user = token("u1", false);
    let (status, _) = send(
        Method::PATCH,
        "/users/u1",
        Some(&user),
        Some(json!({"isAdmin": true})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_patch_validates_email() {
    let user = token("u1", false);
    let (status, body) = send(
        Method::PATCH,
        "/users/u1",
        Some(&user),
        Some(json!({"email": "not-an-email"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(message(&body).starts_with("email"));
}

#[tokio::test]
async fn registration_requires_admin() {
    let user = token("u1", false);
    let (status, _) = send(
        Method::POST,
        "/users",
        Some(&user),
        Some(json!({
            "username": "u2", "firstName": "F", "lastName": "L", "email": "u2@email.com"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn application_path_checks_job_id() {
    let user = token("u1", false);
    let (status, _) = send(Method::POST, "/users/u1/jobs/abc", Some(&user), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn token_refresh_requires_the_same_user() {
    let (status, _) = send(Method::POST, "/users/u1/token", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let other = token("u2", false);
    let (status, _) = send(Method::POST, "/users/u1/token", Some(&other), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = JwtKeys::new(SECRET, Duration::hours(-1))
        .issue("u1", false)
        .unwrap();
    let (status, _) = send(Method::POST, "/users/u1/token", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
