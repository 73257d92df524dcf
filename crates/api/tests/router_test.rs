//! Router-level tests that never reach the database.
//!
//! Every request here is rejected (or answered) before a repository is
//! touched, so the state carries a disconnected database handle.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::AUTHORIZATION, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use armas_api::{AppState, create_router};
use armas_core::access::RoleName;
use armas_core::storage::{StorageConfig, StorageService};
use armas_shared::{FeatureFlags, JwtConfig, JwtService};

const SECRET: &str = "router-test-secret";

fn state_with(features: FeatureFlags) -> AppState {
    let root = std::env::temp_dir().join(format!("armas-api-test-{}", Uuid::new_v4()));
    let storage = StorageService::from_config(StorageConfig::new(root)).expect("storage");
    AppState {
        db: Arc::new(DatabaseConnection::Disconnected),
        jwt_service: Arc::new(JwtService::new(JwtConfig {
            secret: SECRET.to_string(),
            access_token_expires_secs: 900,
        })),
        storage: Arc::new(storage),
        features,
        refresh_authorities: false,
    }
}

fn app() -> (Router, AppState) {
    let state = state_with(FeatureFlags::default());
    (create_router(state.clone(), Duration::from_secs(5)), state)
}

fn token_for(state: &AppState, roles: &[RoleName]) -> String {
    let authorities = roles.iter().map(RoleName::authority).collect();
    state
        .jwt_service
        .generate_access_token(Uuid::new_v4(), "tester", None, authorities)
        .expect("should generate token")
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = app();

    let response = app.oneshot(get("/api/v1/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "armas");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let (app, _) = app();

    let response = app.oneshot(get("/api/v1/users/me", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let (app, _) = app();

    let response = app
        .oneshot(get("/api/v1/transactions/assigned", Some("not-a-jwt")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let (app, _) = app();
    let foreign = JwtService::new(JwtConfig {
        secret: "someone-else".to_string(),
        access_token_expires_secs: 900,
    })
    .generate_access_token(
        Uuid::new_v4(),
        "mallory",
        None,
        vec![RoleName::Admin.authority()],
    )
    .unwrap();

    let response = app
        .oneshot(get("/api/v1/users", Some(&foreign)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_with_blank_credentials_is_unauthorized() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request("POST", "/api/v1/login", None, "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid username or password");
}

#[tokio::test]
async fn test_login_with_whitespace_password_is_unauthorized() {
    let (app, _) = app();
    let body = r#"{"username":"carol","password":"   "}"#;

    let response = app
        .oneshot(json_request("POST", "/api/v1/login", None, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid username or password");
}

#[tokio::test]
async fn test_logout_acknowledges() {
    let (app, _) = app();

    let response = app
        .oneshot(json_request("POST", "/api/v1/logout", None, ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_refuses_literal_admin_password() {
    let (app, _) = app();
    let body = r#"{"username":"newbie","password":"Admin","full_name":"New User"}"#;

    let response = app
        .oneshot(json_request("POST", "/api/v1/users", None, body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_with_invalid_token_is_unauthorized() {
    let (app, _) = app();
    let body = r#"{"username":"newbie","password":"s3cret-pass","full_name":"New User"}"#;

    let response = app
        .oneshot(json_request("POST", "/api/v1/users", Some("broken"), body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_cannot_list_accounts() {
    let (app, state) = app();
    let token = token_for(&state, &[RoleName::User]);

    let response = app
        .oneshot(get("/api/v1/users", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn test_assign_requires_archiver() {
    let (app, state) = app();
    let token = token_for(&state, &[RoleName::User, RoleName::SeniorAuditor]);
    let uri = format!("/api/v1/transactions/assign/{}", Uuid::new_v4());
    let body = format!(r#"{{"assigned_to":"{}"}}"#, Uuid::new_v4());

    let response = app
        .oneshot(json_request("PUT", &uri, Some(&token), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_approve_requires_approver() {
    let (app, state) = app();
    let token = token_for(&state, &[RoleName::Archiver]);
    let uri = format!("/api/v1/transactions/approve/{}", Uuid::new_v4());

    let response = app
        .oneshot(json_request("PUT", &uri, Some(&token), "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_transaction_requires_admin() {
    let (app, state) = app();
    let token = token_for(&state, &[RoleName::Archiver]);
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/v1/transactions/{}", Uuid::new_v4()))
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_status_filter_rejects_unknown_status() {
    let (app, state) = app();
    let token = token_for(&state, &[RoleName::Archiver]);

    let response = app
        .oneshot(get("/api/v1/transactions?status=ASSIGNED,BOGUS", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_plain_user_cannot_list_all_transactions() {
    let (app, state) = app();
    let token = token_for(&state, &[RoleName::User]);

    let response = app
        .oneshot(get("/api/v1/transactions", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_disabled_toggle_is_not_found() {
    let state = state_with(FeatureFlags {
        user_privilege_overrides: false,
        role_privilege_toggle: false,
    });
    let app = create_router(state.clone(), Duration::from_secs(5));
    let token = token_for(&state, &[RoleName::Admin]);
    let uri = format!(
        "/api/v1/roles/{}/privileges/{}",
        Uuid::new_v4(),
        Uuid::new_v4()
    );

    let response = app
        .clone()
        .oneshot(json_request("PATCH", &uri, Some(&token), r#"{"active":false}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let uri = format!("/api/v1/users/{}/privileges", Uuid::new_v4());
    let response = app
        .oneshot(json_request(
            "POST",
            &uri,
            Some(&token),
            r#"{"privilege_ids":[]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
