use axum::http::{HeaderName, HeaderValue, StatusCode, header::AUTHORIZATION};
use axum_test::TestServer;
use sea_orm::DatabaseConnection;
use serde_json::Value;

use clinic::router::build_router;
use clinic::state::AppState;
use clinic_core::middleware::X_REQUEST_ID;

fn server() -> TestServer {
    let state = AppState {
        db: DatabaseConnection::Disconnected,
        bcrypt_cost: 4,
    };
    TestServer::new(build_router(state)).unwrap()
}

#[tokio::test]
async fn should_report_liveness() {
    let response = server().get("/healthz").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn should_report_not_ready_without_database() {
    let response = server().get("/readyz").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn should_reject_requests_without_credentials() {
    let server = server();
    for path in ["/users/", "/patients/", "/", "/patients/1/", "/3/"] {
        let response = server.get(path).await;
        assert_eq!(
            response.status_code(),
            StatusCode::UNAUTHORIZED,
            "path {path}"
        );
        let body: Value = response.json();
        assert_eq!(body["kind"], "UNAUTHENTICATED");
    }
}

#[tokio::test]
async fn should_reject_unsupported_authorization_scheme() {
    let response = server()
        .get("/patients/")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_reject_malformed_token_before_lookup() {
    let response = server()
        .get("/users/")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer not-a-key"))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["kind"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn should_attach_request_id_to_responses() {
    let response = server().get("/healthz").await;
    assert!(response.headers().contains_key(X_REQUEST_ID));
}

#[tokio::test]
async fn should_echo_client_request_id() {
    let response = server()
        .get("/healthz")
        .add_header(
            HeaderName::from_static(X_REQUEST_ID),
            HeaderValue::from_static("req-42"),
        )
        .await;
    assert_eq!(response.headers()[X_REQUEST_ID], "req-42");
}
