use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::Router;
use http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use shared_database::InMemoryStore;
use shared_utils::test_utils::TestConfig;
use user_cell::{user_routes, UserCellState};

fn app() -> Router {
    let state = UserCellState::new(Arc::new(InMemoryStore::new()), TestConfig::default().to_arc());
    user_routes(state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn create_user_returns_201_without_password() {
    let response = app()
        .oneshot(json_request(
            "POST",
            "/",
            json!({
                "email": "ann@example.com",
                "password": "long-enough",
                "firstname": "Ann",
                "lastname": "Nowak"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["email"], "ann@example.com");
    assert_eq!(body["roles"], json!(["USER"]));
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn invalid_payload_reports_field_errors() {
    let response = app()
        .oneshot(json_request(
            "POST",
            "/",
            json!({
                "email": "not-an-email",
                "password": "short",
                "firstname": "",
                "lastname": "Nowak",
                "phone": "abc"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Validation Failed");
    assert_eq!(body["message"], "Invalid input data");
    assert_eq!(body["fieldErrors"]["email"], "Email should be valid");
    assert_eq!(body["fieldErrors"]["password"], "Password must be at least 8 characters long");
    assert_eq!(body["fieldErrors"]["firstname"], "First name cannot be blank");
    assert_eq!(body["fieldErrors"]["phone"], "Phone number should be valid");
}

#[tokio::test]
async fn unknown_user_is_404_with_error_body() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri(format!("/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "Not Found");
    assert!(body["message"].as_str().unwrap().starts_with("User not found with id"));
    assert!(body["timestamp"].is_string());
}
