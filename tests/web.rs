//! The HTTP conventions: bearer auth yields 401, malformed bodies yield 422,
//! and business failures ride a 200 envelope with `success: false`.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use sportmeet::web::{self, AppState};

async fn test_app() -> Router {
    let pool = common::test_pool().await;
    web::router(AppState {
        pool,
        jwt_secret: common::TEST_SECRET.to_string(),
    })
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn register_body(username: &str) -> Value {
    json!({
        "username": username,
        "password": "correct-horse",
        "email": format!("{username}@example.com"),
    })
}

#[tokio::test]
async fn register_login_and_profile_flow() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/users/register", register_body("anna")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["username"], json!("anna"));
    assert!(body["data"]["passwordHash"].is_null());

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/login",
            json!({"username": "anna", "password": "correct-horse"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get_with_token("/api/users/profile", &token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], json!("anna"));
}

#[tokio::test]
async fn failed_login_is_a_business_failure_not_a_transport_error() {
    let app = test_app().await;
    app.clone()
        .oneshot(post_json("/api/users/register", register_body("anna")))
        .await
        .unwrap();

    let response = app
        .oneshot(post_json(
            "/api/users/login",
            json!({"username": "anna", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn protected_routes_reject_missing_and_bad_tokens() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/users/profile")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));

    let response = app
        .oneshot(get_with_token("/api/users/profile", "not.a.token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_body_yields_422_envelope() {
    let app = test_app().await;

    // password has the wrong type, so body deserialization fails.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/register",
            json!({"username": "anna", "password": 42, "email": "anna@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn business_failures_keep_http_200() {
    let app = test_app().await;

    app.clone()
        .oneshot(post_json("/api/users/register", register_body("anna")))
        .await
        .unwrap();
    let login = app
        .clone()
        .oneshot(post_json(
            "/api/users/login",
            json!({"username": "anna", "password": "correct-horse"}),
        ))
        .await
        .unwrap();
    let token = body_json(login).await["data"]["token"]
        .as_str()
        .unwrap()
        .to_string();

    // Joining a nonexistent activity is a business failure: 200, success false.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/registrations")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from(
                    json!({"activityId": "no-such-activity"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn public_activity_listing_needs_no_token() {
    let app = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/activities?page=1&limit=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["total"], json!(0));
}
