//! Integration tests for the RPC transport and authorization pipeline.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use standup_core::config::RefreshPolicy;

use crate::helpers::{Carrier, PASSWORD, TestApp};

#[tokio::test]
async fn test_capabilities_end_to_end() {
    let app = TestApp::new(RefreshPolicy::Sliding);

    let hello = app.call("hello", json!(null), Carrier::None).await;
    assert_eq!(hello.success(), "Hello world");

    let me = app.call("user.me", json!(null), Carrier::None).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert_eq!(me.failure_kind(), "Unauthorized");

    let (user_id, handle) = app.sign_up_and_in("ada@example.com").await;

    let me = app.call("user.me", json!(null), Carrier::Bearer(&handle)).await;
    assert_eq!(me.success()["email"], "ada@example.com");

    let admin = app
        .call(
            "admin.getUser",
            json!({ "userId": user_id }),
            Carrier::Bearer(&handle),
        )
        .await;
    assert_eq!(admin.status, StatusCode::FORBIDDEN);
    assert_eq!(admin.failure_kind(), "Forbidden");

    app.promote(user_id).await;

    let admin = app
        .call(
            "admin.getUser",
            json!({ "userId": user_id }),
            Carrier::Bearer(&handle),
        )
        .await;
    assert_eq!(admin.success()["role"], "admin");
}

#[tokio::test]
async fn test_admin_revokes_user_sessions() {
    let app = TestApp::new(RefreshPolicy::Fixed);
    let (admin_id, admin) = app.sign_up_and_in("root@example.com").await;
    app.promote(admin_id).await;
    let (user_id, handle) = app.sign_up_and_in("ada@example.com").await;

    let response = app
        .call(
            "admin.revokeUserSessions",
            json!({ "userId": user_id }),
            Carrier::Bearer(&admin),
        )
        .await;
    assert_eq!(response.success()["revoked"], 1);

    let me = app.call("user.me", json!(null), Carrier::Bearer(&handle)).await;
    assert_eq!(me.failure_kind(), "Unauthorized");
    app.call("user.me", json!(null), Carrier::Bearer(&admin))
        .await
        .success();
}

#[tokio::test]
async fn test_unknown_procedure() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    let response = app.call("auth.nope", json!(null), Carrier::None).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.failure_kind(), "InvalidInput");
}

#[tokio::test]
async fn test_malformed_json() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    let request = Request::builder()
        .method("POST")
        .uri("/api/rpc/auth.signIn")
        .header("content-type", "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.failure_kind(), "InvalidInput");
}

#[tokio::test]
async fn test_input_checked_before_handler() {
    let app = TestApp::new(RefreshPolicy::Sliding);

    let response = app
        .call("auth.signIn", json!({ "email": "ada@example.com" }), Carrier::None)
        .await;
    assert_eq!(response.failure_kind(), "InvalidInput");

    // authorization runs before decoding
    let response = app
        .call("admin.getUser", json!({ "userId": "not-a-uuid" }), Carrier::None)
        .await;
    assert_eq!(response.failure_kind(), "Unauthorized");
}

#[tokio::test]
async fn test_get_with_query_input() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    let (user_id, handle) = app.sign_up_and_in("ada@example.com").await;
    app.promote(user_id).await;

    let request = Request::builder()
        .method("GET")
        .uri("/api/rpc/hello")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.send(request).await.success(), "Hello world");

    let input = format!("%7B%22userId%22%3A%22{user_id}%22%7D");
    let request = Request::builder()
        .method("GET")
        .uri(format!("/api/rpc/admin.getUser?input={input}"))
        .header("authorization", format!("Bearer {handle}"))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.success()["email"], "ada@example.com");
}

#[tokio::test]
async fn test_failure_message_is_public() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    app.sign_up_and_in("ada@example.com").await;

    let response = app
        .call(
            "auth.signIn",
            json!({ "email": "ada@example.com", "password": "not the password" }),
            Carrier::None,
        )
        .await;
    assert_eq!(
        response.body,
        json!({
            "failure": {
                "kind": "InvalidCredentials",
                "message": "Invalid email or password"
            }
        })
    );
    assert!(response.set_cookie.is_none());

    let ok = app
        .call(
            "auth.signIn",
            json!({ "email": "ada@example.com", "password": PASSWORD }),
            Carrier::None,
        )
        .await;
    assert!(ok.body.get("failure").is_none());
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}
