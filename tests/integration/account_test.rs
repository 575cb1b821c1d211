//! Integration tests for email change, profile updates, and account deletion.

use axum::http::StatusCode;
use serde_json::json;

use standup_core::config::RefreshPolicy;

use crate::helpers::{Carrier, PASSWORD, POLICIES, TestApp};

#[tokio::test]
async fn test_change_email_round_trip() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    let (_, handle) = app.sign_up_and_in("ada@example.com").await;

    let response = app
        .call(
            "auth.changeEmail",
            json!({ "newEmail": "Ada@Lovelace.dev" }),
            Carrier::Bearer(&handle),
        )
        .await;
    assert!(response.success().is_null());

    let me = app.call("user.me", json!(null), Carrier::Bearer(&handle)).await;
    assert_eq!(me.success()["email"], "ada@example.com");

    app.outbox.wait_for("ada@lovelace.dev", 1).await;
    let token = app.outbox.last_token("ada@lovelace.dev").await;
    let confirmed = app
        .call("auth.confirmEmailChange", json!({ "token": token }), Carrier::None)
        .await;
    let user = confirmed.success();
    assert_eq!(user["email"], "ada@lovelace.dev");
    assert_eq!(user["emailVerified"], true);

    let reused = app
        .call("auth.confirmEmailChange", json!({ "token": token }), Carrier::None)
        .await;
    assert_eq!(reused.failure_kind(), "TokenInvalid");

    app.call(
        "auth.signIn",
        json!({ "email": "ada@lovelace.dev", "password": PASSWORD }),
        Carrier::None,
    )
    .await
    .success();
}

#[tokio::test]
async fn test_change_email_does_not_reveal_taken_address() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    let (_, handle) = app.sign_up_and_in("ada@example.com").await;
    app.sign_up_and_in("bob@example.com").await;

    let taken = app
        .call(
            "auth.changeEmail",
            json!({ "newEmail": "bob@example.com" }),
            Carrier::Bearer(&handle),
        )
        .await;
    let free = app
        .call(
            "auth.changeEmail",
            json!({ "newEmail": "carol@example.com" }),
            Carrier::Bearer(&handle),
        )
        .await;
    assert_eq!(taken.status, StatusCode::OK);
    assert_eq!(taken.status, free.status);
    assert_eq!(taken.body, free.body);
    app.outbox.wait_for("carol@example.com", 1).await;

    let response = app
        .call(
            "auth.changeEmail",
            json!({ "newEmail": "ada@example.com" }),
            Carrier::Bearer(&handle),
        )
        .await;
    assert_eq!(response.failure_kind(), "InvalidInput");
    assert_eq!(app.outbox.count_to("bob@example.com").await, 1);
}

#[tokio::test]
async fn test_change_email_requires_session() {
    let app = TestApp::new(RefreshPolicy::Fixed);
    let response = app
        .call(
            "auth.changeEmail",
            json!({ "newEmail": "ada@example.com" }),
            Carrier::None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.failure_kind(), "Unauthorized");
}

#[tokio::test]
async fn test_update_profile() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    let (_, handle) = app.sign_up_and_in("ada@example.com").await;

    let response = app
        .call(
            "user.updateProfile",
            json!({ "name": "Ada Lovelace" }),
            Carrier::Bearer(&handle),
        )
        .await;
    assert_eq!(response.success()["name"], "Ada Lovelace");

    let too_long = "x".repeat(101);
    let response = app
        .call(
            "user.updateProfile",
            json!({ "name": too_long }),
            Carrier::Bearer(&handle),
        )
        .await;
    assert_eq!(response.failure_kind(), "InvalidInput");

    let me = app.call("user.me", json!(null), Carrier::Bearer(&handle)).await;
    assert_eq!(me.success()["name"], "Ada Lovelace");
}

#[tokio::test]
async fn test_account_deletion() {
    for policy in POLICIES {
        let app = TestApp::new(policy);
        let (user_id, handle) = app.sign_up_and_in("ada@example.com").await;

        let response = app
            .call("auth.deleteAccount", json!(null), Carrier::Cookie(&handle))
            .await;
        assert_eq!(response.success()["mailSent"], true);

        // nothing happens until the link is followed
        app.call("user.me", json!(null), Carrier::Cookie(&handle))
            .await
            .success();

        let token = app.outbox.last_token("ada@example.com").await;
        let confirmed = app
            .call(
                "auth.confirmAccountDeletion",
                json!({ "token": token }),
                Carrier::Cookie(&handle),
            )
            .await;
        assert_eq!(
            confirmed.success()["userId"],
            serde_json::to_value(user_id).unwrap()
        );
        assert!(confirmed.set_cookie.as_deref().unwrap().contains("Max-Age=0"));

        let response = app.call("user.me", json!(null), Carrier::Cookie(&handle)).await;
        assert_eq!(response.failure_kind(), "Unauthorized");

        let response = app
            .call(
                "auth.signIn",
                json!({ "email": "ada@example.com", "password": PASSWORD }),
                Carrier::None,
            )
            .await;
        assert_eq!(response.failure_kind(), "InvalidCredentials");

        let deleted = app.store.user_including_deleted(user_id).await.unwrap();
        assert!(deleted.deleted_at.is_some());

        // the address is free again
        app.sign_up_and_in("ada@example.com").await;
    }
}
