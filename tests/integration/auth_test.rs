//! Integration tests for sign-up, verification, sign-in, and password flows.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;

use standup_core::config::RefreshPolicy;
use standup_entity::token::TokenPurpose;

use crate::helpers::{Carrier, PASSWORD, POLICIES, TestApp};

#[tokio::test]
async fn test_sign_up_creates_one_user_and_one_token() {
    let app = TestApp::new(RefreshPolicy::Sliding);

    let response = app
        .call(
            "auth.signUp",
            json!({ "email": "Ada@Example.COM", "password": PASSWORD, "name": "Ada" }),
            Carrier::None,
        )
        .await;
    let body = response.success();
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert_eq!(body["user"]["emailVerified"], false);
    assert_eq!(body["user"]["role"], "standard");
    assert_eq!(body["verificationSent"], true);

    let user_id = serde_json::from_value(body["user"]["id"].clone()).unwrap();
    assert_eq!(app.store.user_count().await, 1);
    assert_eq!(
        app.state
            .tokens
            .active_count(user_id, TokenPurpose::VerifyEmail)
            .await
            .unwrap(),
        1
    );
    assert_eq!(app.outbox.count_to("ada@example.com").await, 1);
}

#[tokio::test]
async fn test_duplicate_email_creates_nothing() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    app.call(
        "auth.signUp",
        json!({ "email": "ada@example.com", "password": PASSWORD }),
        Carrier::None,
    )
    .await
    .success();

    let response = app
        .call(
            "auth.signUp",
            json!({ "email": "ADA@example.com", "password": "another passphrase" }),
            Carrier::None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.failure_kind(), "EmailAlreadyRegistered");
    assert_eq!(app.store.user_count().await, 1);
    assert_eq!(app.outbox.count().await, 1);
}

#[tokio::test]
async fn test_sign_up_rejects_bad_input() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    for input in [
        json!({ "email": "not-an-email", "password": PASSWORD }),
        json!({ "email": "ada@example.com", "password": "short" }),
        json!({ "email": "ada@example.com" }),
    ] {
        let response = app.call("auth.signUp", input, Carrier::None).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.failure_kind(), "InvalidInput");
    }
    assert_eq!(app.store.user_count().await, 0);
}

#[tokio::test]
async fn test_sign_up_survives_undeliverable_mail() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    let response = app
        .call(
            "auth.signUp",
            json!({ "email": "ada@bounce.test", "password": PASSWORD }),
            Carrier::None,
        )
        .await;
    assert_eq!(response.success()["verificationSent"], false);
    assert_eq!(app.store.user_count().await, 1);
}

#[tokio::test]
async fn test_concurrent_verification_redeems_once() {
    let app = Arc::new(TestApp::new(RefreshPolicy::Sliding));
    app.call(
        "auth.signUp",
        json!({ "email": "ada@example.com", "password": PASSWORD }),
        Carrier::None,
    )
    .await
    .success();
    let token = app.outbox.last_token("ada@example.com").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = Arc::clone(&app);
        let token = token.clone();
        handles.push(tokio::spawn(async move {
            app.call("auth.verifyEmail", json!({ "token": token }), Carrier::None)
                .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        let response = handle.await.unwrap();
        if response.status == StatusCode::OK {
            succeeded += 1;
            assert_eq!(response.body["success"]["emailVerified"], true);
        } else {
            assert_eq!(response.failure_kind(), "TokenInvalid");
        }
    }
    assert_eq!(succeeded, 1);
}

#[tokio::test]
async fn test_resend_invalidates_first_token() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    app.call(
        "auth.signUp",
        json!({ "email": "ada@example.com", "password": PASSWORD }),
        Carrier::None,
    )
    .await
    .success();
    let first = app.outbox.last_token("ada@example.com").await;

    app.call(
        "auth.sendVerificationEmail",
        json!({ "email": "ada@example.com" }),
        Carrier::None,
    )
    .await
    .success();
    app.outbox.wait_for("ada@example.com", 2).await;
    let second = app.outbox.last_token("ada@example.com").await;

    let response = app
        .call("auth.verifyEmail", json!({ "token": first }), Carrier::None)
        .await;
    assert_eq!(response.failure_kind(), "TokenInvalid");

    let response = app
        .call("auth.verifyEmail", json!({ "token": second }), Carrier::None)
        .await;
    assert_eq!(response.success()["emailVerified"], true);
}

#[tokio::test]
async fn test_resend_does_not_reveal_accounts() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    let unknown = app
        .call(
            "auth.sendVerificationEmail",
            json!({ "email": "nobody@example.com" }),
            Carrier::None,
        )
        .await;
    let malformed = app
        .call(
            "auth.sendVerificationEmail",
            json!({ "email": "nope" }),
            Carrier::None,
        )
        .await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(unknown.body, malformed.body);
    assert_eq!(app.outbox.count().await, 0);
}

#[tokio::test]
async fn test_sign_in_failure_is_uniform() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    app.call(
        "auth.signUp",
        json!({ "email": "ada@example.com", "password": PASSWORD }),
        Carrier::None,
    )
    .await
    .success();

    let wrong = app
        .call(
            "auth.signIn",
            json!({ "email": "ada@example.com", "password": "wrong passphrase" }),
            Carrier::None,
        )
        .await;
    let unknown = app
        .call(
            "auth.signIn",
            json!({ "email": "nobody@example.com", "password": PASSWORD }),
            Carrier::None,
        )
        .await;

    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.failure_kind(), "InvalidCredentials");
    assert_eq!(wrong.status, unknown.status);
    assert_eq!(wrong.body, unknown.body);
}

#[tokio::test]
async fn test_reset_request_is_indistinguishable() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    app.sign_up_and_in("ada@example.com").await;

    let known = app
        .call(
            "auth.requestPasswordReset",
            json!({ "email": "ada@example.com" }),
            Carrier::None,
        )
        .await;
    let unknown = app
        .call(
            "auth.requestPasswordReset",
            json!({ "email": "nobody@example.com" }),
            Carrier::None,
        )
        .await;
    let malformed = app
        .call(
            "auth.requestPasswordReset",
            json!({ "email": "@@" }),
            Carrier::None,
        )
        .await;

    assert_eq!(known.status, unknown.status);
    assert_eq!(known.body, unknown.body);
    assert_eq!(known.set_cookie, unknown.set_cookie);
    assert_eq!(known.body, malformed.body);
    assert_eq!(app.outbox.count_to("nobody@example.com").await, 0);
}

#[tokio::test]
async fn test_reset_revokes_all_sessions() {
    for policy in POLICIES {
        let app = TestApp::new(policy);
        let (_, first) = app.sign_up_and_in("ada@example.com").await;
        let second = app
            .call(
                "auth.signIn",
                json!({ "email": "ada@example.com", "password": PASSWORD }),
                Carrier::None,
            )
            .await
            .success()["token"]
            .as_str()
            .unwrap()
            .to_string();

        app.call(
            "auth.requestPasswordReset",
            json!({ "email": "ada@example.com" }),
            Carrier::None,
        )
        .await
        .success();
        app.outbox.wait_for("ada@example.com", 2).await;
        let token = app.outbox.last_token("ada@example.com").await;

        app.call(
            "auth.resetPassword",
            json!({ "token": token, "newPassword": "a fresh passphrase" }),
            Carrier::None,
        )
        .await
        .success();

        for handle in [&first, &second] {
            let response = app.call("user.me", json!(null), Carrier::Bearer(handle)).await;
            assert_eq!(response.failure_kind(), "Unauthorized");
        }

        let reused = app
            .call(
                "auth.resetPassword",
                json!({ "token": token, "newPassword": "yet another one" }),
                Carrier::None,
            )
            .await;
        assert_eq!(reused.failure_kind(), "TokenInvalid");

        app.call(
            "auth.signIn",
            json!({ "email": "ada@example.com", "password": "a fresh passphrase" }),
            Carrier::None,
        )
        .await
        .success();
    }
}

#[tokio::test]
async fn test_change_password_keeps_calling_session() {
    for policy in POLICIES {
        let app = TestApp::new(policy);
        let (_, current) = app.sign_up_and_in("ada@example.com").await;
        let other = app
            .call(
                "auth.signIn",
                json!({ "email": "ada@example.com", "password": PASSWORD }),
                Carrier::None,
            )
            .await
            .success()["token"]
            .as_str()
            .unwrap()
            .to_string();

        let wrong = app
            .call(
                "auth.changePassword",
                json!({ "currentPassword": "not it", "newPassword": "next passphrase" }),
                Carrier::Bearer(&current),
            )
            .await;
        assert_eq!(wrong.failure_kind(), "InvalidCredentials");

        app.call(
            "auth.changePassword",
            json!({ "currentPassword": PASSWORD, "newPassword": "next passphrase" }),
            Carrier::Bearer(&current),
        )
        .await
        .success();

        app.call("user.me", json!(null), Carrier::Bearer(&current))
            .await
            .success();
        let response = app.call("user.me", json!(null), Carrier::Bearer(&other)).await;
        assert_eq!(response.failure_kind(), "Unauthorized");
    }
}
