//! Integration tests for session carriers, expiry, and refresh.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use standup_core::config::RefreshPolicy;
use standup_core::error::ErrorKind;
use standup_entity::session::SessionMetadata;

use crate::helpers::{Carrier, PASSWORD, POLICIES, TTL_SECONDS, TestApp, WINDOW_SECONDS};

fn cookie_value(set_cookie: &str) -> &str {
    let pair = set_cookie.split(';').next().unwrap();
    pair.split_once('=').unwrap().1
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    for policy in POLICIES {
        let app = TestApp::new(policy);
        let (user_id, _) = app.sign_up_and_in("ada@example.com").await;

        let issued = app
            .state
            .sessions
            .create_at(
                user_id,
                SessionMetadata::default(),
                Utc::now() - Duration::seconds(TTL_SECONDS + 1),
            )
            .await
            .unwrap();

        let err = app.state.sessions.validate(&issued.handle).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::SessionExpired);

        for carrier in [Carrier::Bearer(&issued.handle), Carrier::Cookie(&issued.handle)] {
            let response = app.call("user.me", json!(null), carrier).await;
            assert_eq!(response.status, StatusCode::UNAUTHORIZED);
            assert_eq!(response.failure_kind(), "Unauthorized");

            let response = app.call("auth.getSession", json!(null), carrier).await;
            assert!(response.success().is_null());
        }
    }
}

#[tokio::test]
async fn test_unknown_handle_is_anonymous() {
    let app = TestApp::new(RefreshPolicy::Sliding);

    let err = app.state.sessions.validate("no-such-handle").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::SessionInvalid);

    let response = app.call("hello", json!(null), Carrier::Bearer("no-such-handle")).await;
    assert_eq!(response.success(), "Hello world");
}

#[tokio::test]
async fn test_sign_in_sets_session_cookie() {
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
            "auth.signIn",
            json!({ "email": "ada@example.com", "password": PASSWORD }),
            Carrier::None,
        )
        .await;
    let token = response.success()["token"].as_str().unwrap().to_string();
    let cookie = response.set_cookie.as_deref().expect("session cookie");

    assert!(cookie.starts_with("standup_session="));
    assert_eq!(cookie_value(cookie), token);
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(!cookie.contains("Secure"));

    let max_age: i64 = cookie
        .split("; ")
        .find_map(|attr| attr.strip_prefix("Max-Age="))
        .unwrap()
        .parse()
        .unwrap();
    assert!(max_age > TTL_SECONDS - 5 && max_age <= TTL_SECONDS);
}

#[tokio::test]
async fn test_cookie_carrier_and_sign_out() {
    for policy in POLICIES {
        let app = TestApp::new(policy);
        let (_, handle) = app.sign_up_and_in("ada@example.com").await;

        let me = app.call("user.me", json!(null), Carrier::Cookie(&handle)).await;
        assert_eq!(me.success()["email"], "ada@example.com");
        assert!(me.set_cookie.is_none());

        let session = app
            .call("auth.getSession", json!(null), Carrier::Cookie(&handle))
            .await;
        assert_eq!(session.success()["user"]["email"], "ada@example.com");

        let signed_out = app
            .call("auth.signOut", json!(null), Carrier::Cookie(&handle))
            .await;
        signed_out.success();
        let cleared = signed_out.set_cookie.as_deref().expect("cleared cookie");
        assert!(cleared.starts_with("standup_session=;"));
        assert!(cleared.contains("Max-Age=0"));

        let response = app.call("user.me", json!(null), Carrier::Cookie(&handle)).await;
        assert_eq!(response.failure_kind(), "Unauthorized");
        let err = app.state.sessions.validate(&handle).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::SessionInvalid);
    }
}

#[tokio::test]
async fn test_bearer_takes_precedence_over_cookie() {
    let app = TestApp::new(RefreshPolicy::Sliding);
    let (_, ada) = app.sign_up_and_in("ada@example.com").await;
    let (_, bob) = app.sign_up_and_in("bob@example.com").await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/rpc/user.me")
        .header("authorization", format!("Bearer {bob}"))
        .header("cookie", format!("standup_session={ada}"))
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.success()["email"], "bob@example.com");
}

#[tokio::test]
async fn test_sliding_refresh_resets_cookie() {
    for policy in POLICIES {
        let app = TestApp::new(policy);
        let (user_id, _) = app.sign_up_and_in("ada@example.com").await;

        let created_at = Utc::now() - Duration::seconds(TTL_SECONDS - WINDOW_SECONDS / 2);
        let issued = app
            .state
            .sessions
            .create_at(user_id, SessionMetadata::default(), created_at)
            .await
            .unwrap();
        let original_expiry = issued.session.expires_at;

        let response = app
            .call("user.me", json!(null), Carrier::Cookie(&issued.handle))
            .await;
        response.success();

        let stored = app
            .store
            .sessions_of(user_id)
            .await
            .into_iter()
            .find(|s| s.id == issued.session.id)
            .unwrap();

        match policy {
            RefreshPolicy::Sliding => {
                let cookie = response.set_cookie.as_deref().expect("refreshed cookie");
                assert_eq!(cookie_value(cookie), issued.handle);
                assert!(stored.expires_at > original_expiry);
            }
            RefreshPolicy::Fixed => {
                assert!(response.set_cookie.is_none());
                assert_eq!(stored.expires_at, original_expiry);
            }
        }

        // bearer callers get the refresh but no cookie
        let bearer = app
            .call("user.me", json!(null), Carrier::Bearer(&issued.handle))
            .await;
        bearer.success();
        assert!(bearer.set_cookie.is_none());
    }
}

#[tokio::test]
async fn test_revoke_sessions_signs_out_everywhere() {
    for policy in POLICIES {
        let app = TestApp::new(policy);
        let (user_id, first) = app.sign_up_and_in("ada@example.com").await;
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

        let response = app
            .call("auth.revokeSessions", json!(null), Carrier::Cookie(&first))
            .await;
        assert_eq!(response.success()["revoked"], 2);
        assert!(response.set_cookie.as_deref().unwrap().contains("Max-Age=0"));

        for handle in [&first, &second] {
            let response = app.call("user.me", json!(null), Carrier::Bearer(handle)).await;
            assert_eq!(response.failure_kind(), "Unauthorized");
        }
        assert!(
            app.store
                .sessions_of(user_id)
                .await
                .iter()
                .all(|s| s.revoked_at.is_some())
        );
    }
}
