//! Shared test helpers for integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

use standup_core::config::{AppConfig, RefreshPolicy};
use standup_core::error::AppError;
use standup_core::result::AppResult;
use standup_core::types::UserId;
use standup_database::{MemoryStore, Stores};
use standup_entity::user::UserRole;
use standup_rpc::{AppState, build_app};
use standup_service::mail::{MailMessage, Mailer};

pub const PASSWORD: &str = "correct horse battery";

pub const POLICIES: [RefreshPolicy; 2] = [RefreshPolicy::Sliding, RefreshPolicy::Fixed];

/// Session lifetime used by every test app.
pub const TTL_SECONDS: i64 = 3600;

/// Sliding refresh window used by every test app.
pub const WINDOW_SECONDS: i64 = 600;

/// Mailer that keeps every message in memory.
#[derive(Default)]
pub struct Outbox {
    sent: Mutex<Vec<MailMessage>>,
}

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, message: &MailMessage) -> AppResult<()> {
        if message.to.ends_with("@bounce.test") {
            return Err(AppError::mail_dispatch("mailbox unavailable"));
        }
        self.sent.lock().await.push(message.clone());
        Ok(())
    }
}

impl Outbox {
    pub async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn count_to(&self, to: &str) -> usize {
        self.sent.lock().await.iter().filter(|m| m.to == to).count()
    }

    /// Waits until `to` has received `n` messages.
    pub async fn wait_for(&self, to: &str, n: usize) {
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while self.count_to(to).await < n {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("no mail {n} to {to}"));
    }

    /// Token from the latest message to `to`.
    pub async fn last_token(&self, to: &str) -> String {
        let sent = self.sent.lock().await;
        let message = sent
            .iter()
            .rev()
            .find(|m| m.to == to)
            .unwrap_or_else(|| panic!("no mail sent to {to}"));
        let start = message.html.find("?token=").expect("mail has no link") + "?token=".len();
        let rest = &message.html[start..];
        rest[..rest.find('"').expect("unterminated link")].to_string()
    }
}

/// Test response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub set_cookie: Option<String>,
}

impl TestResponse {
    pub fn success(&self) -> &Value {
        assert_eq!(self.status, StatusCode::OK, "unexpected failure: {}", self.body);
        &self.body["success"]
    }

    pub fn failure_kind(&self) -> &str {
        self.body["failure"]["kind"]
            .as_str()
            .unwrap_or_else(|| panic!("expected failure, got {}", self.body))
    }
}

/// How a test request carries its session.
#[derive(Clone, Copy)]
pub enum Carrier<'a> {
    None,
    Bearer(&'a str),
    Cookie(&'a str),
}

/// Test application context
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: MemoryStore,
    pub outbox: Arc<Outbox>,
}

pub fn config(policy: RefreshPolicy) -> AppConfig {
    let window = match policy {
        RefreshPolicy::Sliding => format!("refresh_window_seconds = {WINDOW_SECONDS}"),
        RefreshPolicy::Fixed => String::new(),
    };
    let policy = match policy {
        RefreshPolicy::Sliding => "sliding",
        RefreshPolicy::Fixed => "fixed",
    };
    AppConfig::from_toml(&format!(
        r#"
        [app]
        base_url = "https://standup.test"

        [database]
        provider = "memory"

        [auth.password]
        memory_kib = 8
        iterations = 1
        parallelism = 1
        min_length = 8

        [session]
        policy = "{policy}"
        ttl_seconds = {TTL_SECONDS}
        {window}
        sweep_interval_seconds = 0

        [tokens]
        verify_email_ttl_seconds = 86400
        reset_password_ttl_seconds = 3600
        change_email_ttl_seconds = 3600
        delete_account_ttl_seconds = 3600

        [mail]
        provider = "log"
        "#
    ))
    .expect("test config is valid")
}

impl TestApp {
    pub fn new(policy: RefreshPolicy) -> Self {
        let store = MemoryStore::new();
        let outbox = Arc::new(Outbox::default());
        let state = AppState::build(config(policy), Stores::memory(store.clone()), outbox.clone())
            .expect("valid password parameters");
        Self {
            router: build_app(state.clone()),
            state,
            store,
            outbox,
        }
    }

    /// POST a procedure call.
    pub async fn call(&self, name: &str, input: Value, carrier: Carrier<'_>) -> TestResponse {
        let body = if input.is_null() {
            Body::empty()
        } else {
            Body::from(input.to_string())
        };
        let builder = Request::builder()
            .method("POST")
            .uri(format!("/api/rpc/{name}"))
            .header(CONTENT_TYPE, "application/json");
        self.send(with_carrier(builder, carrier).body(body).unwrap())
            .await
    }

    /// Send a raw request.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse {
            status,
            body,
            set_cookie,
        }
    }

    /// Sign up and sign in; returns the user ID and session handle.
    pub async fn sign_up_and_in(&self, email: &str) -> (UserId, String) {
        self.call(
            "auth.signUp",
            serde_json::json!({ "email": email, "password": PASSWORD }),
            Carrier::None,
        )
        .await
        .success();
        let signed_in = self
            .call(
                "auth.signIn",
                serde_json::json!({ "email": email, "password": PASSWORD }),
                Carrier::None,
            )
            .await;
        let body = signed_in.success();
        let user_id = serde_json::from_value(body["user"]["id"].clone()).unwrap();
        (user_id, body["token"].as_str().unwrap().to_string())
    }

    pub async fn promote(&self, user_id: UserId) {
        self.state
            .authenticator
            .credentials()
            .set_role(user_id, UserRole::Admin)
            .await
            .unwrap();
    }
}

pub fn with_carrier(
    builder: axum::http::request::Builder,
    carrier: Carrier<'_>,
) -> axum::http::request::Builder {
    match carrier {
        Carrier::None => builder,
        Carrier::Bearer(handle) => builder.header(AUTHORIZATION, format!("Bearer {handle}")),
        Carrier::Cookie(handle) => builder.header(COOKIE, format!("standup_session={handle}")),
    }
}
