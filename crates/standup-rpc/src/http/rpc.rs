//! RPC endpoint handlers.
//!
//! `POST /api/rpc/{name}` takes the input as the JSON body (empty body means
//! `null`); `GET /api/rpc/{name}?input=<json>` takes it from the query.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::{SET_COOKIE, USER_AGENT};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use standup_core::error::AppError;
use standup_entity::session::SessionMetadata;

use crate::engine::RpcRequest;
use crate::error::RpcResponse;
use crate::http::carrier::{SessionCarrier, clear_cookie, session_cookie};
use crate::router::SessionDirective;
use crate::state::AppState;

/// Query string of `GET /api/rpc/{name}`.
#[derive(Debug, Deserialize)]
pub struct RpcQuery {
    /// JSON-encoded input.
    pub input: Option<String>,
}

/// POST /api/rpc/{name}
pub async fn call_post(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let input = if body.iter().all(u8::is_ascii_whitespace) {
        Ok(Value::Null)
    } else {
        serde_json::from_slice(&body).map_err(AppError::from)
    };
    call(&state, name, input, &headers).await
}

/// GET /api/rpc/{name}
pub async fn call_get(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<RpcQuery>,
    headers: HeaderMap,
) -> Response {
    let input = match query.input.as_deref().map(str::trim) {
        None | Some("") => Ok(Value::Null),
        Some(raw) => serde_json::from_str(raw).map_err(AppError::from),
    };
    call(&state, name, input, &headers).await
}

async fn call(
    state: &AppState,
    name: String,
    input: Result<Value, AppError>,
    headers: &HeaderMap,
) -> Response {
    let input = match input {
        Ok(input) => input,
        Err(e) => return RpcResponse::from(Err(e)).into_response(),
    };

    let session = &state.config.session;
    let carrier = SessionCarrier::from_headers(headers, &session.cookie_name);
    let outcome = state
        .engine
        .execute(RpcRequest {
            name,
            input,
            session: carrier.as_ref().map(|c| c.handle().to_string()),
            metadata: request_metadata(headers),
        })
        .await;

    let mut response = RpcResponse::from(outcome.result).into_response();

    let now = Utc::now();
    let cookie = match (outcome.directive, outcome.refreshed_until, &carrier) {
        (Some(SessionDirective::Set { handle, expires_at }), _, _) => Some(session_cookie(
            &session.cookie_name,
            &handle,
            expires_at,
            now,
            session.cookie_secure,
        )),
        (Some(SessionDirective::Clear), _, _) => {
            Some(clear_cookie(&session.cookie_name, session.cookie_secure))
        }
        (None, Some(expires_at), Some(carrier)) if carrier.is_cookie() => Some(session_cookie(
            &session.cookie_name,
            carrier.handle(),
            expires_at,
            now,
            session.cookie_secure,
        )),
        _ => None,
    };

    if let Some(cookie) = cookie {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "Session cookie is not a valid header value"),
        }
    }

    response
}

/// Client address from `X-Forwarded-For` and the user agent.
fn request_metadata(headers: &HeaderMap) -> SessionMetadata {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    SessionMetadata {
        ip_address,
        user_agent,
    }
}
