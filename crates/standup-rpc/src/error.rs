//! Maps `AppError` to the RPC failure body and HTTP status.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use standup_core::error::{AppError, ErrorKind};

/// HTTP status for an error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput | ErrorKind::TokenInvalid | ErrorKind::TokenExpired => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::InvalidCredentials
        | ErrorKind::SessionInvalid
        | ErrorKind::SessionExpired
        | ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::EmailAlreadyRegistered => StatusCode::CONFLICT,
        ErrorKind::MailDispatchFailed => StatusCode::BAD_GATEWAY,
        ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// The `failure` member of an RPC response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcFailure {
    /// Error kind.
    pub kind: ErrorKind,
    /// Caller-facing message.
    pub message: String,
}

impl From<&AppError> for RpcFailure {
    fn from(err: &AppError) -> Self {
        let message = if err.kind.is_infrastructure() {
            error!(
                kind = %err.kind,
                error = %err,
                source = ?std::error::Error::source(err),
                "Infrastructure failure"
            );
            generic_message(err.kind).to_string()
        } else {
            err.message.clone()
        };
        Self {
            kind: err.kind,
            message,
        }
    }
}

/// Caller-facing text for kinds whose detail stays in the logs.
fn generic_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::MailDispatchFailed => "Message could not be delivered",
        _ => "Service temporarily unavailable",
    }
}

/// RPC response body: `{"success": …}` or `{"failure": {…}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcResponse {
    /// Procedure output.
    Success(Value),
    /// Failure kind and message.
    Failure(RpcFailure),
}

impl RpcResponse {
    /// HTTP status for this response.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Success(_) => StatusCode::OK,
            Self::Failure(failure) => status_for(failure.kind),
        }
    }
}

impl From<Result<Value, AppError>> for RpcResponse {
    fn from(result: Result<Value, AppError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(e) => Self::Failure(RpcFailure::from(&e)),
        }
    }
}

impl IntoResponse for RpcResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}
