//! Transport-independent RPC pipeline: context, dispatch, and the session
//! bookkeeping a transport needs afterwards.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use standup_core::error::AppError;
use standup_core::result::AppResult;
use standup_entity::session::SessionMetadata;

use crate::context::ContextBuilder;
use crate::router::{ProcedureRouter, SessionDirective};

/// One call, independent of the transport that carried it.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    /// Procedure name.
    pub name: String,
    /// JSON input; `null` when absent.
    pub input: Value,
    /// Session handle from the carrier.
    pub session: Option<String>,
    /// Client address and user agent.
    pub metadata: SessionMetadata,
}

/// What the transport needs to answer a call.
#[derive(Debug)]
pub struct RpcOutcome {
    /// Procedure output or failure.
    pub result: AppResult<Value>,
    /// Carrier change requested by the procedure.
    pub directive: Option<SessionDirective>,
    /// New expiry when validation slid the presented session forward.
    pub refreshed_until: Option<DateTime<Utc>>,
}

impl RpcOutcome {
    fn failed(err: AppError) -> Self {
        Self {
            result: Err(err),
            directive: None,
            refreshed_until: None,
        }
    }
}

/// Runs calls through the context builder and the procedure router.
#[derive(Debug)]
pub struct RpcEngine {
    contexts: ContextBuilder,
    router: ProcedureRouter,
    timeout: Duration,
}

impl RpcEngine {
    /// Creates an engine. Each call is bounded by `timeout`.
    pub fn new(contexts: ContextBuilder, router: ProcedureRouter, timeout: Duration) -> Self {
        Self {
            contexts,
            router,
            timeout,
        }
    }

    /// The procedure router.
    pub fn router(&self) -> &ProcedureRouter {
        &self.router
    }

    /// Executes one call.
    pub async fn execute(&self, request: RpcRequest) -> RpcOutcome {
        let RpcRequest {
            name,
            input,
            session,
            metadata,
        } = request;

        let ctx = match self.contexts.build(session.as_deref(), metadata).await {
            Ok(ctx) => ctx,
            Err(e) => return RpcOutcome::failed(e),
        };
        let refreshed_until = ctx.refreshed_until();
        let authenticated = ctx.identity().is_authenticated();

        let result = match tokio::time::timeout(
            self.timeout,
            self.router.dispatch(&name, input, ctx),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(procedure = %name, timeout_ms = self.timeout.as_millis() as u64, "Procedure timed out");
                Err(AppError::store_unavailable("Request timed out"))
            }
        };

        match result {
            Ok(reply) => {
                debug!(procedure = %name, authenticated, "Procedure succeeded");
                RpcOutcome {
                    result: Ok(reply.output),
                    directive: reply.session,
                    refreshed_until,
                }
            }
            Err(e) => {
                debug!(procedure = %name, authenticated, kind = %e.kind, "Procedure failed");
                RpcOutcome {
                    result: Err(e),
                    directive: None,
                    refreshed_until,
                }
            }
        }
    }
}
