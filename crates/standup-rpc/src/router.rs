//! Named procedure registry and dispatch.
//!
//! Dispatch runs in a fixed order: lookup, capability check, input decoding
//! and validation, handler. A caller without the capability never reaches
//! input decoding, so malformed input cannot be used to map out a procedure
//! the caller may not call.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use standup_core::error::{AppError, ErrorKind};
use standup_core::result::AppResult;

use crate::capability::Capability;
use crate::context::RequestContext;

/// What the transport should do with the session carrier after a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionDirective {
    /// Store a new handle.
    Set {
        /// Raw session handle.
        handle: String,
        /// Session expiry.
        expires_at: DateTime<Utc>,
    },
    /// Remove the stored handle.
    Clear,
}

/// A procedure result plus an optional session directive.
#[derive(Debug, Clone)]
pub struct Reply<T> {
    /// The procedure output.
    pub output: T,
    /// Carrier change requested by the procedure.
    pub session: Option<SessionDirective>,
}

impl<T> Reply<T> {
    /// A reply that leaves the carrier alone.
    pub fn new(output: T) -> Self {
        Self {
            output,
            session: None,
        }
    }

    /// A reply that stores a new session handle.
    pub fn set_session(output: T, handle: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            output,
            session: Some(SessionDirective::Set { handle, expires_at }),
        }
    }

    /// A reply that removes the session handle.
    pub fn clear_session(output: T) -> Self {
        Self {
            output,
            session: Some(SessionDirective::Clear),
        }
    }
}

impl<T: Serialize> Reply<T> {
    fn into_json(self) -> AppResult<Reply<Value>> {
        let output = serde_json::to_value(self.output).map_err(|e| {
            AppError::with_source(ErrorKind::StoreUnavailable, "Failed to encode output", e)
        })?;
        Ok(Reply {
            output,
            session: self.session,
        })
    }
}

/// Input type for procedures that take none. Accepts `null`.
#[derive(Debug, Clone, Copy, Default, serde::Deserialize)]
pub struct NoInput;

impl Validate for NoInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

type Handler =
    Arc<dyn Fn(Value, RequestContext) -> BoxFuture<'static, AppResult<Reply<Value>>> + Send + Sync>;

struct Procedure {
    capability: Capability,
    handler: Handler,
}

/// Registry of named procedures.
#[derive(Default)]
pub struct ProcedureRouter {
    procedures: BTreeMap<&'static str, Procedure>,
}

impl std::fmt::Debug for ProcedureRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.procedures.iter().map(|(name, p)| (name, p.capability)))
            .finish()
    }
}

impl ProcedureRouter {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a typed procedure.
    ///
    /// The input is decoded from JSON and validated before `handler` runs;
    /// the output is encoded back to JSON.
    pub fn register<I, O, F, Fut>(&mut self, name: &'static str, capability: Capability, handler: F)
    where
        I: DeserializeOwned + Validate + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(I, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Reply<O>>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: Handler = Arc::new(move |input: Value, ctx: RequestContext| {
            let handler = Arc::clone(&handler);
            async move {
                let input = decode::<I>(input)?;
                handler(input, ctx).await?.into_json()
            }
            .boxed()
        });

        self.procedures.insert(
            name,
            Procedure {
                capability,
                handler: erased,
            },
        );
    }

    /// Registers a procedure whose handler also receives shared `state`.
    pub fn register_with<S, I, O, F, Fut>(
        &mut self,
        name: &'static str,
        capability: Capability,
        state: S,
        handler: F,
    ) where
        S: Clone + Send + Sync + 'static,
        I: DeserializeOwned + Validate + Send + 'static,
        O: Serialize + Send + 'static,
        F: Fn(S, I, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Reply<O>>> + Send + 'static,
    {
        self.register(name, capability, move |input: I, ctx: RequestContext| {
            handler(state.clone(), input, ctx)
        });
    }

    /// Capability of a registered procedure.
    pub fn capability(&self, name: &str) -> Option<Capability> {
        self.procedures.get(name).map(|p| p.capability)
    }

    /// Names of every registered procedure.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.procedures.keys().copied()
    }

    /// Runs a procedure by name.
    pub async fn dispatch(
        &self,
        name: &str,
        input: Value,
        ctx: RequestContext,
    ) -> AppResult<Reply<Value>> {
        let procedure = self
            .procedures
            .get(name)
            .ok_or_else(|| AppError::invalid_input(format!("Unknown procedure `{name}`")))?;

        procedure.capability.authorize(ctx.identity())?;
        (procedure.handler)(input, ctx).await
    }
}

fn decode<I: DeserializeOwned + Validate>(input: Value) -> AppResult<I> {
    let input: I = serde_json::from_value(input)
        .map_err(|e| AppError::invalid_input(format!("Malformed input: {e}")))?;
    input
        .validate()
        .map_err(|e| AppError::invalid_input(e.to_string()))?;
    Ok(input)
}
