//! # standup-rpc
//!
//! Typed RPC layer for Standup built on Axum.
//!
//! Every call runs the same pipeline: the [`context`] builder resolves the
//! session carried by the request into an [`Identity`], the [`router`]
//! looks up the named procedure, checks its [`Capability`], decodes and
//! validates the input, and runs the handler. The [`http`] module adapts the
//! pipeline to `POST/GET /api/rpc/{name}` and turns session directives into
//! cookies.

pub mod app;
pub mod capability;
pub mod context;
pub mod dto;
pub mod engine;
pub mod error;
pub mod http;
pub mod procedures;
pub mod router;
pub mod state;

pub use app::build_app;
pub use capability::Capability;
pub use context::{ContextBuilder, Identity, RequestContext};
pub use engine::{RpcEngine, RpcOutcome, RpcRequest};
pub use router::{ProcedureRouter, Reply, SessionDirective};
pub use state::AppState;
