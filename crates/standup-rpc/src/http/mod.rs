//! Axum transport for the RPC pipeline.

pub mod carrier;
pub mod cors;
pub mod health;
pub mod rpc;

use axum::Router;
use axum::routing::get;

use crate::state::AppState;

/// Route table: the RPC endpoint and the health probe.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/rpc/{name}", get(rpc::call_get).post(rpc::call_post))
        .route("/health", get(health::health))
}
