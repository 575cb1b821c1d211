//! Application builder: wires routes, layers, and state into an Axum app.

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::http::cors::build_cors_layer;
use crate::http::routes;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    routes()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
