//! Axum router wiring.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(ops::health))
        .route("/metrics", get(ops::metrics))
        .route("/streams/:id/access", post(transport::http::access))
        .route("/streams/:id/publish", post(transport::http::publish))
        .with_state(state)
}
