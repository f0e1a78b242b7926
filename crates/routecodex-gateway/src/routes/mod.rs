mod completions;
pub mod execute;
mod messages;
mod models;
mod ops;
mod responses;
#[cfg(test)]
mod tests_support;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::auth::require_api_key;
use crate::state::GatewayState;

/// A thin axum surface: route table, auth middleware, SSE/JSON response
/// writer.
pub fn router(state: Arc<GatewayState>) -> Router {
    let protected = Router::new()
        .route("/v1/chat/completions", post(completions::handle))
        .route("/v1/messages", post(messages::handle))
        .route("/v1/responses", post(responses::handle))
        .route("/v1/models", get(models::handle))
        .route("/shutdown", post(ops::shutdown))
        .route("/internal/reload", post(ops::reload))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_api_key,
        ));

    Router::new()
        .route("/health", get(ops::health))
        .route("/ready", get(ops::ready))
        .merge(protected)
        .with_state(state)
}
