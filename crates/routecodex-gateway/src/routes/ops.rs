use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use routecodex_common::GatewayError;
use serde_json::json;

use crate::error::error_response;
use crate::state::GatewayState;

/// `GET /health`: unauthenticated liveness.
pub async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

/// `GET /ready`: unauthenticated readiness. Ready once at least one
/// pipeline has been assembled from the current `RuntimeConfig`.
pub async fn ready(State(state): State<Arc<GatewayState>>) -> Response {
    if state.router.pipelines().is_empty() {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "not_ready" }))).into_response()
    } else {
        Json(json!({ "status": "ready" })).into_response()
    }
}

/// `POST /shutdown`: authenticated graceful shutdown trigger. Flips
/// the watch channel the binary's `axum::serve(...).with_graceful_shutdown`
/// future is waiting on; the drain window itself is owned by `main`, not
/// this handler, since the handler's own response must still complete.
pub async fn shutdown(State(state): State<Arc<GatewayState>>) -> Response {
    let _ = state.shutdown_tx.send(true);
    (StatusCode::ACCEPTED, Json(json!({ "status": "shutting_down" }))).into_response()
}

/// `POST /internal/reload`: re-resolves the config and atomically swaps
/// the `RouterState`'s config + pipeline set.
pub async fn reload(State(state): State<Arc<GatewayState>>) -> Response {
    match routecodex_config::resolve(&state.user_config_path, &state.system_config_path) {
        Ok((config, warnings)) => {
            state.router.apply(config);
            Json(json!({ "status": "reloaded", "warnings": warnings })).into_response()
        }
        Err(err) => error_response(&GatewayError::internal(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests_support::test_state;

    #[tokio::test]
    async fn health_is_always_ok() {
        assert_eq!(health().await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_when_pipelines_exist() {
        let state = test_state();
        assert_eq!(ready(State(state)).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn shutdown_flips_the_signal() {
        let state = test_state();
        let mut rx = state.shutdown_tx.subscribe();
        assert_eq!(shutdown(State(state)).await.status(), StatusCode::ACCEPTED);
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn reload_resolves_current_config_paths() {
        let state = test_state();
        assert_eq!(reload(State(state)).await.status(), StatusCode::OK);
    }
}
