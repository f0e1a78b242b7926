use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use routecodex_protocol::models::{ModelInfo, ModelListResponse};

use crate::state::GatewayState;

/// `GET /v1/models`. Aggregated straight from each provider's own
/// `modelCatalog`. No live upstream round-trip needed.
pub async fn handle(State(state): State<Arc<GatewayState>>) -> Response {
    let config = state.router.config();
    let mut data: Vec<ModelInfo> = config
        .providers
        .values()
        .flat_map(|provider| {
            provider.model_catalog.iter().map(move |model| ModelInfo {
                id: model.clone(),
                object: "model".to_string(),
                owned_by: provider.id.clone(),
            })
        })
        .collect();
    data.sort_by(|a, b| a.id.cmp(&b.id));

    Json(ModelListResponse::new(data)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::tests_support::test_state;

    #[tokio::test]
    async fn lists_models_sorted_by_id() {
        let state = test_state();
        let resp = handle(State(state)).await;
        assert_eq!(resp.status(), axum::http::StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let list: ModelListResponse = serde_json::from_slice(&bytes).unwrap();
        let ids: Vec<&str> = list.data.iter().map(|m| m.id.as_str()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
        assert!(ids.contains(&"gpt-4"));
    }
}
