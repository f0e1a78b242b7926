use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use routecodex_protocol::codex::request::ResponsesRequest;
use routecodex_transform::CompletionRequest;

use super::execute;
use crate::state::GatewayState;

/// `POST /v1/responses`. Same header-sourced category hint as
/// `/v1/messages`: `ResponsesRequest` has no `category` field either.
pub async fn handle(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Json(body): Json<ResponsesRequest>,
) -> Response {
    let category_hint = execute::category_header(&headers);
    let model = body.model.clone();
    execute::run(
        state,
        CompletionRequest::CodexResponses(body),
        category_hint,
        Some(model),
    )
    .await
}
