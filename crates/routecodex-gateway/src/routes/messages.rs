use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use axum::Json;
use routecodex_protocol::anthropic::request::MessagesRequest;
use routecodex_transform::CompletionRequest;

use super::execute;
use crate::state::GatewayState;

/// `POST /v1/messages`. `MessagesRequest` carries no `category` field, so
/// the classification-bypass hint comes from the
/// `x-routecodex-category` header instead.
pub async fn handle(
    State(state): State<Arc<GatewayState>>,
    headers: HeaderMap,
    Json(body): Json<MessagesRequest>,
) -> Response {
    let category_hint = execute::category_header(&headers);
    let model = body.model.clone();
    execute::run(
        state,
        CompletionRequest::AnthropicMessages(body),
        category_hint,
        Some(model),
    )
    .await
}
