use std::sync::Arc;

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use routecodex_protocol::openai::request::ChatCompletionRequest;
use routecodex_transform::CompletionRequest;

use super::execute;
use crate::state::GatewayState;

/// `POST /v1/chat/completions`. The only dialect whose request body
/// carries its own `category` hint field for bypassing classification.
pub async fn handle(
    State(state): State<Arc<GatewayState>>,
    Json(body): Json<ChatCompletionRequest>,
) -> Response {
    let category_hint = body.category.clone();
    let model = body.model.clone();
    execute::run(
        state,
        CompletionRequest::OpenaiChat(body),
        category_hint,
        Some(model),
    )
    .await
}
