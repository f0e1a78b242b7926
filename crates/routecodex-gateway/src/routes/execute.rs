use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use routecodex_common::GatewayError;
use routecodex_router::{classify, execute, ExecutionOutcome, RequestContext};
use routecodex_transform::{CompletionRequest, CompletionResponse};
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::error_response;
use crate::sse::sse_response;
use crate::state::GatewayState;

const MAX_FAILOVER_ATTEMPTS: usize = 3;

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Shared completion path for all three dialect handlers: classify ->
/// select -> execute, with failover retrying a retriable error against
/// the next eligible pipeline.
pub async fn run(
    state: Arc<GatewayState>,
    request: CompletionRequest,
    category_hint: Option<String>,
    requested_model: Option<String>,
) -> Response {
    let trace_id = Uuid::new_v4();
    let known_categories = state.router.known_categories();
    let category = classify(&request, category_hint.as_deref(), &state.router.rules, &known_categories);

    let mut excluded: Vec<String> = Vec::new();
    let mut last_error = GatewayError::admission("no eligible pipeline");

    for _ in 0..MAX_FAILOVER_ATTEMPTS {
        let pipeline = match state
            .router
            .select(&category, requested_model.as_deref(), &excluded)
            .await
        {
            Ok(pipeline) => pipeline,
            Err(err) => {
                last_error = err.into();
                break;
            }
        };

        let ctx = RequestContext {
            id: trace_id,
            received_at_ms: now_ms(),
            request: request.clone(),
            category_hint: category_hint.clone(),
            requested_model: requested_model.clone(),
        };

        let (_cancel_tx, cancel_rx) = watch::channel(false);
        let pipeline_id = pipeline.def.id.clone();

        match execute(&state.router, ctx, Arc::clone(&pipeline), cancel_rx).await {
            Ok(outcome) => return with_trace_header(trace_id, outcome_to_response(outcome)),
            Err(err) => {
                let gateway_err: GatewayError = err.into();
                let retriable = gateway_err.category.retriable();
                last_error = gateway_err.with_pipeline(pipeline_id.clone());
                excluded.push(pipeline_id);
                if !retriable {
                    break;
                }
            }
        }
    }

    with_trace_header(trace_id, error_response(&last_error))
}

fn outcome_to_response(outcome: ExecutionOutcome) -> Response {
    match outcome {
        ExecutionOutcome::Buffered(response) => json_response(&response),
        ExecutionOutcome::Streamed { format, chunks } => sse_response(format, chunks),
    }
}

fn json_response(response: &CompletionResponse) -> Response {
    let body = match response {
        CompletionResponse::OpenaiChat(r) => serde_json::to_vec(r),
        CompletionResponse::AnthropicMessages(r) => serde_json::to_vec(r),
        CompletionResponse::CodexResponses(r) => serde_json::to_vec(r),
    };
    match body {
        Ok(bytes) => {
            let mut resp = Response::new(axum::body::Body::from(bytes));
            resp.headers_mut().insert(
                axum::http::header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            resp
        }
        Err(err) => error_response(&GatewayError::internal(err.to_string())),
    }
}

pub fn category_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-routecodex-category")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn with_trace_header(trace_id: Uuid, mut response: Response) -> Response {
    if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
        response.headers_mut().insert("x-routecodex-request-id", value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use routecodex_protocol::openai::response::ChatCompletionResponse;
    use routecodex_protocol::openai::types::{ChatMessage, ChatRole, Usage};

    #[test]
    fn category_header_reads_custom_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-routecodex-category",
            HeaderValue::from_static("coding"),
        );
        assert_eq!(category_header(&headers), Some("coding".to_string()));
    }

    #[test]
    fn category_header_absent_is_none() {
        assert_eq!(category_header(&HeaderMap::new()), None);
    }

    #[test]
    fn json_response_serializes_openai_body_with_content_type() {
        let body = ChatCompletionResponse::non_stream(
            "resp-1".to_string(),
            "gpt-4".to_string(),
            0,
            ChatMessage {
                role: ChatRole::Assistant,
                content: None,
                name: None,
                tool_calls: None,
                tool_call_id: None,
            },
            None,
            Usage {
                prompt_tokens: 1,
                completion_tokens: 1,
                total_tokens: 2,
            },
        );
        let resp = json_response(&CompletionResponse::OpenaiChat(body));
        assert_eq!(resp.status(), axum::http::StatusCode::OK);
        assert_eq!(
            resp.headers().get(axum::http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn with_trace_header_sets_request_id() {
        let trace_id = Uuid::new_v4();
        let resp = with_trace_header(trace_id, Response::new(axum::body::Body::empty()));
        let header = resp.headers().get("x-routecodex-request-id").unwrap();
        assert_eq!(header.to_str().unwrap(), trace_id.to_string());
    }
}
