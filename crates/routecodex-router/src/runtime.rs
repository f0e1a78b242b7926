use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use routecodex_provider_core::{Headers, UnavailableReason, UpstreamCallContext, UpstreamOutcome};
use routecodex_transform::{
    canonical_to_request, decode_upstream_event, request_to_canonical, stream_format,
    transform_response, AnthropicStreamEncoder, CanonicalRequest, CodexStreamEncoder,
    CompletionRequest, CompletionResponse, OpenAiStreamEncoder, Proto, StreamFormat,
    StreamTransformer,
};
use routecodex_protocol::sse::SseParser;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::assembly::Pipeline;
use crate::errors::RouterError;
use crate::virtual_router::RouterState;

/// Created by the gateway layer after parsing the client body and
/// discarded once `execute` returns.
pub struct RequestContext {
    pub id: Uuid,
    pub received_at_ms: i64,
    pub request: CompletionRequest,
    pub category_hint: Option<String>,
    pub requested_model: Option<String>,
}

/// Either the reverse-translated response body, or a channel of already
/// wire-framed SSE chunks the gateway forwards verbatim, chunk ordering
/// preserved.
pub enum ExecutionOutcome {
    Buffered(CompletionResponse),
    Streamed {
        format: StreamFormat,
        chunks: mpsc::Receiver<String>,
    },
}

const PRE_STREAM_WINDOW: Duration = Duration::from_millis(800);

/// Runs a request through the pipeline's four conceptual stages (llmSwitch,
/// workflow, compatibility, provider), expressed as one pass through the
/// canonical form (parse -> mutate canonical -> re-encode in the
/// pipeline's native dialect) followed by the provider call and its
/// mirrored reverse pass, rather than four separately staged request
/// objects. The canonical form is bijective enough to reverse the
/// response back into the client's dialect.
pub async fn execute(
    state: &RouterState,
    ctx: RequestContext,
    pipeline: Arc<Pipeline>,
    mut cancel: watch::Receiver<bool>,
) -> Result<ExecutionOutcome, RouterError> {
    pipeline.stats.record_request(ctx.received_at_ms);

    let client_dialect = ctx.request.proto();
    let native_dialect = pipeline.native_dialect;
    let wants_stream = ctx.request.wants_stream();

    let mut canonical = request_to_canonical(&ctx.request)
        .map_err(|e| RouterError::Validation(e.to_string()))?;
    apply_llm_switch(&mut canonical, pipeline.def.llm_switch_config.as_ref());
    apply_workflow(&mut canonical, pipeline.def.workflow_config.as_ref());

    let native_request = canonical_to_request(&canonical, native_dialect);
    let body = match &native_request {
        CompletionRequest::OpenaiChat(r) => serde_json::to_vec(r),
        CompletionRequest::AnthropicMessages(r) => serde_json::to_vec(r),
        CompletionRequest::CodexResponses(r) => serde_json::to_vec(r),
    }
    .map_err(|e| RouterError::Internal(e.to_string()))?;

    let credential = state
        .credentials
        .acquire(&pipeline.def.provider_id)
        .await
        .ok_or_else(|| RouterError::Admission("no unblocked credential available".to_string()))?;

    let mut headers: Headers = Vec::new();
    headers.push(("content-type".to_string(), "application/json".to_string()));
    apply_auth_header(&mut headers, &credential);

    let path = upstream_path(native_dialect);
    let call_ctx = UpstreamCallContext {
        base_url: pipeline.base_url.clone(),
        path,
        credential: credential.clone(),
        headers,
        body: Bytes::from(body),
        stream: wants_stream,
        timeout: Duration::from_millis(pipeline.timeout_ms),
    };

    let outcome = tokio::select! {
        result = pipeline.provider.execute(call_ctx) => result.map_err(|e| RouterError::Upstream(e.to_string())),
        _ = wait_for_cancel(&mut cancel) => Err(RouterError::Timeout("client disconnected".to_string())),
    }?;

    match outcome {
        UpstreamOutcome::Buffered { status, body } => {
            if let Some(err) = map_failure_status(status) {
                on_upstream_failure(state, &pipeline, &credential, &err).await;
                return Err(err);
            }
            state.credentials.health.record_success(&format!(
                "{}:{}",
                credential.provider_id, credential.id
            )).await;
            state.record_success(&pipeline.def.id).await;

            let native_response: CompletionResponse = decode_response(native_dialect, &body)
                .map_err(|e| RouterError::Upstream(e.to_string()))?;
            let final_response = transform_response(
                &native_response,
                client_dialect,
                ctx.id.to_string(),
                ctx.request.model().to_string(),
                ctx.received_at_ms / 1000,
            );
            Ok(ExecutionOutcome::Buffered(final_response))
        }
        UpstreamOutcome::Streamed { status, mut chunks } => {
            if let Some(err) = map_failure_status(status) {
                on_upstream_failure(state, &pipeline, &credential, &err).await;
                return Err(err);
            }

            let first = tokio::time::timeout(PRE_STREAM_WINDOW, chunks.recv()).await;
            if let Ok(Some(Err(transport_err))) = &first {
                let err = RouterError::Upstream(transport_err.to_string());
                on_upstream_failure(state, &pipeline, &credential, &err).await;
                return Err(err);
            }

            state.credentials.health.record_success(&format!(
                "{}:{}",
                credential.provider_id, credential.id
            )).await;
            state.record_success(&pipeline.def.id).await;

            let (tx, rx) = mpsc::channel(32);
            let id = ctx.id.to_string();
            let model = ctx.request.model().to_string();
            let pending_first = match first {
                Ok(Some(Ok(bytes))) => Some(bytes),
                _ => None,
            };

            tokio::spawn(stream_and_reencode(
                native_dialect,
                client_dialect,
                id,
                model,
                pending_first,
                chunks,
                tx,
            ));

            Ok(ExecutionOutcome::Streamed {
                format: stream_format(client_dialect),
                chunks: rx,
            })
        }
    }
}

async fn wait_for_cancel(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

async fn stream_and_reencode(
    native: Proto,
    client: Proto,
    id: String,
    model: String,
    pending_first: Option<Bytes>,
    mut chunks: mpsc::Receiver<Result<Bytes, routecodex_provider_core::ProviderCoreError>>,
    tx: mpsc::Sender<String>,
) {
    let mut parser = SseParser::new();
    let mut encoder: Box<dyn StreamTransformer> = match client {
        Proto::OpenaiChat => Box::new(OpenAiStreamEncoder::new(0)),
        Proto::AnthropicMessages => Box::new(AnthropicStreamEncoder::new()),
        Proto::CodexResponses => Box::new(CodexStreamEncoder::new()),
    };

    if tx.send(encoder.start(&id, &model)).await.is_err() {
        return;
    }

    if let Some(bytes) = pending_first {
        if !forward_chunk(&mut parser, &mut *encoder, native, &bytes, &tx).await {
            return;
        }
    }

    while let Some(item) = chunks.recv().await {
        match item {
            Ok(bytes) => {
                if !forward_chunk(&mut parser, &mut *encoder, native, &bytes, &tx).await {
                    return;
                }
            }
            Err(err) => {
                let _ = tx.send(encoder.error(&err.to_string())).await;
                return;
            }
        }
    }

    for event in parser.finish() {
        if let Some(delta) = decode_upstream_event(native, &event) {
            if tx.send(encoder.push(&delta)).await.is_err() {
                return;
            }
        }
    }

    let _ = tx.send(encoder.finish()).await;
}

async fn forward_chunk(
    parser: &mut SseParser,
    encoder: &mut dyn StreamTransformer,
    native: Proto,
    bytes: &Bytes,
    tx: &mpsc::Sender<String>,
) -> bool {
    for event in parser.push_bytes(bytes) {
        if let Some(delta) = decode_upstream_event(native, &event) {
            if tx.send(encoder.push(&delta)).await.is_err() {
                return false;
            }
        }
    }
    true
}

fn apply_llm_switch(canonical: &mut CanonicalRequest, config: Option<&Value>) {
    let Some(config) = config else { return };
    if let Some(prompt) = config.get("systemPrompt").and_then(Value::as_str) {
        canonical.system = Some(prompt.to_string());
    }
}

fn apply_workflow(canonical: &mut CanonicalRequest, config: Option<&Value>) {
    let Some(config) = config else { return };
    let strip_non_final_tool_calls = config
        .get("stripNonFinalToolCalls")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if strip_non_final_tool_calls {
        let last_assistant = canonical
            .messages
            .iter()
            .rposition(|m| m.role == routecodex_transform::CanonicalRole::Assistant);
        for (index, message) in canonical.messages.iter_mut().enumerate() {
            if Some(index) != last_assistant {
                message.tool_calls.clear();
            }
        }
    }
}

fn decode_response(dialect: Proto, body: &[u8]) -> Result<CompletionResponse, serde_json::Error> {
    match dialect {
        Proto::OpenaiChat => Ok(CompletionResponse::OpenaiChat(serde_json::from_slice(body)?)),
        Proto::AnthropicMessages => {
            Ok(CompletionResponse::AnthropicMessages(serde_json::from_slice(body)?))
        }
        Proto::CodexResponses => {
            Ok(CompletionResponse::CodexResponses(serde_json::from_slice(body)?))
        }
    }
}

fn upstream_path(dialect: Proto) -> String {
    match dialect {
        Proto::OpenaiChat => "/chat/completions".to_string(),
        Proto::AnthropicMessages => "/messages".to_string(),
        Proto::CodexResponses => "/responses".to_string(),
    }
}

fn apply_auth_header(headers: &mut Headers, credential: &routecodex_provider_core::CredentialSnapshot) {
    use routecodex_provider_core::CredentialSecret;
    match &credential.secret {
        CredentialSecret::ApiKey(key) => {
            headers.push(("authorization".to_string(), format!("Bearer {key}")));
        }
        CredentialSecret::OAuthToken { access_token, .. } => {
            headers.push(("authorization".to_string(), format!("Bearer {access_token}")));
        }
    }
}

fn map_failure_status(status: u16) -> Option<RouterError> {
    match status {
        200..=299 => None,
        401 | 403 => Some(RouterError::Auth(format!("upstream returned {status}"))),
        429 => Some(RouterError::RateLimit(format!("upstream returned {status}"))),
        404 => Some(RouterError::Upstream(format!("upstream returned {status}"))),
        500..=599 => Some(RouterError::Upstream(format!("upstream returned {status}"))),
        _ => Some(RouterError::Upstream(format!("upstream returned {status}"))),
    }
}

async fn on_upstream_failure(
    state: &RouterState,
    pipeline: &Pipeline,
    credential: &routecodex_provider_core::CredentialSnapshot,
    err: &RouterError,
) {
    pipeline.stats.record_error();
    state.record_failure(&pipeline.def.id).await;
    let key = format!("{}:{}", credential.provider_id, credential.id);

    match err {
        RouterError::RateLimit(_) => {
            state.credentials.health.record_rate_limit_hit(&key).await;
        }
        RouterError::Auth(_) => {
            state
                .credentials
                .health
                .block(&key, UnavailableReason::AuthInvalid, None, None)
                .await;
        }
        RouterError::Upstream(_) | RouterError::Timeout(_) => {
            state.credentials.health.record_failure(&key).await;
        }
        _ => {}
    }
}
