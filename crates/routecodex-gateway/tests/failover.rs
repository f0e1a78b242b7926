use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::to_bytes;
use bytes::Bytes;
use routecodex_config::{
    AuthKind, CredentialDef, HttpServerDef, PipelineDef, PoolEntry, ProviderDef, RuntimeConfig,
    SecretRef,
};
use routecodex_gateway::routes::execute::run;
use routecodex_gateway::GatewayState;
use routecodex_protocol::openai::response::ChatCompletionResponse;
use routecodex_protocol::openai::request::ChatCompletionRequest;
use routecodex_protocol::openai::types::{ChatContent, ChatMessage, ChatRole, Usage};
use routecodex_provider_core::{
    Credential, CredentialLifecycleState, CredentialPool, CredentialSecret, EventHub, Proto,
    ProviderCoreError, UpstreamCallContext, UpstreamOutcome, UpstreamProvider,
};
use routecodex_router::{Pipeline, PipelineStats, RouterState};
use routecodex_transform::CompletionRequest;

/// Always answers with a fixed HTTP status, standing in for an upstream
/// REST call in tests that would otherwise need a live provider.
struct FixedStatusProvider {
    status: u16,
}

#[async_trait]
impl UpstreamProvider for FixedStatusProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn native_proto(&self) -> Proto {
        Proto::OpenaiChat
    }

    async fn execute(&self, _ctx: UpstreamCallContext) -> Result<UpstreamOutcome, ProviderCoreError> {
        let body = if self.status == 200 {
            let response = ChatCompletionResponse::non_stream(
                "resp-1".to_string(),
                "gpt-4".to_string(),
                0,
                ChatMessage {
                    role: ChatRole::Assistant,
                    content: Some(ChatContent::Text("hi from keyB".to_string())),
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
            serde_json::to_vec(&response).unwrap()
        } else {
            br#"{"error":{"message":"rate limited","type":"rate_limit_error","code":"rate_limit_error"}}"#.to_vec()
        };
        Ok(UpstreamOutcome::Buffered {
            status: self.status,
            body: Bytes::from(body),
        })
    }
}

fn pipeline_def(id: &str, credential_id: &str) -> PipelineDef {
    PipelineDef {
        id: id.to_string(),
        provider_id: "openai".to_string(),
        model_id: "gpt-4".to_string(),
        credential_id: credential_id.to_string(),
        llm_switch_config: None,
        workflow_config: None,
        compatibility_config: None,
        provider_config: None,
    }
}

fn credential_def(id: &str) -> CredentialDef {
    CredentialDef {
        id: id.to_string(),
        provider_id: "openai".to_string(),
        auth_kind: AuthKind::ApiKey,
        alias_index: id.to_string(),
        secret_ref: SecretRef::ApiKey(format!("secret-{id}")),
    }
}

fn pipeline(def: PipelineDef, status: u16) -> Arc<Pipeline> {
    Arc::new(Pipeline {
        def,
        native_dialect: Proto::OpenaiChat,
        base_url: "https://mock.invalid".to_string(),
        timeout_ms: 30_000,
        provider: Arc::new(FixedStatusProvider { status }),
        stats: PipelineStats::default(),
    })
}

/// Two pipelines share the `default` pool: `keyA` always 429s, `keyB` is
/// healthy. A single client request must still succeed, and `keyA` must
/// pick up a rate-limit hit along the way.
#[tokio::test]
async fn failing_pipeline_fails_over_to_healthy_one() {
    let mut providers = HashMap::new();
    providers.insert(
        "openai".to_string(),
        ProviderDef {
            id: "openai".to_string(),
            base_url: "https://mock.invalid".to_string(),
            protocol_dialect: Proto::OpenaiChat,
            timeout_ms: 30_000,
            headers: HashMap::new(),
            model_catalog: vec!["gpt-4".to_string()],
        },
    );

    let mut credentials = HashMap::new();
    credentials.insert("keyA".to_string(), credential_def("keyA"));
    credentials.insert("keyB".to_string(), credential_def("keyB"));

    let mut pipeline_defs = HashMap::new();
    pipeline_defs.insert("pipe-a".to_string(), pipeline_def("pipe-a", "keyA"));
    pipeline_defs.insert("pipe-b".to_string(), pipeline_def("pipe-b", "keyB"));

    let mut routing = HashMap::new();
    routing.insert(
        "default".to_string(),
        vec![
            PoolEntry {
                pipeline_id: "pipe-a".to_string(),
                weight: 1,
            },
            PoolEntry {
                pipeline_id: "pipe-b".to_string(),
                weight: 1,
            },
        ],
    );

    let config = RuntimeConfig {
        providers,
        credentials,
        pipelines: pipeline_defs,
        routing,
        http_server: HttpServerDef {
            host: "127.0.0.1".to_string(),
            port: 0,
            api_key: None,
        },
        quota_routing_enabled: true,
    };

    let events = EventHub::new(16);
    let credential_pool = CredentialPool::new(events, None);
    credential_pool
        .insert(Credential {
            id: "keyA".to_string(),
            provider_id: "openai".to_string(),
            alias: "key1".to_string(),
            secret: CredentialSecret::ApiKey("secret-a".to_string()),
            state: CredentialLifecycleState::Ready,
            last_refresh_at_ms: None,
        })
        .await;
    credential_pool
        .insert(Credential {
            id: "keyB".to_string(),
            provider_id: "openai".to_string(),
            alias: "key2".to_string(),
            secret: CredentialSecret::ApiKey("secret-b".to_string()),
            state: CredentialLifecycleState::Ready,
            last_refresh_at_ms: None,
        })
        .await;

    let mut pipelines = HashMap::new();
    pipelines.insert("pipe-a".to_string(), pipeline(pipeline_def("pipe-a", "keyA"), 429));
    pipelines.insert("pipe-b".to_string(), pipeline(pipeline_def("pipe-b", "keyB"), 200));

    let router_state = RouterState::with_pipelines(config, credential_pool, Vec::new(), pipelines, None);

    let dir = tempfile::tempdir().unwrap();
    let (state, _shutdown_rx) = GatewayState::new(
        router_state,
        None,
        dir.path().join("config.json"),
        dir.path().join("system.json"),
    );

    let request = CompletionRequest::OpenaiChat(ChatCompletionRequest {
        model: "gpt-4".to_string(),
        messages: vec![ChatMessage {
            role: ChatRole::User,
            content: Some(ChatContent::Text("hi".to_string())),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }],
        tools: None,
        tool_choice: None,
        stream: Some(false),
        temperature: None,
        top_p: None,
        max_tokens: None,
        n: None,
        stop: None,
        response_format: None,
        user: None,
        category: None,
    });

    let response = run(state.clone(), request, None, None).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("hi from keyB"));

    let rate_limit_hits = state
        .router
        .credentials
        .health
        .rate_limit_hit_count(&"openai:keyA".to_string())
        .await;
    assert!(rate_limit_hits >= 1);
}
