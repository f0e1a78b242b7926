use std::collections::HashMap;

use routecodex_provider_core::Proto;
use serde_json::Value;

/// A resolved provider definition.
#[derive(Debug, Clone)]
pub struct ProviderDef {
    pub id: String,
    pub base_url: String,
    pub protocol_dialect: Proto,
    pub timeout_ms: u64,
    pub headers: HashMap<String, String>,
    pub model_catalog: Vec<String>,
}

/// A resolved credential definition. `secret_ref` never carries the raw
/// secret value in a loggable form: only the alias (`key1`..`keyN`) is
/// safe to log. The resolved secret lives behind `SecretRef` and is read
/// into the `CredentialPool` at startup, never re-logged.
#[derive(Debug, Clone)]
pub struct CredentialDef {
    pub id: String,
    pub provider_id: String,
    pub auth_kind: AuthKind,
    pub alias_index: String,
    pub secret_ref: SecretRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    ApiKey,
    OauthDevice,
    OauthPkce,
    None,
}

#[derive(Debug, Clone)]
pub enum SecretRef {
    ApiKey(String),
    OauthDevice {
        device_code_url: String,
        token_url: String,
        client_id: String,
        client_secret: Option<String>,
        scopes: Vec<String>,
        token_file: String,
    },
    OauthPkce {
        authorize_url: String,
        token_url: String,
        client_id: String,
        token_file: String,
    },
    None,
}

/// A resolved pipeline definition. `id` is the Cartesian-expansion key
/// `"{providerId}:{modelId}:{credentialAlias}"`.
#[derive(Debug, Clone)]
pub struct PipelineDef {
    pub id: String,
    pub provider_id: String,
    pub model_id: String,
    pub credential_id: String,
    pub llm_switch_config: Option<Value>,
    pub workflow_config: Option<Value>,
    pub compatibility_config: Option<Value>,
    pub provider_config: Option<Value>,
}

/// A resolved pool entry: a pipeline id plus the weight its `RawPoolEntry`
/// declared, used for weighted round-robin selection.
#[derive(Debug, Clone)]
pub struct PoolEntry {
    pub pipeline_id: String,
    pub weight: u32,
}

#[derive(Debug, Clone)]
pub struct HttpServerDef {
    pub host: String,
    pub port: u16,
    pub api_key: Option<String>,
}

/// The immutable snapshot config resolution produces and the router
/// consumes.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub providers: HashMap<String, ProviderDef>,
    pub credentials: HashMap<String, CredentialDef>,
    pub pipelines: HashMap<String, PipelineDef>,
    pub routing: HashMap<String, Vec<PoolEntry>>,
    pub http_server: HttpServerDef,
    pub quota_routing_enabled: bool,
}

impl RuntimeConfig {
    pub fn pool(&self, category: &str) -> Option<&[PoolEntry]> {
        self.routing.get(category).map(Vec::as_slice)
    }
}

/// A non-fatal observation surfaced alongside a successful `resolve()`.
pub type Warning = String;
