use std::collections::HashMap;

use routecodex_provider_core::Proto;
use serde::Deserialize;
use serde_json::Value;

/// On-disk shape of the user config (`config.json`). Parsed strictly:
/// there is no recovery on syntax errors.
#[derive(Debug, Deserialize)]
pub struct RawUserConfig {
    pub providers: HashMap<String, RawProviderDef>,
    pub routing: HashMap<String, Vec<RawPoolEntry>>,
    #[serde(rename = "httpServer")]
    pub http_server: RawHttpServer,
    #[serde(rename = "quotaRoutingEnabled", default)]
    pub quota_routing_enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct RawProviderDef {
    #[serde(rename = "baseURL")]
    pub base_url: String,
    #[serde(rename = "protocolDialect")]
    pub protocol_dialect: Proto,
    #[serde(rename = "timeoutMs", default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(rename = "modelCatalog")]
    pub model_catalog: Vec<String>,
    pub credentials: Vec<RawCredentialDef>,
}

fn default_timeout_ms() -> u64 {
    120_000
}

#[derive(Debug, Deserialize)]
#[serde(tag = "authKind", rename_all = "camelCase")]
pub enum RawCredentialDef {
    ApiKey {
        secret: Option<String>,
        #[serde(rename = "secretFile")]
        secret_file: Option<String>,
    },
    OauthDevice {
        #[serde(rename = "deviceCodeURL")]
        device_code_url: String,
        #[serde(rename = "tokenURL")]
        token_url: String,
        #[serde(rename = "clientId")]
        client_id: String,
        #[serde(rename = "clientSecret")]
        client_secret: Option<String>,
        #[serde(default)]
        scopes: Vec<String>,
        #[serde(rename = "tokenFile")]
        token_file: String,
    },
    OauthPkce {
        #[serde(rename = "authorizeURL")]
        authorize_url: String,
        #[serde(rename = "tokenURL")]
        token_url: String,
        #[serde(rename = "clientId")]
        client_id: String,
        #[serde(rename = "tokenFile")]
        token_file: String,
    },
    None,
}

/// A pool entry in `routing[category]`. Omitted `model`/`credentialAlias`
/// expand to every model/alias the provider declares, via the Cartesian
/// expansion in `resolve()`.
#[derive(Debug, Deserialize)]
pub struct RawPoolEntry {
    pub provider: String,
    pub model: Option<String>,
    #[serde(rename = "credentialAlias")]
    pub credential_alias: Option<String>,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct RawHttpServer {
    pub host: String,
    pub port: u32,
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
}

/// On-disk shape of the system modules config (the second `resolve()`
/// argument). Keyed by providerId; each stage's config is an opaque blob
/// the corresponding `routecodex-router` stage interprets.
#[derive(Debug, Deserialize, Default)]
pub struct RawSystemConfig {
    #[serde(default)]
    pub stages: HashMap<String, RawStageConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RawStageConfig {
    #[serde(rename = "llmSwitch", default)]
    pub llm_switch: Option<Value>,
    #[serde(default)]
    pub workflow: Option<Value>,
    #[serde(default)]
    pub compatibility: Option<Value>,
    #[serde(default)]
    pub provider: Option<Value>,
}
