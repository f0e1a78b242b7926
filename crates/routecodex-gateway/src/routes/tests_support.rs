#![cfg(test)]

use std::sync::Arc;

use routecodex_provider_core::{CredentialPool, EventHub};
use routecodex_router::RouterState;

use crate::state::GatewayState;

/// Minimal one-provider, one-pipeline config shared by route handler tests.
const FIXTURE_CONFIG: &str = r#"{
    "providers": {
        "openai": {
            "baseURL": "https://api.openai.example/v1",
            "protocolDialect": "openaiChat",
            "timeoutMs": 30000,
            "headers": {},
            "modelCatalog": ["gpt-4"],
            "credentials": [{"authKind": "apiKey", "secret": "sk-test"}]
        }
    },
    "routing": {"default": [{"provider": "openai"}]},
    "httpServer": {"host": "127.0.0.1", "port": 8317, "apiKey": "test-key"},
    "quotaRoutingEnabled": true
}"#;

/// Builds a `GatewayState` backed by the fixture config above, with no
/// credential pool refresher and an empty classification rule list.
pub fn test_state() -> Arc<GatewayState> {
    let dir = tempfile::tempdir().unwrap();
    let user_path = dir.path().join("config.json");
    std::fs::write(&user_path, FIXTURE_CONFIG).unwrap();
    let system_path = dir.path().join("system.json");

    let (config, _warnings) = routecodex_config::resolve(&user_path, &system_path).unwrap();

    let events = EventHub::new(16);
    let credentials = CredentialPool::new(events, None);
    let router_state = RouterState::new(config, credentials, Vec::new(), None);

    let (state, _shutdown_rx) = GatewayState::new(router_state, Some("test-key".to_string()), user_path, system_path);
    state
}
