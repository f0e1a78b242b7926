pub mod error;
pub mod model;
pub mod raw;
pub mod resolve;

pub use error::ConfigError;
pub use model::{
    AuthKind, CredentialDef, HttpServerDef, PipelineDef, PoolEntry, ProviderDef, RuntimeConfig,
    SecretRef, Warning,
};
pub use resolve::resolve;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn minimal_user_config() -> &'static str {
        r#"{
            "providers": {
                "openai": {
                    "baseURL": "https://api.openai.example/v1",
                    "protocolDialect": "openaiChat",
                    "timeoutMs": 30000,
                    "headers": {},
                    "modelCatalog": ["gpt-4"],
                    "credentials": [
                        {"authKind": "apiKey", "secret": "sk-test"}
                    ]
                }
            },
            "routing": {
                "default": [{"provider": "openai"}]
            },
            "httpServer": {"host": "127.0.0.1", "port": 8317, "apiKey": "sekret"},
            "quotaRoutingEnabled": true
        }"#
    }

    #[test]
    fn resolves_single_provider_single_model() {
        let dir = tempfile::tempdir().unwrap();
        let user_path = write_temp(&dir, "config.json", minimal_user_config());
        let system_path = dir.path().join("system.json");

        let (runtime, warnings) = resolve(&user_path, &system_path).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(runtime.providers.len(), 1);
        assert_eq!(runtime.credentials.len(), 1);
        assert_eq!(runtime.pipelines.len(), 1);
        let pool = runtime.pool("default").unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].pipeline_id, "openai:gpt-4:key1");
        assert_eq!(runtime.http_server.port, 8317);
    }

    #[test]
    fn missing_api_key_warns_but_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let contents = minimal_user_config().replace(r#""apiKey": "sekret""#, r#""apiKey": null"#);
        let user_path = write_temp(&dir, "config.json", &contents);
        let system_path = dir.path().join("system.json");

        let (_runtime, warnings) = resolve(&user_path, &system_path).unwrap();
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn dangling_route_provider_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let contents = minimal_user_config().replace("\"openai\"}", "\"does-not-exist\"}");
        let user_path = write_temp(&dir, "config.json", &contents);
        let system_path = dir.path().join("system.json");

        let err = resolve(&user_path, &system_path).unwrap_err();
        assert!(matches!(err, ConfigError::DanglingRoute { .. }));
    }

    #[test]
    fn syntax_error_is_fatal_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let user_path = write_temp(&dir, "config.json", "{ not json");
        let system_path = dir.path().join("system.json");

        let err = resolve(&user_path, &system_path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
