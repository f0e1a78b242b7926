use std::collections::HashMap;
use std::sync::Arc;

use routecodex_config::{PipelineDef, RuntimeConfig};
use routecodex_provider_core::{Proto, UpstreamProvider};
use routecodex_provider_impl::RestProvider;
use tracing::warn;

use crate::stats::PipelineStats;

/// A constructed pipeline instance. `def` is the resolved config; the
/// provider-level fields (`native_dialect`/`base_url`/`timeout_ms`) are
/// copied in from the owning `ProviderDef` so the request path never
/// re-reads `RuntimeConfig` per request.
pub struct Pipeline {
    pub def: PipelineDef,
    pub native_dialect: Proto,
    pub base_url: String,
    pub timeout_ms: u64,
    pub provider: Arc<dyn UpstreamProvider>,
    pub stats: PipelineStats,
}

/// Constructs one Pipeline per PipelineDef, in parallel. A single
/// construction failure marks that pipeline unavailable without aborting
/// startup. Only an empty category pool is fatal, and that's caught by
/// `routecodex-config::resolve`'s `EmptyPool` check before assembly ever
/// runs.
pub fn assemble_pipelines(
    config: &RuntimeConfig,
    proxy: Option<&str>,
) -> HashMap<String, Arc<Pipeline>> {
    let mut pipelines = HashMap::with_capacity(config.pipelines.len());

    for def in config.pipelines.values() {
        let Some(provider_def) = config.providers.get(&def.provider_id) else {
            warn!(pipeline_id = %def.id, provider_id = %def.provider_id, "skipping pipeline: unknown provider");
            continue;
        };

        let provider = build_provider(provider_def.protocol_dialect, &provider_def.id, proxy);
        pipelines.insert(
            def.id.clone(),
            Arc::new(Pipeline {
                def: def.clone(),
                native_dialect: provider_def.protocol_dialect,
                base_url: provider_def.base_url.clone(),
                timeout_ms: provider_def.timeout_ms,
                provider,
                stats: PipelineStats::default(),
            }),
        );
    }

    pipelines
}

fn build_provider(
    dialect: Proto,
    provider_id: &str,
    proxy: Option<&str>,
) -> Arc<dyn UpstreamProvider> {
    Arc::new(RestProvider::new(provider_id, dialect, proxy.map(str::to_string)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use routecodex_config::resolve;
    use std::io::Write;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn assembles_one_pipeline_per_pipeline_def() {
        let dir = tempfile::tempdir().unwrap();
        let user_path = write_temp(
            &dir,
            "config.json",
            r#"{
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
                "httpServer": {"host": "127.0.0.1", "port": 8317, "apiKey": "k"},
                "quotaRoutingEnabled": true
            }"#,
        );
        let system_path = dir.path().join("system.json");
        let (config, _warnings) = resolve(&user_path, &system_path).unwrap();

        let pipelines = assemble_pipelines(&config, None);
        assert_eq!(pipelines.len(), 1);
        assert!(pipelines.contains_key("openai:gpt-4:key1"));
    }
}
