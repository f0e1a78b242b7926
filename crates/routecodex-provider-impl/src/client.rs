use std::sync::{Arc, OnceLock};

use routecodex_provider_core::ProviderCoreError;
use wreq::Proxy;

struct SharedClient {
    proxy: Option<String>,
    client: Arc<wreq::Client>,
}

static SHARED_CLIENT: OnceLock<SharedClient> = OnceLock::new();

/// One process-wide HTTP client. Providers share the process's egress
/// path; a single outbound proxy configuration is supported per process
/// rather than per-pipeline client pools.
pub fn shared_client(proxy: Option<&str>) -> Result<Arc<wreq::Client>, ProviderCoreError> {
    let proxy_owned = proxy.map(|value| value.to_string());
    if let Some(shared) = SHARED_CLIENT.get() {
        if shared.proxy != proxy_owned {
            return Err(ProviderCoreError::Other(
                "proxy mismatch: only a single global proxy is supported".to_string(),
            ));
        }
        return Ok(Arc::clone(&shared.client));
    }

    let mut builder = wreq::Client::builder();
    if let Some(proxy_url) = proxy {
        let proxy = Proxy::all(proxy_url).map_err(|err| ProviderCoreError::Other(err.to_string()))?;
        builder = builder.proxy(proxy);
    }

    let client = builder
        .build()
        .map_err(|err| ProviderCoreError::Other(err.to_string()))?;
    let shared = SharedClient {
        proxy: proxy_owned,
        client: Arc::new(client),
    };
    let _ = SHARED_CLIENT.set(shared);
    Ok(Arc::clone(
        &SHARED_CLIENT
            .get()
            .expect("shared client must be set")
            .client,
    ))
}
