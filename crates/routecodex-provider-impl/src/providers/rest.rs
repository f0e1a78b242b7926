use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use routecodex_provider_core::{
    ProviderCoreError, Proto, UpstreamCallContext, UpstreamFailure, UpstreamOutcome,
    UpstreamProvider,
};
use tokio::sync::mpsc;

use crate::client::shared_client;

/// A generic OpenAI-compatible or Anthropic-compatible REST upstream.
/// Concrete providers are just a `(name, native_proto, base_url)` triple
/// plus whatever static headers the vendor requires. The wire format is
/// already the provider's native dialect by the time it reaches here,
/// because the compatibility stage did its work upstream of the provider
/// stage.
pub struct RestProvider {
    name: String,
    native_proto: Proto,
    proxy: Option<String>,
}

impl RestProvider {
    pub fn new(name: impl Into<String>, native_proto: Proto, proxy: Option<String>) -> Self {
        Self {
            name: name.into(),
            native_proto,
            proxy,
        }
    }
}

#[async_trait]
impl UpstreamProvider for RestProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn native_proto(&self) -> Proto {
        self.native_proto
    }

    async fn execute(&self, ctx: UpstreamCallContext) -> Result<UpstreamOutcome, ProviderCoreError> {
        let client = shared_client(self.proxy.as_deref())?;
        let url = format!("{}{}", ctx.base_url.trim_end_matches('/'), ctx.path);

        let mut builder = client.post(&url).timeout(ctx.timeout).body(ctx.body.to_vec());
        for (name, value) in &ctx.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                ProviderCoreError::Other(format!("timeout: {err}"))
            } else if err.is_connect() {
                ProviderCoreError::Other(format!("connect failed: {err}"))
            } else {
                ProviderCoreError::Other(err.to_string())
            }
        })?;

        let status = response.status().as_u16();

        if !ctx.stream {
            let body = response
                .bytes()
                .await
                .map_err(|err| ProviderCoreError::Other(err.to_string()))?;
            return Ok(UpstreamOutcome::Buffered { status, body });
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let item = chunk.map_err(|err| ProviderCoreError::Other(err.to_string()));
                if tx.send(item).await.is_err() {
                    break;
                }
            }
        });
        Ok(UpstreamOutcome::Streamed { status, chunks: rx })
    }
}

pub fn failure_from_status(status: u16, retry_after_secs: Option<u64>) -> UpstreamFailure {
    UpstreamFailure::Status {
        code: status,
        retry_after_secs,
    }
}

pub fn parse_retry_after(value: Option<&str>) -> Option<u64> {
    value.and_then(|v| v.parse::<u64>().ok())
}

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(120);
