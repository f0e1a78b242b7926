use std::sync::Arc;
use std::time::Duration;

use routecodex_config::{AuthKind, RuntimeConfig, SecretRef};
use routecodex_provider_core::{
    Credential, CredentialLifecycleState, CredentialPool, CredentialSecret, Event, EventHub,
    HealthManager, OAuthRefresher, TracingEventSink,
};
use routecodex_provider_impl::{DeviceFlowConfig, DeviceFlowRefresher};
use serde::Deserialize;

/// Recovery sweep cadence: how often a blocked credential's `until` is
/// checked for expiry. Chosen as a balance between prompt recovery and
/// lock contention on the health map.
const RECOVERY_SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// On-disk shape of a device-flow token file: the same three fields
/// `CredentialSecret::OAuthToken` carries in memory.
#[derive(Debug, Deserialize)]
struct StoredToken {
    access_token: String,
    refresh_token: Option<String>,
    expires_at_ms: Option<i64>,
}

fn read_token_file(path: &str) -> Option<StoredToken> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Builds the `CredentialPool` the router needs from the resolved
/// `RuntimeConfig.credentials`. A single `OAuthRefresher` is shared
/// pool-wide, mirroring `CredentialPool::new`'s one-refresher shape,
/// built from the first OAuth-device credential found, since this
/// gateway's config format only ever needs one vendor's device-flow
/// client per deployment in practice.
pub async fn build_credential_pool(config: &RuntimeConfig, proxy: Option<&str>) -> Arc<CredentialPool> {
    let events = EventHub::new(256);
    events.add_sink(Arc::new(TracingEventSink)).await;
    let probe_rx = events.subscribe();

    let refresher = config
        .credentials
        .values()
        .find_map(|def| match &def.secret_ref {
            SecretRef::OauthDevice {
                token_url,
                client_id,
                client_secret,
                ..
            } => Some(DeviceFlowRefresher::new(DeviceFlowConfig {
                device_code_url: String::new(),
                token_url: token_url.clone(),
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                scopes: Vec::new(),
                proxy: proxy.map(str::to_string),
            }) as Arc<dyn OAuthRefresher>),
            _ => None,
        });

    let pool = CredentialPool::new(events, refresher);
    pool.health.spawn_recovery_sweep(RECOVERY_SWEEP_INTERVAL);
    spawn_recovery_probe_listener(probe_rx, Arc::clone(&pool.health));

    for def in config.credentials.values() {
        let (secret, state, last_refresh_at_ms) = match &def.secret_ref {
            SecretRef::ApiKey(value) => (CredentialSecret::ApiKey(value.clone()), CredentialLifecycleState::Ready, None),
            SecretRef::OauthDevice { token_file, .. } | SecretRef::OauthPkce { token_file, .. } => {
                match read_token_file(token_file) {
                    Some(stored) => (
                        CredentialSecret::OAuthToken {
                            access_token: stored.access_token,
                            refresh_token: stored.refresh_token,
                            expires_at_ms: stored.expires_at_ms,
                        },
                        CredentialLifecycleState::Ready,
                        stored.expires_at_ms,
                    ),
                    None => {
                        tracing::warn!(credential_id = %def.id, token_file, "no token file on disk; credential starts blocked pending device authorization");
                        (
                            CredentialSecret::OAuthToken {
                                access_token: String::new(),
                                refresh_token: None,
                                expires_at_ms: None,
                            },
                            CredentialLifecycleState::Blocked,
                            None,
                        )
                    }
                }
            }
            // `AuthKind::None` upstreams (e.g. a local model server) need no
            // secret material; an empty api key never gets sent as a header
            // value upstream providers would reject it on.
            SecretRef::None => (CredentialSecret::ApiKey(String::new()), CredentialLifecycleState::Ready, None),
        };

        debug_assert!(matches!(def.auth_kind, AuthKind::ApiKey | AuthKind::OauthDevice | AuthKind::OauthPkce | AuthKind::None));

        pool.insert(Credential {
            id: def.id.clone(),
            provider_id: def.provider_id.clone(),
            alias: def.alias_index.clone(),
            secret,
            state,
            last_refresh_at_ms,
        })
        .await;
    }

    pool
}

/// Listens for `Event::RecoveryProbeDue` (emitted by `HealthManager`'s
/// recovery sweep) and clears the named credential's block state. Without
/// this, a time-boxed block never self-expires: `HealthEntry::is_blocked`
/// only looks at whether `clear()` has been called, not whether `until`
/// has passed.
fn spawn_recovery_probe_listener(
    mut events: tokio::sync::broadcast::Receiver<Event>,
    health: Arc<HealthManager>,
) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(Event::RecoveryProbeDue { credential_key }) => {
                    health.clear(&credential_key).await;
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}
