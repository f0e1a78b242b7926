use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use routecodex_provider_core::{ProviderCoreError, OAuthRefresher};
use serde::Deserialize;

use crate::client::shared_client;

/// OAuth device-flow config: `{deviceCodeURL, tokenURL, clientId,
/// clientSecret?, scopes}`.
#[derive(Debug, Clone)]
pub struct DeviceFlowConfig {
    pub device_code_url: String,
    pub token_url: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub scopes: Vec<String>,
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceAuthorization {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    #[serde(default = "default_interval")]
    pub interval: u64,
    pub expires_in: u64,
}

fn default_interval() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
    #[serde(default)]
    error: Option<String>,
}

const SESSION_TTL: Duration = Duration::from_secs(15 * 60);

struct DeviceSession {
    created_at: Instant,
}

static DEVICE_SESSIONS: OnceLock<RwLock<HashMap<String, DeviceSession>>> = OnceLock::new();

fn sessions() -> &'static RwLock<HashMap<String, DeviceSession>> {
    DEVICE_SESSIONS.get_or_init(|| RwLock::new(HashMap::new()))
}

fn prune_expired_sessions() {
    let mut sessions = sessions().write().unwrap();
    let now = Instant::now();
    sessions.retain(|_, session| now.duration_since(session.created_at) < SESSION_TTL);
}

/// Step 1 of the device flow: request a device/user code pair.
pub async fn start_device_authorization(
    config: &DeviceFlowConfig,
) -> Result<DeviceAuthorization, ProviderCoreError> {
    prune_expired_sessions();

    let client = shared_client(config.proxy.as_deref())?;
    let mut form = vec![("client_id", config.client_id.as_str())];
    let scope = config.scopes.join(" ");
    if !scope.is_empty() {
        form.push(("scope", scope.as_str()));
    }

    let response = client
        .post(&config.device_code_url)
        .form(&form)
        .send()
        .await
        .map_err(|err| ProviderCoreError::Other(err.to_string()))?;
    let authorization: DeviceAuthorization = response
        .json()
        .await
        .map_err(|err| ProviderCoreError::Other(err.to_string()))?;

    sessions().write().unwrap().insert(
        authorization.device_code.clone(),
        DeviceSession {
            created_at: Instant::now(),
        },
    );

    Ok(authorization)
}

/// Step 2: poll `tokenURL` at the server-specified `interval` until the
/// user approves, denies, or the device code expires.
pub async fn poll_for_token(
    config: &DeviceFlowConfig,
    authorization: &DeviceAuthorization,
) -> Result<(String, Option<String>, i64), ProviderCoreError> {
    let client = shared_client(config.proxy.as_deref())?;
    let deadline = Instant::now() + Duration::from_secs(authorization.expires_in);
    let mut interval = Duration::from_secs(authorization.interval.max(1));

    loop {
        if Instant::now() >= deadline {
            sessions().write().unwrap().remove(&authorization.device_code);
            return Err(ProviderCoreError::Other("device code expired".to_string()));
        }

        tokio::time::sleep(interval).await;

        let mut form = vec![
            ("client_id", config.client_id.as_str()),
            ("device_code", authorization.device_code.as_str()),
            ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
        ];
        if let Some(secret) = &config.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = client
            .post(&config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|err| ProviderCoreError::Other(err.to_string()))?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| ProviderCoreError::Other(err.to_string()))?;

        match token.error.as_deref() {
            Some("authorization_pending") => continue,
            Some("slow_down") => {
                interval += Duration::from_secs(5);
                continue;
            }
            Some(other) => {
                sessions().write().unwrap().remove(&authorization.device_code);
                return Err(ProviderCoreError::Other(format!("device flow failed: {other}")));
            }
            None => {
                sessions().write().unwrap().remove(&authorization.device_code);
                let expires_at_ms = now_ms() + token.expires_in * 1000;
                return Ok((token.access_token, token.refresh_token, expires_at_ms));
            }
        }
    }
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// `CredentialPool::refresh`'s vendor hook: exchanges a refresh token for
/// a new access token, independent of the initial device-flow
/// authorization.
pub struct DeviceFlowRefresher {
    config: DeviceFlowConfig,
}

impl DeviceFlowRefresher {
    pub fn new(config: DeviceFlowConfig) -> Arc<Self> {
        Arc::new(Self { config })
    }
}

#[async_trait]
impl OAuthRefresher for DeviceFlowRefresher {
    async fn refresh(
        &self,
        refresh_token: &str,
    ) -> Result<(String, Option<String>, i64), ProviderCoreError> {
        let client = shared_client(self.config.proxy.as_deref())?;
        let mut form = vec![
            ("client_id", self.config.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        if let Some(secret) = &self.config.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let response = client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|err| ProviderCoreError::Other(err.to_string()))?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| ProviderCoreError::Other(err.to_string()))?;

        if let Some(error) = token.error {
            return Err(ProviderCoreError::RefreshFailed(error));
        }

        let expires_at_ms = now_ms() + token.expires_in * 1000;
        Ok((token.access_token, token.refresh_token, expires_at_ms))
    }
}
