use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::{Mutex, RwLock};

use super::health::HealthManager;
use super::state::{CredentialId, CredentialLifecycleState, CredentialKey, UnavailableReason};
use crate::errors::ProviderCoreError;
use crate::events::{Event, EventHub};

/// Eagerly refresh an OAuth token when `now + skew >= expiresAt`.
pub const REFRESH_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone)]
pub enum CredentialSecret {
    ApiKey(String),
    OAuthToken {
        access_token: String,
        refresh_token: Option<String>,
        expires_at_ms: Option<i64>,
    },
}

/// A stored credential. The alias (`key1`..`keyN`) is the only identifier
/// that may appear in logs; `secret` never is.
#[derive(Debug, Clone)]
pub struct Credential {
    pub id: CredentialId,
    pub provider_id: String,
    pub alias: String,
    pub secret: CredentialSecret,
    pub state: CredentialLifecycleState,
    pub last_refresh_at_ms: Option<i64>,
}

impl Credential {
    pub fn key(&self) -> CredentialKey {
        format!("{}:{}", self.provider_id, self.id)
    }

    fn needs_refresh(&self, now_ms: i64) -> bool {
        match &self.secret {
            CredentialSecret::ApiKey(_) => false,
            CredentialSecret::OAuthToken { expires_at_ms, .. } => match expires_at_ms {
                Some(exp) => now_ms + REFRESH_SKEW_SECS * 1000 >= *exp,
                None => false,
            },
        }
    }
}

/// A non-blocking read of a credential's current secret + state,
/// returned by `get()`.
#[derive(Debug, Clone)]
pub struct CredentialSnapshot {
    pub id: CredentialId,
    pub provider_id: String,
    pub alias: String,
    pub secret: CredentialSecret,
    pub state: CredentialLifecycleState,
}

/// An async, vendor-specific OAuth refresher. Implemented per provider in
/// `routecodex-provider-impl`; the pool only orchestrates coalescing and
/// persistence, never the wire protocol itself.
#[async_trait::async_trait]
pub trait OAuthRefresher: Send + Sync {
    async fn refresh(
        &self,
        refresh_token: &str,
    ) -> Result<(String, Option<String>, i64), ProviderCoreError>;
}

pub struct CredentialPool {
    credentials: RwLock<HashMap<CredentialId, Credential>>,
    by_provider: RwLock<HashMap<String, Vec<CredentialId>>>,
    refresh_locks: RwLock<HashMap<CredentialId, Arc<Mutex<()>>>>,
    pub health: Arc<HealthManager>,
    events: EventHub,
    refresher: Option<Arc<dyn OAuthRefresher>>,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl CredentialPool {
    pub fn new(events: EventHub, refresher: Option<Arc<dyn OAuthRefresher>>) -> Arc<Self> {
        Arc::new(Self {
            credentials: RwLock::new(HashMap::new()),
            by_provider: RwLock::new(HashMap::new()),
            refresh_locks: RwLock::new(HashMap::new()),
            health: HealthManager::new(events.clone()),
            events,
            refresher,
        })
    }

    pub async fn insert(&self, credential: Credential) {
        let provider_id = credential.provider_id.clone();
        let id = credential.id.clone();
        self.credentials.write().await.insert(id.clone(), credential);
        self.by_provider
            .write()
            .await
            .entry(provider_id)
            .or_default()
            .push(id);
    }

    /// Non-blocking: returns the current secret + state.
    pub async fn get(&self, credential_id: &CredentialId) -> Option<CredentialSnapshot> {
        self.credentials.read().await.get(credential_id).map(|c| CredentialSnapshot {
            id: c.id.clone(),
            provider_id: c.provider_id.clone(),
            alias: c.alias.clone(),
            secret: c.secret.clone(),
            state: c.state,
        })
    }

    /// First non-blocked credential registered for the provider, in alias
    /// order. A credential whose OAuth token is due for refresh is
    /// refreshed eagerly before being handed out; if the refresh fails the
    /// credential is skipped in favor of the next one.
    pub async fn acquire(&self, provider_id: &str) -> Option<CredentialSnapshot> {
        let ids = self.by_provider.read().await.get(provider_id).cloned()?;
        for id in ids {
            let (key, state_blocked, needs_refresh) = {
                let credentials = self.credentials.read().await;
                let Some(credential) = credentials.get(&id) else {
                    continue;
                };
                (
                    credential.key(),
                    matches!(credential.state, CredentialLifecycleState::Blocked),
                    credential.needs_refresh(now_ms()),
                )
            };

            if state_blocked || self.health.is_blocked(&key).await {
                continue;
            }

            if needs_refresh && self.refresh(&id).await.is_err() {
                continue;
            }

            let credentials = self.credentials.read().await;
            if let Some(credential) = credentials.get(&id) {
                if !matches!(credential.state, CredentialLifecycleState::Blocked) {
                    return Some(CredentialSnapshot {
                        id: credential.id.clone(),
                        provider_id: credential.provider_id.clone(),
                        alias: credential.alias.clone(),
                        secret: credential.secret.clone(),
                        state: credential.state,
                    });
                }
            }
        }
        None
    }

    async fn lock_for(&self, credential_id: &CredentialId) -> Arc<Mutex<()>> {
        if let Some(lock) = self.refresh_locks.read().await.get(credential_id) {
            return Arc::clone(lock);
        }
        let mut locks = self.refresh_locks.write().await;
        Arc::clone(
            locks
                .entry(credential_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Async, idempotent, at-most-one concurrent refresh per credential
    /// id. Concurrent callers block on the same per-id mutex and all
    /// observe the coalesced result.
    pub async fn refresh(&self, credential_id: &CredentialId) -> Result<(), ProviderCoreError> {
        let lock = self.lock_for(credential_id).await;
        let _guard = lock.lock().await;

        let (refresh_token, already_fresh) = {
            let credentials = self.credentials.read().await;
            let credential = credentials
                .get(credential_id)
                .ok_or_else(|| ProviderCoreError::UnknownCredential(credential_id.clone()))?;
            match &credential.secret {
                CredentialSecret::ApiKey(_) => return Ok(()),
                CredentialSecret::OAuthToken { refresh_token, .. } => {
                    (refresh_token.clone(), !credential.needs_refresh(now_ms()))
                }
            }
        };

        if already_fresh {
            return Ok(());
        }

        let refresh_token = refresh_token.ok_or_else(|| {
            ProviderCoreError::RefreshFailed("no refresh token on file".to_string())
        })?;
        let refresher = self
            .refresher
            .clone()
            .ok_or_else(|| ProviderCoreError::RefreshFailed("no refresher configured".to_string()))?;

        {
            let mut credentials = self.credentials.write().await;
            if let Some(credential) = credentials.get_mut(credential_id) {
                credential.state = CredentialLifecycleState::Refreshing;
            }
        }

        match refresher.refresh(&refresh_token).await {
            Ok((access_token, new_refresh_token, expires_at_ms)) => {
                let mut credentials = self.credentials.write().await;
                if let Some(credential) = credentials.get_mut(credential_id) {
                    credential.secret = CredentialSecret::OAuthToken {
                        access_token,
                        refresh_token: new_refresh_token.or(Some(refresh_token)),
                        expires_at_ms: Some(expires_at_ms),
                    };
                    credential.state = CredentialLifecycleState::Ready;
                    credential.last_refresh_at_ms = Some(now_ms());
                    let key = credential.key();
                    drop(credentials);
                    self.health.clear(&key).await;
                    self.events.emit(Event::CredentialRefreshed {
                        credential_id: credential_id.clone(),
                    });
                }
                Ok(())
            }
            Err(err) => {
                let key = {
                    let mut credentials = self.credentials.write().await;
                    let credential = credentials
                        .get_mut(credential_id)
                        .ok_or_else(|| ProviderCoreError::UnknownCredential(credential_id.clone()))?;
                    credential.state = CredentialLifecycleState::Blocked;
                    credential.key()
                };
                self.health
                    .block(&key, UnavailableReason::RefreshFailed, Some(err.to_string()), None)
                    .await;
                Err(err)
            }
        }
    }

    pub async fn mark_unavailable(
        &self,
        credential_id: &CredentialId,
        reason: UnavailableReason,
        until: Option<std::time::Instant>,
    ) {
        let key = {
            let credentials = self.credentials.read().await;
            match credentials.get(credential_id) {
                Some(c) => c.key(),
                None => return,
            }
        };
        self.health.block(&key, reason, None, until).await;
    }
}
