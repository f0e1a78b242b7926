use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use routecodex_provider_core::{
    Credential, CredentialLifecycleState, CredentialPool, CredentialSecret, EventHub,
    OAuthRefresher, ProviderCoreError,
};

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Counts how many times the wire-level refresh call would have fired,
/// with a short sleep so concurrent callers actually overlap.
struct CountingRefresher {
    calls: AtomicU64,
}

#[async_trait]
impl OAuthRefresher for CountingRefresher {
    async fn refresh(
        &self,
        _refresh_token: &str,
    ) -> Result<(String, Option<String>, i64), ProviderCoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        Ok((
            "new-access-token".to_string(),
            Some("new-refresh-token".to_string()),
            now_ms() + 3_600_000,
        ))
    }
}

/// Ten concurrent `acquire()` calls against the same expired OAuth
/// credential must coalesce into exactly one upstream refresh, and every
/// caller must still get back a usable (refreshed) credential.
#[tokio::test]
async fn concurrent_acquires_coalesce_into_one_refresh() {
    let refresher = Arc::new(CountingRefresher {
        calls: AtomicU64::new(0),
    });
    let events = EventHub::new(16);
    let pool = CredentialPool::new(events, Some(refresher.clone() as Arc<dyn OAuthRefresher>));

    pool.insert(Credential {
        id: "oauth-cred".to_string(),
        provider_id: "vendor".to_string(),
        alias: "key1".to_string(),
        secret: CredentialSecret::OAuthToken {
            access_token: "stale".to_string(),
            refresh_token: Some("refresh-tok".to_string()),
            expires_at_ms: Some(now_ms() - 1_000),
        },
        state: CredentialLifecycleState::Ready,
        last_refresh_at_ms: None,
    })
    .await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let pool = Arc::clone(&pool);
        handles.push(tokio::spawn(async move { pool.acquire("vendor").await }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_some() {
            successes += 1;
        }
    }

    assert_eq!(successes, 10);
    assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
}

/// A credential with no refresh token on file fails its refresh attempt
/// and is skipped by `acquire`, rather than handed out stale.
#[tokio::test]
async fn acquire_skips_credential_that_cannot_refresh() {
    let events = EventHub::new(16);
    let pool = CredentialPool::new(events, None);

    pool.insert(Credential {
        id: "broken".to_string(),
        provider_id: "vendor".to_string(),
        alias: "key1".to_string(),
        secret: CredentialSecret::OAuthToken {
            access_token: "stale".to_string(),
            refresh_token: None,
            expires_at_ms: Some(now_ms() - 1_000),
        },
        state: CredentialLifecycleState::Ready,
        last_refresh_at_ms: None,
    })
    .await;

    assert!(pool.acquire("vendor").await.is_none());
}
