use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;

use super::state::{BlockRecord, CredentialKey, HealthEntry, UnavailableReason};
use crate::events::{Event, EventHub};

/// Provider health tracker: blocked/unblocked state, consecutive failure
/// counts, and rate-limit hit counters per credential. Guarded by a single
/// lock; every operation is O(1).
pub struct HealthManager {
    entries: RwLock<HashMap<CredentialKey, HealthEntry>>,
    events: EventHub,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

impl HealthManager {
    pub fn new(events: EventHub) -> Arc<Self> {
        Arc::new(Self {
            entries: RwLock::new(HashMap::new()),
            events,
        })
    }

    /// First call records the block; later calls while still blocked are
    /// no-ops.
    pub async fn block(
        &self,
        key: &CredentialKey,
        reason: UnavailableReason,
        metadata: Option<String>,
        until: Option<Instant>,
    ) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(key.clone()).or_default();
        if entry.blocked.is_some() {
            return;
        }
        entry.blocked = Some(BlockRecord {
            reason,
            since_ms: now_ms(),
            metadata,
            until,
        });
        drop(entries);
        self.events.emit(Event::CredentialBlocked {
            credential_key: key.clone(),
            reason,
        });
    }

    pub async fn is_blocked(&self, key: &CredentialKey) -> bool {
        self.entries
            .read()
            .await
            .get(key)
            .is_some_and(HealthEntry::is_blocked)
    }

    pub async fn clear(&self, key: &CredentialKey) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(key) {
            if entry.blocked.take().is_some() {
                entry.consecutive_failures = 0;
                drop(entries);
                self.events.emit(Event::CredentialUnblocked {
                    credential_key: key.clone(),
                });
                return;
            }
        }
    }

    pub async fn record_rate_limit_hit(&self, key: &CredentialKey) -> u64 {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(key.clone()).or_default();
        entry.rate_limit_hits.count += 1;
        entry.rate_limit_hits.last_hit_ms = Some(now_ms());
        entry.rate_limit_hits.count
    }

    pub async fn reset_rate_limit(&self, key: &CredentialKey) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.rate_limit_hits = Default::default();
        }
    }

    /// Bumps the failure counter used to move a pipeline Active → Degraded
    /// after 3 consecutive failures.
    pub async fn record_failure(&self, key: &CredentialKey) -> u32 {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(key.clone()).or_default();
        entry.consecutive_failures += 1;
        entry.consecutive_failures
    }

    pub async fn record_success(&self, key: &CredentialKey) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.consecutive_failures = 0;
        }
    }

    pub async fn consecutive_failures(&self, key: &CredentialKey) -> u32 {
        self.entries
            .read()
            .await
            .get(key)
            .map(|e| e.consecutive_failures)
            .unwrap_or(0)
    }

    pub async fn rate_limit_hit_count(&self, key: &CredentialKey) -> u64 {
        self.entries
            .read()
            .await
            .get(key)
            .map(|e| e.rate_limit_hits.count)
            .unwrap_or(0)
    }

    /// Spawns the background recovery sweep: periodically checks whether
    /// a time-boxed block has passed its `until` instant and, if so,
    /// fires a recovery-probe-due event so the router can re-probe it.
    /// Does not auto-clear the block; only an explicit `clear()` does
    /// that.
    pub fn spawn_recovery_sweep(self: &Arc<Self>, interval: std::time::Duration) {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let due: Vec<CredentialKey> = {
                    let entries = manager.entries.read().await;
                    let now = Instant::now();
                    entries
                        .iter()
                        .filter(|(_, entry)| entry.due_for_recovery_probe(now))
                        .map(|(key, _)| key.clone())
                        .collect()
                };
                for key in due {
                    manager.events.emit(Event::RecoveryProbeDue {
                        credential_key: key,
                    });
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn block_then_clear_round_trips_to_unblocked() {
        let manager = HealthManager::new(EventHub::new(16));
        let key = "openai:key1".to_string();
        manager
            .block(&key, UnavailableReason::RateLimit, None, None)
            .await;
        assert!(manager.is_blocked(&key).await);
        manager.clear(&key).await;
        assert!(!manager.is_blocked(&key).await);
    }

    #[tokio::test]
    async fn second_block_call_is_a_no_op() {
        let manager = HealthManager::new(EventHub::new(16));
        let key = "openai:key1".to_string();
        manager
            .block(&key, UnavailableReason::RateLimit, None, None)
            .await;
        manager
            .block(&key, UnavailableReason::AuthInvalid, None, None)
            .await;
        let entries = manager.entries.read().await;
        assert_eq!(entries[&key].blocked.as_ref().unwrap().reason, UnavailableReason::RateLimit);
    }

    #[tokio::test]
    async fn rate_limit_hits_accumulate_independently_of_blocking() {
        let manager = HealthManager::new(EventHub::new(16));
        let key = "openai:key1".to_string();
        assert_eq!(manager.record_rate_limit_hit(&key).await, 1);
        assert_eq!(manager.record_rate_limit_hit(&key).await, 2);
        assert!(!manager.is_blocked(&key).await);
    }
}
