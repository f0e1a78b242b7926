use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use routecodex_config::RuntimeConfig;
use routecodex_provider_core::CredentialPool;
use tokio::sync::Mutex;

use crate::assembly::{assemble_pipelines, Pipeline};
use crate::classify::ClassificationRule;
use crate::errors::RouterError;

/// Per-pipeline state machine: `Active -> Degraded -> Excluded -> Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Active,
    Degraded,
    Excluded,
}

struct FailureWindow {
    state: PipelineState,
    failures: VecDeque<Instant>,
}

impl Default for FailureWindow {
    fn default() -> Self {
        Self {
            state: PipelineState::Active,
            failures: VecDeque::new(),
        }
    }
}

const ROLLING_WINDOW: Duration = Duration::from_secs(60);
const DEGRADE_THRESHOLD: usize = 3;

/// Holds the swappable `RuntimeConfig`/`Pipeline` set plus the per-pipeline
/// health-derived state machine and round-robin cursors. The config and
/// pipeline map are each replaced wholesale on reload, never mutated in
/// place.
pub struct RouterState {
    config: ArcSwap<RuntimeConfig>,
    pipelines: ArcSwap<HashMap<String, Arc<Pipeline>>>,
    pub credentials: Arc<CredentialPool>,
    pub rules: Vec<ClassificationRule>,
    failure_windows: Mutex<HashMap<String, FailureWindow>>,
    round_robin_cursors: Mutex<HashMap<String, AtomicUsize>>,
    proxy: Option<String>,
}

impl RouterState {
    pub fn new(
        config: RuntimeConfig,
        credentials: Arc<CredentialPool>,
        rules: Vec<ClassificationRule>,
        proxy: Option<String>,
    ) -> Arc<Self> {
        let pipelines = assemble_pipelines(&config, proxy.as_deref());
        Self::with_pipelines(config, credentials, rules, pipelines, proxy)
    }

    /// Like `new`, but installs a caller-assembled pipeline map instead of
    /// building one from `config` via `assemble_pipelines`. Lets tests
    /// substitute a mock `UpstreamProvider` for the real REST client.
    pub fn with_pipelines(
        config: RuntimeConfig,
        credentials: Arc<CredentialPool>,
        rules: Vec<ClassificationRule>,
        pipelines: HashMap<String, Arc<Pipeline>>,
        proxy: Option<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config: ArcSwap::new(Arc::new(config)),
            pipelines: ArcSwap::new(Arc::new(pipelines)),
            credentials,
            rules,
            failure_windows: Mutex::new(HashMap::new()),
            round_robin_cursors: Mutex::new(HashMap::new()),
            proxy,
        })
    }

    pub fn config(&self) -> Arc<RuntimeConfig> {
        self.config.load_full()
    }

    /// An in-flight request completes under the snapshot it started on:
    /// callers capture this once per request, not once per stage.
    pub fn pipelines(&self) -> Arc<HashMap<String, Arc<Pipeline>>> {
        self.pipelines.load_full()
    }

    pub fn known_categories(&self) -> Vec<String> {
        self.config().routing.keys().cloned().collect()
    }

    /// Swaps in a newly resolved config + freshly assembled pipelines.
    /// Both an explicit reload request and an external restart go
    /// through this.
    pub fn apply(&self, config: RuntimeConfig) {
        let pipelines = assemble_pipelines(&config, self.proxy.as_deref());
        self.config.store(Arc::new(config));
        self.pipelines.store(Arc::new(pipelines));
    }

    pub async fn record_success(&self, pipeline_id: &str) {
        let mut windows = self.failure_windows.lock().await;
        let entry = windows.entry(pipeline_id.to_string()).or_default();
        entry.failures.clear();
        if entry.state == PipelineState::Degraded {
            entry.state = PipelineState::Active;
        }
    }

    /// `Active -> Degraded` after `consecutiveFailures >= 3` in a rolling
    /// 60s window; `Degraded -> Excluded` is driven by the credential's
    /// own block state, checked at selection time.
    pub async fn record_failure(&self, pipeline_id: &str) {
        let mut windows = self.failure_windows.lock().await;
        let entry = windows.entry(pipeline_id.to_string()).or_default();
        let now = Instant::now();
        entry.failures.push_back(now);
        while let Some(oldest) = entry.failures.front() {
            if now.duration_since(*oldest) > ROLLING_WINDOW {
                entry.failures.pop_front();
            } else {
                break;
            }
        }
        if entry.failures.len() >= DEGRADE_THRESHOLD && entry.state == PipelineState::Active {
            entry.state = PipelineState::Degraded;
        }
    }

    async fn state_of(&self, pipeline_id: &str) -> PipelineState {
        self.failure_windows
            .lock()
            .await
            .get(pipeline_id)
            .map(|w| w.state)
            .unwrap_or(PipelineState::Active)
    }

    /// Selection order: admission -> health -> model match, then weighted
    /// round-robin with least-recent-use tie-break over the survivors.
    /// `excluded` carries pipeline ids the router already tried this
    /// request, for failover.
    pub async fn select(
        &self,
        category: &str,
        requested_model: Option<&str>,
        excluded: &[String],
    ) -> Result<Arc<Pipeline>, RouterError> {
        let config = self.config();
        let pipelines = self.pipelines();
        let pool = config
            .pool(category)
            .ok_or_else(|| RouterError::Admission(format!("no pool configured for category {category:?}")))?;

        let mut candidates = Vec::new();
        for entry in pool {
            if excluded.iter().any(|id| id == &entry.pipeline_id) {
                continue;
            }
            let Some(pipeline) = pipelines.get(&entry.pipeline_id) else {
                continue;
            };

            if let Some(model) = requested_model {
                if pipeline.def.model_id != model {
                    continue;
                }
            }

            // Admission filter.
            if config.quota_routing_enabled {
                let Some(credential) = config.credentials.get(&pipeline.def.credential_id) else {
                    continue;
                };
                if self.credentials.health.is_blocked(&format!(
                    "{}:{}",
                    credential.provider_id, credential.id
                )).await
                {
                    continue;
                }
            }

            // Health filter: Excluded pipelines drop out; Degraded
            // pipelines stay eligible but rank behind Active ones.
            let state = self.state_of(&entry.pipeline_id).await;
            if state == PipelineState::Excluded {
                continue;
            }

            candidates.push((entry, Arc::clone(pipeline), state));
        }

        if candidates.is_empty() {
            return Err(RouterError::Admission(format!(
                "no eligible pipeline in category {category:?}"
            )));
        }

        candidates.sort_by_key(|(_, _, state)| match state {
            PipelineState::Active => 0,
            PipelineState::Degraded => 1,
            PipelineState::Excluded => 2,
        });
        let best_rank = candidates[0].2;
        let top_tier: Vec<_> = candidates.into_iter().take_while(|(_, _, s)| *s == best_rank).collect();

        let chosen = self.weighted_pick(category, &top_tier).await;
        Ok(chosen)
    }

    async fn weighted_pick(
        &self,
        category: &str,
        candidates: &[(
            &routecodex_config::PoolEntry,
            Arc<Pipeline>,
            PipelineState,
        )],
    ) -> Arc<Pipeline> {
        let total_weight: u32 = candidates.iter().map(|(entry, _, _)| entry.weight.max(1)).sum();
        let mut cursors = self.round_robin_cursors.lock().await;
        let cursor = cursors.entry(category.to_string()).or_insert_with(|| AtomicUsize::new(0));
        let pick = (cursor.fetch_add(1, Ordering::Relaxed) as u32) % total_weight.max(1);

        let mut acc = 0u32;
        for (entry, pipeline, _) in candidates {
            acc += entry.weight.max(1);
            if pick < acc {
                return Arc::clone(pipeline);
            }
        }
        Arc::clone(&candidates[0].1)
    }
}
