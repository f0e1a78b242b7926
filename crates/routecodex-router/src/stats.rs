use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Per-pipeline request/error counters. Atomics rather than a mutex since
/// every field is updated independently and readers never need a
/// consistent snapshot across fields.
#[derive(Debug, Default)]
pub struct PipelineStats {
    pub total_req: AtomicU64,
    pub total_err: AtomicU64,
    pub last_req_at_ms: AtomicI64,
}

impl PipelineStats {
    pub fn record_request(&self, now_ms: i64) {
        self.total_req.fetch_add(1, Ordering::Relaxed);
        self.last_req_at_ms.store(now_ms, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.total_err.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PipelineStatsSnapshot {
        PipelineStatsSnapshot {
            total_req: self.total_req.load(Ordering::Relaxed),
            total_err: self.total_err.load(Ordering::Relaxed),
            last_req_at_ms: self.last_req_at_ms.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineStatsSnapshot {
    pub total_req: u64,
    pub total_err: u64,
    pub last_req_at_ms: i64,
}
