use async_trait::async_trait;

use super::hub::Event;

/// A pluggable observer attached at construction, replacing a global debug
/// manager with an explicit per-pool interface.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn write(&self, event: &Event);
}

/// Writes a one-line `tracing` record per event; the default sink used
/// by the binary when no snapshot file is configured.
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn write(&self, event: &Event) {
        tracing::info!(event = ?event, "lifecycle_event");
    }
}
