use std::sync::Arc;

use tokio::sync::broadcast;

use super::sink::EventSink;
use crate::credential::state::UnavailableReason;

/// Lifecycle events, as typed channel payloads rather than a
/// stringly-typed topic bus.
#[derive(Debug, Clone)]
pub enum Event {
    ConfigApplied { revision: u64 },
    CredentialRefreshed { credential_id: String },
    CredentialBlocked { credential_key: String, reason: UnavailableReason },
    CredentialUnblocked { credential_key: String },
    RecoveryProbeDue { credential_key: String },
    PipelineReplaced { pipeline_id: String },
}

struct Inner {
    tx: broadcast::Sender<Event>,
    sinks: tokio::sync::RwLock<Vec<Arc<dyn EventSink>>>,
}

/// Cheap to clone: the broadcast sender and sink list are shared via `Arc`.
#[derive(Clone)]
pub struct EventHub {
    inner: Arc<Inner>,
}

impl EventHub {
    pub fn new(buffer: usize) -> Self {
        let (tx, _rx) = broadcast::channel(buffer);
        Self {
            inner: Arc::new(Inner {
                tx,
                sinks: tokio::sync::RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.tx.subscribe()
    }

    pub async fn add_sink(&self, sink: Arc<dyn EventSink>) {
        self.inner.sinks.write().await.push(sink);
    }

    pub fn emit(&self, event: Event) {
        let _ = self.inner.tx.send(event.clone());
        let sinks = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let sinks = sinks.sinks.read().await;
            for sink in sinks.iter() {
                sink.write(&event).await;
            }
        });
    }
}
