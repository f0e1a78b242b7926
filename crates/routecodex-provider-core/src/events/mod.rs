mod hub;
mod sink;

pub use hub::{Event, EventHub};
pub use sink::{EventSink, TracingEventSink};
