use serde::{Deserialize, Serialize};

use super::types::{ResponseItem, ResponseUsage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsesResponse {
    pub id: String,
    pub object: String,
    pub model: String,
    pub output: Vec<ResponseItem>,
    pub usage: ResponseUsage,
}

/// Event-type-tagged streaming deltas: each SSE frame carries its own
/// `type` field rather than an `event:` line, matching the upstream
/// Responses API's streaming contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseStreamEvent {
    ResponseCreated {
        response: ResponsesResponse,
    },
    ResponseOutputTextDelta {
        item_id: String,
        delta: String,
    },
    ResponseFunctionCallArgumentsDelta {
        item_id: String,
        delta: String,
    },
    ResponseCompleted {
        response: ResponsesResponse,
    },
    ResponseError {
        message: String,
    },
}
