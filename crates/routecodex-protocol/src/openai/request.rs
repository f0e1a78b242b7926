use serde::{Deserialize, Serialize};

use super::types::{ChatMessage, ResponseFormat, StopConfiguration, ToolChoice, ToolDefinition};

/// The `POST /v1/chat/completions` request body. Unknown JSON fields
/// are silently ignored by `serde` rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    /// Must contain at least one message; not enforced here. The
    /// transform/router stages surface a `ValidationError` if empty.
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Range is 0..=2.0 (not enforced here).
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Gateway-internal hint: bypasses classification when present and
    /// the named category exists in `RuntimeConfig.routing`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ChatCompletionRequest {
    pub fn wants_stream(&self) -> bool {
        self.stream.unwrap_or(false)
    }

    pub fn tools_present(&self) -> bool {
        self.tools.as_ref().is_some_and(|t| !t.is_empty())
    }
}
