//! The neutral intermediate form every dialect translates through. Using
//! one canonical shape keeps the adapter count linear in the number of
//! dialects (to/from canonical) instead of quadratic (every pair).

use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalRole {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON-encoded argument bytes, carried verbatim.
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalMessage {
    pub role: CanonicalRole,
    pub content: Option<String>,
    pub tool_calls: Vec<CanonicalToolCall>,
    /// Set on a `Tool` role message: which call this message answers.
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTool {
    pub name: String,
    pub description: Option<String>,
    pub parameters: JsonValue,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanonicalRequest {
    pub model: String,
    pub system: Option<String>,
    pub messages: Vec<CanonicalMessage>,
    pub tools: Vec<CanonicalTool>,
    pub tool_choice: Option<String>,
    pub stream: bool,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<i64>,
    pub stop: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalStopReason {
    Stop,
    Length,
    ToolUse,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanonicalUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<CanonicalToolCall>,
    pub stop_reason: CanonicalStopReason,
    pub usage: CanonicalUsage,
}

/// One incremental streaming update. `content_delta` and `tool_call_delta`
/// are mutually exclusive within a single chunk in upstream practice, but
/// nothing here enforces that; encoders handle whichever is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalDelta {
    pub content_delta: Option<String>,
    pub tool_call_delta: Option<CanonicalToolCallDelta>,
    pub finish_reason: Option<CanonicalStopReason>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalToolCallDelta {
    pub index: u32,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments_delta: String,
}
