use routecodex_protocol::{anthropic, codex, openai};
use serde::{Deserialize, Serialize};

/// The three wire dialects this gateway understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Proto {
    OpenaiChat,
    AnthropicMessages,
    CodexResponses,
}

/// The operation families the transform crate translates. `ModelList` has
/// no body to translate: it is aggregated directly by the gateway layer,
/// but is kept here so the dispatch vocabulary stays total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Complete,
    ModelList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransformContext {
    pub src: Proto,
    pub dst: Proto,
    pub op: Op,
}

/// How a dialect's stream is framed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// `event: NAME\ndata: JSON\n\n`
    SseNamedEvent,
    /// `data: JSON\n\n`, terminated by `data: [DONE]\n\n`
    SseDataOnly,
}

pub fn stream_format(proto: Proto) -> StreamFormat {
    match proto {
        Proto::OpenaiChat => StreamFormat::SseDataOnly,
        Proto::AnthropicMessages => StreamFormat::SseNamedEvent,
        Proto::CodexResponses => StreamFormat::SseDataOnly,
    }
}

/// A parsed request, tagged by dialect.
#[derive(Debug, Clone)]
pub enum CompletionRequest {
    OpenaiChat(openai::ChatCompletionRequest),
    AnthropicMessages(anthropic::MessagesRequest),
    CodexResponses(codex::ResponsesRequest),
}

impl CompletionRequest {
    pub fn proto(&self) -> Proto {
        match self {
            CompletionRequest::OpenaiChat(_) => Proto::OpenaiChat,
            CompletionRequest::AnthropicMessages(_) => Proto::AnthropicMessages,
            CompletionRequest::CodexResponses(_) => Proto::CodexResponses,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            CompletionRequest::OpenaiChat(r) => &r.model,
            CompletionRequest::AnthropicMessages(r) => &r.model,
            CompletionRequest::CodexResponses(r) => &r.model,
        }
    }

    pub fn wants_stream(&self) -> bool {
        match self {
            CompletionRequest::OpenaiChat(r) => r.wants_stream(),
            CompletionRequest::AnthropicMessages(r) => r.wants_stream(),
            CompletionRequest::CodexResponses(r) => r.wants_stream(),
        }
    }

    pub fn tools_present(&self) -> bool {
        match self {
            CompletionRequest::OpenaiChat(r) => r.tools_present(),
            CompletionRequest::AnthropicMessages(r) => r.tools_present(),
            CompletionRequest::CodexResponses(r) => r.tools_present(),
        }
    }
}

/// A response, tagged by dialect.
#[derive(Debug, Clone)]
pub enum CompletionResponse {
    OpenaiChat(openai::ChatCompletionResponse),
    AnthropicMessages(anthropic::MessagesResponse),
    CodexResponses(codex::ResponsesResponse),
}

impl CompletionResponse {
    pub fn proto(&self) -> Proto {
        match self {
            CompletionResponse::OpenaiChat(_) => Proto::OpenaiChat,
            CompletionResponse::AnthropicMessages(_) => Proto::AnthropicMessages,
            CompletionResponse::CodexResponses(_) => Proto::CodexResponses,
        }
    }
}

/// A single streamed chunk, tagged by dialect.
#[derive(Debug, Clone)]
pub enum StreamChunk {
    OpenaiChat(openai::response::ChatCompletionChunk),
    AnthropicMessages(anthropic::response::MessageStreamEvent),
    CodexResponses(codex::response::ResponseStreamEvent),
}
