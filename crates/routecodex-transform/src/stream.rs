//! Streaming variants of the dialect adapters: each encoder turns a
//! sequence of `CanonicalDelta`s into the wire frames for one dialect.
//! State lives in the encoder because Anthropic-style streams need
//! `content_block_start`/`stop` bookkeeping that a stateless function
//! can't express.

use routecodex_protocol::anthropic::response::{ContentBlockDelta, MessageDelta, MessageStreamEvent};
use routecodex_protocol::anthropic::types::{AnthropicUsage, StopReason};
use routecodex_protocol::codex::response::ResponseStreamEvent;
use routecodex_protocol::openai::response::{
    ChatCompletionChunk, ChatCompletionChunkChoice, ChatCompletionDelta,
};
use routecodex_protocol::openai::types::{ChatRole, FinishReason, FunctionCall, ToolCall};
use routecodex_protocol::sse::{format_data_event, format_named_event, DONE_MARKER};

use crate::canonical::{CanonicalDelta, CanonicalStopReason};

/// One dialect's encoding of a `CanonicalDelta` sequence into wire bytes.
/// `start`/`finish` bracket the stream; `push` is called once per
/// upstream chunk translated to canonical form. `error` is called instead
/// of `finish` when the upstream connection failed mid-stream; its output
/// still needs a `[DONE]` appended by the caller for dialects that use one.
pub trait StreamTransformer: Send {
    fn start(&mut self, id: &str, model: &str) -> String;
    fn push(&mut self, delta: &CanonicalDelta) -> String;
    fn error(&mut self, message: &str) -> String;
    fn finish(&mut self) -> String;
}

pub struct OpenAiStreamEncoder {
    id: String,
    model: String,
    created: i64,
    started_role: bool,
}

impl OpenAiStreamEncoder {
    pub fn new(created: i64) -> Self {
        Self {
            id: String::new(),
            model: String::new(),
            created,
            started_role: false,
        }
    }

    fn chunk(&self, choice: ChatCompletionChunkChoice) -> String {
        let chunk = ChatCompletionChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk".to_string(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![choice],
        };
        format_data_event(&serde_json::to_string(&chunk).unwrap_or_default())
    }
}

impl StreamTransformer for OpenAiStreamEncoder {
    fn start(&mut self, id: &str, model: &str) -> String {
        self.id = id.to_string();
        self.model = model.to_string();
        self.started_role = true;
        self.chunk(ChatCompletionChunkChoice {
            index: 0,
            delta: ChatCompletionDelta {
                role: Some(ChatRole::Assistant),
                content: None,
                tool_calls: None,
            },
            finish_reason: None,
        })
    }

    fn push(&mut self, delta: &CanonicalDelta) -> String {
        let tool_calls = delta.tool_call_delta.as_ref().map(|d| {
            vec![ToolCall {
                id: d.id.clone().unwrap_or_default(),
                kind: "function".to_string(),
                function: FunctionCall {
                    name: d.name.clone().unwrap_or_default(),
                    arguments: d.arguments_delta.clone(),
                },
            }]
        });
        self.chunk(ChatCompletionChunkChoice {
            index: 0,
            delta: ChatCompletionDelta {
                role: None,
                content: delta.content_delta.clone(),
                tool_calls,
            },
            finish_reason: delta.finish_reason.map(map_finish_openai),
        })
    }

    fn error(&mut self, message: &str) -> String {
        let body = serde_json::json!({
            "error": { "message": message, "type": "upstream_error", "code": "upstream_error" }
        });
        let mut out = format_data_event(&body.to_string());
        out.push_str(DONE_MARKER);
        out
    }

    fn finish(&mut self) -> String {
        let mut out = self.chunk(ChatCompletionChunkChoice {
            index: 0,
            delta: ChatCompletionDelta::default(),
            finish_reason: Some(FinishReason::Stop),
        });
        out.push_str(DONE_MARKER);
        out
    }
}

fn map_finish_openai(reason: CanonicalStopReason) -> FinishReason {
    match reason {
        CanonicalStopReason::Stop => FinishReason::Stop,
        CanonicalStopReason::Length => FinishReason::Length,
        CanonicalStopReason::ToolUse => FinishReason::ToolCalls,
    }
}

pub struct AnthropicStreamEncoder {
    id: String,
    model: String,
    text_block_open: bool,
    tool_block_open: bool,
    next_index: u32,
}

impl AnthropicStreamEncoder {
    pub fn new() -> Self {
        Self {
            id: String::new(),
            model: String::new(),
            text_block_open: false,
            tool_block_open: false,
            next_index: 0,
        }
    }

    fn render(&self, event: MessageStreamEvent) -> String {
        let name = event.event_name();
        format_named_event(name, &serde_json::to_string(&event).unwrap_or_default())
    }
}

impl Default for AnthropicStreamEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamTransformer for AnthropicStreamEncoder {
    fn start(&mut self, id: &str, model: &str) -> String {
        self.id = id.to_string();
        self.model = model.to_string();
        let message = routecodex_protocol::anthropic::response::MessagesResponse::new(
            id.to_string(),
            model.to_string(),
            Vec::new(),
            None,
            AnthropicUsage::default(),
        );
        self.render(MessageStreamEvent::MessageStart { message })
    }

    fn push(&mut self, delta: &CanonicalDelta) -> String {
        let mut out = String::new();
        if let Some(text) = &delta.content_delta {
            if !self.text_block_open {
                self.text_block_open = true;
                out.push_str(&self.render(MessageStreamEvent::ContentBlockStart {
                    index: self.next_index,
                    content_block: routecodex_protocol::anthropic::types::ContentBlock::Text {
                        text: String::new(),
                    },
                }));
                self.next_index += 1;
            }
            out.push_str(&self.render(MessageStreamEvent::ContentBlockDelta {
                index: self.next_index - 1,
                delta: ContentBlockDelta::TextDelta { text: text.clone() },
            }));
        }
        if let Some(tool_delta) = &delta.tool_call_delta {
            if !self.tool_block_open {
                self.tool_block_open = true;
                out.push_str(&self.render(MessageStreamEvent::ContentBlockStart {
                    index: self.next_index,
                    content_block: routecodex_protocol::anthropic::types::ContentBlock::ToolUse {
                        id: tool_delta.id.clone().unwrap_or_default(),
                        name: tool_delta.name.clone().unwrap_or_default(),
                        input: serde_json::json!({}),
                    },
                }));
                self.next_index += 1;
            }
            out.push_str(&self.render(MessageStreamEvent::ContentBlockDelta {
                index: self.next_index - 1,
                delta: ContentBlockDelta::InputJsonDelta {
                    partial_json: tool_delta.arguments_delta.clone(),
                },
            }));
        }
        out
    }

    fn error(&mut self, message: &str) -> String {
        self.render(MessageStreamEvent::Error {
            error: routecodex_protocol::anthropic::response::StreamError {
                kind: "api_error".to_string(),
                message: message.to_string(),
            },
        })
    }

    fn finish(&mut self) -> String {
        let mut out = String::new();
        if self.next_index > 0 {
            out.push_str(&self.render(MessageStreamEvent::ContentBlockStop {
                index: self.next_index - 1,
            }));
        }
        let stop_reason = if self.tool_block_open {
            StopReason::ToolUse
        } else {
            StopReason::EndTurn
        };
        out.push_str(&self.render(MessageStreamEvent::MessageDelta {
            delta: MessageDelta {
                stop_reason: Some(stop_reason),
                stop_sequence: None,
            },
            usage: AnthropicUsage::default(),
        }));
        out.push_str(&self.render(MessageStreamEvent::MessageStop));
        out
    }
}

pub struct CodexStreamEncoder {
    item_id: String,
}

impl CodexStreamEncoder {
    pub fn new() -> Self {
        Self {
            item_id: String::new(),
        }
    }

    fn render(&self, event: ResponseStreamEvent) -> String {
        format_data_event(&serde_json::to_string(&event).unwrap_or_default())
    }
}

impl Default for CodexStreamEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamTransformer for CodexStreamEncoder {
    fn start(&mut self, id: &str, _model: &str) -> String {
        self.item_id = id.to_string();
        String::new()
    }

    fn push(&mut self, delta: &CanonicalDelta) -> String {
        let mut out = String::new();
        if let Some(text) = &delta.content_delta {
            out.push_str(&self.render(ResponseStreamEvent::ResponseOutputTextDelta {
                item_id: self.item_id.clone(),
                delta: text.clone(),
            }));
        }
        if let Some(tool_delta) = &delta.tool_call_delta {
            out.push_str(&self.render(
                ResponseStreamEvent::ResponseFunctionCallArgumentsDelta {
                    item_id: tool_delta.id.clone().unwrap_or_else(|| self.item_id.clone()),
                    delta: tool_delta.arguments_delta.clone(),
                },
            ));
        }
        out
    }

    fn error(&mut self, message: &str) -> String {
        self.render(ResponseStreamEvent::ResponseError {
            message: message.to_string(),
        })
    }

    fn finish(&mut self) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_stream_ends_with_done_marker() {
        let mut enc = OpenAiStreamEncoder::new(0);
        enc.start("id1", "gpt-4");
        let out = enc.finish();
        assert!(out.ends_with(DONE_MARKER));
    }

    #[test]
    fn anthropic_stream_opens_and_closes_text_block() {
        let mut enc = AnthropicStreamEncoder::new();
        enc.start("id1", "claude-3-haiku");
        let delta = CanonicalDelta {
            content_delta: Some("hi".to_string()),
            tool_call_delta: None,
            finish_reason: None,
        };
        let push_out = enc.push(&delta);
        assert!(push_out.contains("content_block_start"));
        assert!(push_out.contains("content_block_delta"));
        let finish_out = enc.finish();
        assert!(finish_out.contains("message_stop"));
    }
}
