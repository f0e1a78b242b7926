//! The reverse half of the streaming contract: turn one upstream SSE
//! frame (already split by `routecodex_protocol::sse::SseParser`) into a
//! `CanonicalDelta`, independent of which dialect the upstream speaks
//! natively. The provider stage decodes through here before re-encoding
//! in the client's requested dialect via a `StreamTransformer`.

use routecodex_protocol::anthropic::response::{ContentBlockDelta, MessageStreamEvent};
use routecodex_protocol::anthropic::types::StopReason;
use routecodex_protocol::codex::response::ResponseStreamEvent;
use routecodex_protocol::openai::response::ChatCompletionChunk;
use routecodex_protocol::openai::types::FinishReason;
use routecodex_protocol::sse::SseEvent;

use crate::canonical::{CanonicalDelta, CanonicalStopReason, CanonicalToolCallDelta};
use crate::types::Proto;

/// Returns `None` for frames that carry no content (e.g. Anthropic
/// `ping`/`content_block_start` for a tool block whose first delta is
/// still to come, or codex's `response_created`/`response_completed`
/// envelopes).
pub fn decode_upstream_event(proto: Proto, event: &SseEvent) -> Option<CanonicalDelta> {
    if event.data == "[DONE]" {
        return None;
    }
    match proto {
        Proto::OpenaiChat => decode_openai(event),
        Proto::AnthropicMessages => decode_anthropic(event),
        Proto::CodexResponses => decode_codex(event),
    }
}

fn decode_openai(event: &SseEvent) -> Option<CanonicalDelta> {
    let chunk: ChatCompletionChunk = serde_json::from_str(&event.data).ok()?;
    let choice = chunk.choices.into_iter().next()?;
    let tool_call_delta = choice.delta.tool_calls.and_then(|calls| {
        calls.into_iter().next().map(|call| CanonicalToolCallDelta {
            index: 0,
            id: Some(call.id),
            name: Some(call.function.name),
            arguments_delta: call.function.arguments,
        })
    });
    Some(CanonicalDelta {
        content_delta: choice.delta.content,
        tool_call_delta,
        finish_reason: choice.finish_reason.map(map_finish_openai),
    })
}

fn map_finish_openai(reason: FinishReason) -> CanonicalStopReason {
    match reason {
        FinishReason::Stop => CanonicalStopReason::Stop,
        FinishReason::Length => CanonicalStopReason::Length,
        FinishReason::ToolCalls => CanonicalStopReason::ToolUse,
        FinishReason::ContentFilter => CanonicalStopReason::Stop,
    }
}

fn decode_anthropic(event: &SseEvent) -> Option<CanonicalDelta> {
    let parsed: MessageStreamEvent = serde_json::from_str(&event.data).ok()?;
    match parsed {
        MessageStreamEvent::ContentBlockDelta { delta, .. } => match delta {
            ContentBlockDelta::TextDelta { text } => Some(CanonicalDelta {
                content_delta: Some(text),
                ..Default::default()
            }),
            ContentBlockDelta::InputJsonDelta { partial_json } => Some(CanonicalDelta {
                tool_call_delta: Some(CanonicalToolCallDelta {
                    index: 0,
                    id: None,
                    name: None,
                    arguments_delta: partial_json,
                }),
                ..Default::default()
            }),
        },
        MessageStreamEvent::ContentBlockStart { content_block, .. } => {
            if let routecodex_protocol::anthropic::types::ContentBlock::ToolUse { id, name, .. } =
                content_block
            {
                Some(CanonicalDelta {
                    tool_call_delta: Some(CanonicalToolCallDelta {
                        index: 0,
                        id: Some(id),
                        name: Some(name),
                        arguments_delta: String::new(),
                    }),
                    ..Default::default()
                })
            } else {
                None
            }
        }
        MessageStreamEvent::MessageDelta { delta, .. } => delta.stop_reason.map(|reason| CanonicalDelta {
            finish_reason: Some(map_stop_anthropic(reason)),
            ..Default::default()
        }),
        _ => None,
    }
}

fn map_stop_anthropic(reason: StopReason) -> CanonicalStopReason {
    match reason {
        StopReason::EndTurn | StopReason::StopSequence => CanonicalStopReason::Stop,
        StopReason::MaxTokens => CanonicalStopReason::Length,
        StopReason::ToolUse => CanonicalStopReason::ToolUse,
    }
}

fn decode_codex(event: &SseEvent) -> Option<CanonicalDelta> {
    let parsed: ResponseStreamEvent = serde_json::from_str(&event.data).ok()?;
    match parsed {
        ResponseStreamEvent::ResponseOutputTextDelta { delta, .. } => Some(CanonicalDelta {
            content_delta: Some(delta),
            ..Default::default()
        }),
        ResponseStreamEvent::ResponseFunctionCallArgumentsDelta { item_id, delta } => {
            Some(CanonicalDelta {
                tool_call_delta: Some(CanonicalToolCallDelta {
                    index: 0,
                    id: Some(item_id),
                    name: None,
                    arguments_delta: delta,
                }),
                ..Default::default()
            })
        }
        ResponseStreamEvent::ResponseCompleted { .. } => Some(CanonicalDelta {
            finish_reason: Some(CanonicalStopReason::Stop),
            ..Default::default()
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_openai_content_delta() {
        let event = SseEvent {
            event: None,
            data: r#"{"id":"1","object":"chat.completion.chunk","created":0,"model":"gpt-4","choices":[{"index":0,"delta":{"content":"hi"},"finish_reason":null}]}"#
                .to_string(),
        };
        let delta = decode_upstream_event(Proto::OpenaiChat, &event).unwrap();
        assert_eq!(delta.content_delta.as_deref(), Some("hi"));
    }

    #[test]
    fn decodes_anthropic_text_delta() {
        let event = SseEvent {
            event: Some("content_block_delta".to_string()),
            data: r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"hi"}}"#
                .to_string(),
        };
        let delta = decode_upstream_event(Proto::AnthropicMessages, &event).unwrap();
        assert_eq!(delta.content_delta.as_deref(), Some("hi"));
    }

    #[test]
    fn done_marker_decodes_to_none() {
        let event = SseEvent {
            event: None,
            data: "[DONE]".to_string(),
        };
        assert!(decode_upstream_event(Proto::OpenaiChat, &event).is_none());
    }
}
