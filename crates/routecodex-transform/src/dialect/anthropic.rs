use routecodex_protocol::anthropic::request::MessagesRequest;
use routecodex_protocol::anthropic::response::MessagesResponse;
use routecodex_protocol::anthropic::types::{
    AnthropicMessage, AnthropicRole, AnthropicUsage, ContentBlock, MessageContent, StopReason,
    ToolDefinition,
};

use crate::canonical::{
    CanonicalMessage, CanonicalRequest, CanonicalResponse, CanonicalRole, CanonicalStopReason,
    CanonicalTool, CanonicalToolCall, CanonicalUsage,
};
use crate::errors::TransformError;

pub fn request_to_canonical(
    req: &MessagesRequest,
) -> Result<CanonicalRequest, TransformError> {
    let mut messages = Vec::with_capacity(req.messages.len());

    for msg in &req.messages {
        let role = match msg.role {
            AnthropicRole::User => CanonicalRole::User,
            AnthropicRole::Assistant => CanonicalRole::Assistant,
        };

        match &msg.content {
            MessageContent::Text(text) => messages.push(CanonicalMessage {
                role,
                content: Some(text.clone()),
                tool_calls: Vec::new(),
                tool_call_id: None,
            }),
            MessageContent::Blocks(blocks) => {
                let mut text = String::new();
                let mut tool_calls = Vec::new();
                for block in blocks {
                    match block {
                        ContentBlock::Text { text: t } => text.push_str(t),
                        ContentBlock::ToolUse { id, name, input } => {
                            tool_calls.push(CanonicalToolCall {
                                id: id.clone(),
                                name: name.clone(),
                                arguments: input.to_string(),
                            });
                        }
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            ..
                        } => {
                            let result_text = content
                                .as_ref()
                                .map(|c| c.to_string())
                                .unwrap_or_default();
                            messages.push(CanonicalMessage {
                                role: CanonicalRole::Tool,
                                content: Some(result_text),
                                tool_calls: Vec::new(),
                                tool_call_id: Some(tool_use_id.clone()),
                            });
                        }
                        ContentBlock::Image { .. } => {}
                    }
                }
                if !text.is_empty() || !tool_calls.is_empty() {
                    messages.push(CanonicalMessage {
                        role,
                        content: if text.is_empty() { None } else { Some(text) },
                        tool_calls,
                        tool_call_id: None,
                    });
                }
            }
        }
    }

    let tools = req
        .tools
        .as_ref()
        .map(|tools| {
            tools
                .iter()
                .map(|t| CanonicalTool {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.input_schema.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(CanonicalRequest {
        model: req.model.clone(),
        system: req.system.clone(),
        messages,
        tools,
        tool_choice: None,
        stream: req.wants_stream(),
        temperature: req.temperature,
        top_p: req.top_p,
        max_tokens: Some(req.max_tokens),
        stop: req.stop_sequences.clone().unwrap_or_default(),
    })
}

pub fn canonical_to_request(canon: &CanonicalRequest) -> MessagesRequest {
    let mut messages = Vec::with_capacity(canon.messages.len());

    for m in &canon.messages {
        // Anthropic has no standalone `tool` role: tool results become a
        // `user` message carrying a `tool_result` block.
        if m.role == CanonicalRole::Tool {
            messages.push(AnthropicMessage {
                role: AnthropicRole::User,
                content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
                    tool_use_id: m.tool_call_id.clone().unwrap_or_default(),
                    content: m
                        .content
                        .as_ref()
                        .map(|c| serde_json::Value::String(c.clone())),
                    is_error: None,
                }]),
            });
            continue;
        }
        if m.role == CanonicalRole::System {
            continue;
        }

        let role = match m.role {
            CanonicalRole::User => AnthropicRole::User,
            _ => AnthropicRole::Assistant,
        };

        if m.tool_calls.is_empty() {
            messages.push(AnthropicMessage {
                role,
                content: MessageContent::Text(m.content.clone().unwrap_or_default()),
            });
            continue;
        }

        let mut blocks = Vec::new();
        if let Some(text) = &m.content {
            if !text.is_empty() {
                blocks.push(ContentBlock::Text { text: text.clone() });
            }
        }
        for call in &m.tool_calls {
            let input = serde_json::from_str(&call.arguments)
                .unwrap_or_else(|_| serde_json::Value::String(call.arguments.clone()));
            blocks.push(ContentBlock::ToolUse {
                id: call.id.clone(),
                name: call.name.clone(),
                input,
            });
        }
        messages.push(AnthropicMessage {
            role,
            content: MessageContent::Blocks(blocks),
        });
    }

    let tools = if canon.tools.is_empty() {
        None
    } else {
        Some(
            canon
                .tools
                .iter()
                .map(|t| ToolDefinition {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    input_schema: t.parameters.clone(),
                })
                .collect(),
        )
    };

    MessagesRequest {
        model: canon.model.clone(),
        messages,
        system: canon.system.clone(),
        max_tokens: canon.max_tokens.unwrap_or(4096),
        tools,
        stream: Some(canon.stream),
        temperature: canon.temperature,
        top_p: canon.top_p,
        stop_sequences: if canon.stop.is_empty() {
            None
        } else {
            Some(canon.stop.clone())
        },
    }
}

pub fn response_to_canonical(resp: &MessagesResponse) -> CanonicalResponse {
    let mut content = String::new();
    let mut tool_calls = Vec::new();
    for block in &resp.content {
        match block {
            ContentBlock::Text { text } => content.push_str(text),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(CanonicalToolCall {
                id: id.clone(),
                name: name.clone(),
                arguments: input.to_string(),
            }),
            _ => {}
        }
    }

    let stop_reason = match resp.stop_reason {
        Some(StopReason::ToolUse) => CanonicalStopReason::ToolUse,
        Some(StopReason::MaxTokens) => CanonicalStopReason::Length,
        _ => CanonicalStopReason::Stop,
    };

    CanonicalResponse {
        content: if content.is_empty() { None } else { Some(content) },
        tool_calls,
        stop_reason,
        usage: CanonicalUsage {
            prompt_tokens: resp.usage.input_tokens,
            completion_tokens: resp.usage.output_tokens,
        },
    }
}

pub fn canonical_to_response(canon: &CanonicalResponse, id: String, model: String) -> MessagesResponse {
    let mut blocks = Vec::new();
    if let Some(text) = &canon.content {
        blocks.push(ContentBlock::Text { text: text.clone() });
    }
    for call in &canon.tool_calls {
        let input = serde_json::from_str(&call.arguments)
            .unwrap_or_else(|_| serde_json::Value::String(call.arguments.clone()));
        blocks.push(ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.name.clone(),
            input,
        });
    }

    let stop_reason = Some(match canon.stop_reason {
        CanonicalStopReason::Stop => StopReason::EndTurn,
        CanonicalStopReason::Length => StopReason::MaxTokens,
        CanonicalStopReason::ToolUse => StopReason::ToolUse,
    });

    MessagesResponse::new(
        id,
        model,
        blocks,
        stop_reason,
        AnthropicUsage {
            input_tokens: canon.usage.prompt_tokens,
            output_tokens: canon.usage.completion_tokens,
        },
    )
}
