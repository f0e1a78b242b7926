use routecodex_protocol::codex::request::ResponsesRequest;
use routecodex_protocol::codex::response::ResponsesResponse;
use routecodex_protocol::codex::types::{
    ResponseContentPart, ResponseItem, ResponseUsage, ToolDefinition,
};

use crate::canonical::{
    CanonicalMessage, CanonicalRequest, CanonicalResponse, CanonicalRole, CanonicalStopReason,
    CanonicalTool, CanonicalToolCall, CanonicalUsage,
};
use crate::errors::TransformError;

pub fn request_to_canonical(req: &ResponsesRequest) -> Result<CanonicalRequest, TransformError> {
    let mut messages = Vec::with_capacity(req.input.len());

    for item in &req.input {
        match item {
            ResponseItem::Message { role, content } => {
                let canonical_role = match role.as_str() {
                    "user" => CanonicalRole::User,
                    "system" | "developer" => CanonicalRole::System,
                    _ => CanonicalRole::Assistant,
                };
                let mut text = String::new();
                for part in content {
                    match part {
                        ResponseContentPart::InputText { text: t } => text.push_str(t),
                        ResponseContentPart::OutputText { text: t } => text.push_str(t),
                    }
                }
                messages.push(CanonicalMessage {
                    role: canonical_role,
                    content: Some(text),
                    tool_calls: Vec::new(),
                    tool_call_id: None,
                });
            }
            ResponseItem::FunctionCall {
                call_id,
                name,
                arguments,
                ..
            } => messages.push(CanonicalMessage {
                role: CanonicalRole::Assistant,
                content: None,
                tool_calls: vec![CanonicalToolCall {
                    id: call_id.clone(),
                    name: name.clone(),
                    arguments: arguments.clone(),
                }],
                tool_call_id: None,
            }),
            ResponseItem::FunctionCallOutput { call_id, output } => {
                messages.push(CanonicalMessage {
                    role: CanonicalRole::Tool,
                    content: Some(output.clone()),
                    tool_calls: Vec::new(),
                    tool_call_id: Some(call_id.clone()),
                });
            }
            ResponseItem::Other => {}
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
                    parameters: t.parameters.clone().unwrap_or(serde_json::json!({})),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(CanonicalRequest {
        model: req.model.clone(),
        system: req.instructions.clone(),
        messages,
        tools,
        tool_choice: None,
        stream: req.wants_stream(),
        temperature: req.temperature,
        top_p: None,
        max_tokens: req.max_output_tokens,
        stop: Vec::new(),
    })
}

pub fn canonical_to_request(canon: &CanonicalRequest) -> ResponsesRequest {
    let mut input = Vec::with_capacity(canon.messages.len());

    for m in &canon.messages {
        if m.role == CanonicalRole::Tool {
            input.push(ResponseItem::FunctionCallOutput {
                call_id: m.tool_call_id.clone().unwrap_or_default(),
                output: m.content.clone().unwrap_or_default(),
            });
            continue;
        }
        if !m.tool_calls.is_empty() {
            for call in &m.tool_calls {
                input.push(ResponseItem::FunctionCall {
                    id: call.id.clone(),
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                });
            }
            continue;
        }
        let role = match m.role {
            CanonicalRole::User => "user",
            CanonicalRole::System => "system",
            _ => "assistant",
        };
        let part = if role == "assistant" {
            ResponseContentPart::OutputText {
                text: m.content.clone().unwrap_or_default(),
            }
        } else {
            ResponseContentPart::InputText {
                text: m.content.clone().unwrap_or_default(),
            }
        };
        input.push(ResponseItem::Message {
            role: role.to_string(),
            content: vec![part],
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
                    kind: "function".to_string(),
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: Some(t.parameters.clone()),
                })
                .collect(),
        )
    };

    ResponsesRequest {
        model: canon.model.clone(),
        input,
        instructions: canon.system.clone(),
        tools,
        stream: Some(canon.stream),
        temperature: canon.temperature,
        max_output_tokens: canon.max_tokens,
    }
}

pub fn response_to_canonical(resp: &ResponsesResponse) -> CanonicalResponse {
    let mut content = String::new();
    let mut tool_calls = Vec::new();

    for item in &resp.output {
        match item {
            ResponseItem::Message { content: parts, .. } => {
                for part in parts {
                    if let ResponseContentPart::OutputText { text } = part {
                        content.push_str(text);
                    }
                }
            }
            ResponseItem::FunctionCall {
                call_id,
                name,
                arguments,
                ..
            } => tool_calls.push(CanonicalToolCall {
                id: call_id.clone(),
                name: name.clone(),
                arguments: arguments.clone(),
            }),
            _ => {}
        }
    }

    CanonicalResponse {
        content: if content.is_empty() { None } else { Some(content) },
        stop_reason: if tool_calls.is_empty() {
            CanonicalStopReason::Stop
        } else {
            CanonicalStopReason::ToolUse
        },
        tool_calls,
        usage: CanonicalUsage {
            prompt_tokens: resp.usage.input_tokens,
            completion_tokens: resp.usage.output_tokens,
        },
    }
}

pub fn canonical_to_response(canon: &CanonicalResponse, id: String, model: String) -> ResponsesResponse {
    let mut output = Vec::new();
    if let Some(text) = &canon.content {
        output.push(ResponseItem::Message {
            role: "assistant".to_string(),
            content: vec![ResponseContentPart::OutputText { text: text.clone() }],
        });
    }
    for call in &canon.tool_calls {
        output.push(ResponseItem::FunctionCall {
            id: call.id.clone(),
            call_id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        });
    }

    ResponsesResponse {
        id,
        object: "response".to_string(),
        model,
        output,
        usage: ResponseUsage {
            input_tokens: canon.usage.prompt_tokens,
            output_tokens: canon.usage.completion_tokens,
            total_tokens: canon.usage.prompt_tokens + canon.usage.completion_tokens,
        },
    }
}
