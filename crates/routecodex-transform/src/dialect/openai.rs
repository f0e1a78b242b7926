use routecodex_protocol::openai::request::ChatCompletionRequest;
use routecodex_protocol::openai::response::{
    ChatCompletionChoice, ChatCompletionResponse,
};
use routecodex_protocol::openai::types::{
    ChatContent, ChatMessage, ChatRole, FinishReason, FunctionCall, FunctionDefinition,
    StopConfiguration, ToolCall, ToolDefinition, Usage,
};

use crate::canonical::{
    CanonicalMessage, CanonicalRequest, CanonicalResponse, CanonicalRole, CanonicalStopReason,
    CanonicalTool, CanonicalToolCall, CanonicalUsage,
};
use crate::errors::TransformError;

pub fn request_to_canonical(req: &ChatCompletionRequest) -> Result<CanonicalRequest, TransformError> {
    let mut messages = Vec::with_capacity(req.messages.len());
    let mut system = None;

    for msg in &req.messages {
        let role = match msg.role {
            ChatRole::System | ChatRole::Developer => {
                if system.is_none() {
                    system = flatten_content(msg.content.as_ref());
                    continue;
                }
                CanonicalRole::System
            }
            ChatRole::User => CanonicalRole::User,
            ChatRole::Assistant => CanonicalRole::Assistant,
            ChatRole::Tool => CanonicalRole::Tool,
        };

        let tool_calls = msg
            .tool_calls
            .as_ref()
            .map(|calls| {
                calls
                    .iter()
                    .map(|c| CanonicalToolCall {
                        id: c.id.clone(),
                        name: c.function.name.clone(),
                        arguments: c.function.arguments.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        messages.push(CanonicalMessage {
            role,
            content: flatten_content(msg.content.as_ref()),
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        });
    }

    let tools = req
        .tools
        .as_ref()
        .map(|tools| {
            tools
                .iter()
                .map(|t| CanonicalTool {
                    name: t.function.name.clone(),
                    description: t.function.description.clone(),
                    parameters: t
                        .function
                        .parameters
                        .clone()
                        .unwrap_or(serde_json::json!({})),
                })
                .collect()
        })
        .unwrap_or_default();

    let stop = match &req.stop {
        None => Vec::new(),
        Some(StopConfiguration::Single(s)) => vec![s.clone()],
        Some(StopConfiguration::Many(v)) => v.clone(),
    };

    Ok(CanonicalRequest {
        model: req.model.clone(),
        system,
        messages,
        tools,
        tool_choice: None,
        stream: req.wants_stream(),
        temperature: req.temperature,
        top_p: req.top_p,
        max_tokens: req.max_tokens,
        stop,
    })
}

pub fn canonical_to_request(canon: &CanonicalRequest) -> ChatCompletionRequest {
    let mut messages = Vec::with_capacity(canon.messages.len() + 1);

    if let Some(system) = &canon.system {
        messages.push(ChatMessage {
            role: ChatRole::System,
            content: Some(ChatContent::Text(system.clone())),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        });
    }

    for m in &canon.messages {
        let role = match m.role {
            CanonicalRole::System => ChatRole::System,
            CanonicalRole::User => ChatRole::User,
            CanonicalRole::Assistant => ChatRole::Assistant,
            CanonicalRole::Tool => ChatRole::Tool,
        };
        let tool_calls = if m.tool_calls.is_empty() {
            None
        } else {
            Some(
                m.tool_calls
                    .iter()
                    .map(|c| ToolCall {
                        id: c.id.clone(),
                        kind: "function".to_string(),
                        function: FunctionCall {
                            name: c.name.clone(),
                            arguments: c.arguments.clone(),
                        },
                    })
                    .collect(),
            )
        };
        messages.push(ChatMessage {
            role,
            content: m.content.clone().map(ChatContent::Text),
            name: None,
            tool_calls,
            tool_call_id: m.tool_call_id.clone(),
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
                    function: FunctionDefinition {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: Some(t.parameters.clone()),
                    },
                })
                .collect(),
        )
    };

    ChatCompletionRequest {
        model: canon.model.clone(),
        messages,
        tools,
        tool_choice: None,
        stream: Some(canon.stream),
        temperature: canon.temperature,
        top_p: canon.top_p,
        max_tokens: canon.max_tokens,
        n: None,
        stop: if canon.stop.is_empty() {
            None
        } else if canon.stop.len() == 1 {
            Some(StopConfiguration::Single(canon.stop[0].clone()))
        } else {
            Some(StopConfiguration::Many(canon.stop.clone()))
        },
        response_format: None,
        user: None,
        category: None,
    }
}

pub fn response_to_canonical(resp: &ChatCompletionResponse) -> CanonicalResponse {
    let choice = resp.choices.first();
    let content = choice.and_then(|c| flatten_content(c.message.content.as_ref()));
    let tool_calls = choice
        .and_then(|c| c.message.tool_calls.as_ref())
        .map(|calls| {
            calls
                .iter()
                .map(|c| CanonicalToolCall {
                    id: c.id.clone(),
                    name: c.function.name.clone(),
                    arguments: c.function.arguments.clone(),
                })
                .collect()
        })
        .unwrap_or_default();
    let stop_reason = match choice.and_then(|c| c.finish_reason.clone()) {
        Some(FinishReason::ToolCalls) => CanonicalStopReason::ToolUse,
        Some(FinishReason::Length) => CanonicalStopReason::Length,
        _ => CanonicalStopReason::Stop,
    };

    CanonicalResponse {
        content,
        tool_calls,
        stop_reason,
        usage: CanonicalUsage {
            prompt_tokens: resp.usage.prompt_tokens,
            completion_tokens: resp.usage.completion_tokens,
        },
    }
}

pub fn canonical_to_response(
    canon: &CanonicalResponse,
    id: String,
    model: String,
    created: i64,
) -> ChatCompletionResponse {
    let tool_calls = if canon.tool_calls.is_empty() {
        None
    } else {
        Some(
            canon
                .tool_calls
                .iter()
                .map(|c| ToolCall {
                    id: c.id.clone(),
                    kind: "function".to_string(),
                    function: FunctionCall {
                        name: c.name.clone(),
                        arguments: c.arguments.clone(),
                    },
                })
                .collect(),
        )
    };
    let finish_reason = Some(match canon.stop_reason {
        CanonicalStopReason::Stop => FinishReason::Stop,
        CanonicalStopReason::Length => FinishReason::Length,
        CanonicalStopReason::ToolUse => FinishReason::ToolCalls,
    });

    let message = ChatMessage {
        role: ChatRole::Assistant,
        content: canon.content.clone().map(ChatContent::Text),
        name: None,
        tool_calls,
        tool_call_id: None,
    };

    ChatCompletionResponse {
        id,
        object: "chat.completion".to_string(),
        created,
        model,
        choices: vec![ChatCompletionChoice {
            index: 0,
            message,
            finish_reason,
        }],
        usage: Usage {
            prompt_tokens: canon.usage.prompt_tokens,
            completion_tokens: canon.usage.completion_tokens,
            total_tokens: canon.usage.prompt_tokens + canon.usage.completion_tokens,
        },
    }
}

fn flatten_content(content: Option<&ChatContent>) -> Option<String> {
    match content {
        None => None,
        Some(ChatContent::Text(s)) => Some(s.clone()),
        Some(ChatContent::Parts(parts)) => {
            let mut out = String::new();
            for part in parts {
                if let routecodex_protocol::openai::types::ChatContentPart::Text { text } = part {
                    out.push_str(text);
                }
            }
            Some(out)
        }
    }
}
