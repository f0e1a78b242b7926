//! The two public entry points the compatibility stage calls:
//! `transform_request`/`transform_response`. Both route through the
//! canonical form so adding a fourth dialect only needs one new pair of
//! to/from-canonical functions, not six new pairwise adapters.

use crate::canonical::{CanonicalRequest, CanonicalResponse};
use crate::dialect::{anthropic, codex, openai};
use crate::errors::TransformError;
use crate::types::{CompletionRequest, CompletionResponse, Proto};

pub fn request_to_canonical(req: &CompletionRequest) -> Result<CanonicalRequest, TransformError> {
    match req {
        CompletionRequest::OpenaiChat(r) => openai::request_to_canonical(r),
        CompletionRequest::AnthropicMessages(r) => anthropic::request_to_canonical(r),
        CompletionRequest::CodexResponses(r) => codex::request_to_canonical(r),
    }
}

pub fn canonical_to_request(canon: &CanonicalRequest, dst: Proto) -> CompletionRequest {
    match dst {
        Proto::OpenaiChat => CompletionRequest::OpenaiChat(openai::canonical_to_request(canon)),
        Proto::AnthropicMessages => {
            CompletionRequest::AnthropicMessages(anthropic::canonical_to_request(canon))
        }
        Proto::CodexResponses => {
            CompletionRequest::CodexResponses(codex::canonical_to_request(canon))
        }
    }
}

/// Translate a parsed request from its source dialect into the
/// destination dialect the selected pipeline's provider speaks.
pub fn transform_request(
    req: &CompletionRequest,
    dst: Proto,
) -> Result<CompletionRequest, TransformError> {
    if req.proto() == dst {
        return Ok(req.clone());
    }
    let canon = request_to_canonical(req)?;
    Ok(canonical_to_request(&canon, dst))
}

pub fn response_to_canonical(resp: &CompletionResponse) -> CanonicalResponse {
    match resp {
        CompletionResponse::OpenaiChat(r) => openai::response_to_canonical(r),
        CompletionResponse::AnthropicMessages(r) => anthropic::response_to_canonical(r),
        CompletionResponse::CodexResponses(r) => codex::response_to_canonical(r),
    }
}

pub fn canonical_to_response(
    canon: &CanonicalResponse,
    dst: Proto,
    id: String,
    model: String,
    created: i64,
) -> CompletionResponse {
    match dst {
        Proto::OpenaiChat => {
            CompletionResponse::OpenaiChat(openai::canonical_to_response(canon, id, model, created))
        }
        Proto::AnthropicMessages => {
            CompletionResponse::AnthropicMessages(anthropic::canonical_to_response(canon, id, model))
        }
        Proto::CodexResponses => {
            CompletionResponse::CodexResponses(codex::canonical_to_response(canon, id, model))
        }
    }
}

/// Reverse-translate an upstream response back into the client's
/// requested dialect.
pub fn transform_response(
    resp: &CompletionResponse,
    dst: Proto,
    id: String,
    model: String,
    created: i64,
) -> CompletionResponse {
    if resp.proto() == dst {
        return resp.clone();
    }
    let canon = response_to_canonical(resp);
    canonical_to_response(&canon, dst, id, model, created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use routecodex_protocol::openai::request::ChatCompletionRequest;
    use routecodex_protocol::openai::types::{ChatContent, ChatMessage, ChatRole};

    fn sample_openai_request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "gpt-4".to_string(),
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: Some(ChatContent::Text("hi".to_string())),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            }],
            tools: None,
            tool_choice: None,
            stream: Some(false),
            temperature: None,
            top_p: None,
            max_tokens: None,
            n: None,
            stop: None,
            response_format: None,
            user: None,
            category: None,
        }
    }

    #[test]
    fn round_trip_through_anthropic_preserves_model_and_text() {
        let original = CompletionRequest::OpenaiChat(sample_openai_request());
        let as_anthropic = transform_request(&original, Proto::AnthropicMessages).unwrap();
        let back = transform_request(&as_anthropic, Proto::OpenaiChat).unwrap();

        assert_eq!(original.model(), back.model());
        let canon_original = request_to_canonical(&original).unwrap();
        let canon_back = request_to_canonical(&back).unwrap();
        assert_eq!(canon_original.messages[0].content, canon_back.messages[0].content);
    }

    #[test]
    fn round_trip_through_codex_preserves_tool_arguments_byte_identical() {
        let mut req = sample_openai_request();
        req.messages.push(ChatMessage {
            role: ChatRole::Assistant,
            content: None,
            name: None,
            tool_calls: Some(vec![routecodex_protocol::openai::types::ToolCall {
                id: "call_1".to_string(),
                kind: "function".to_string(),
                function: routecodex_protocol::openai::types::FunctionCall {
                    name: "get_time".to_string(),
                    arguments: "{\"tz\":\"UTC\"}".to_string(),
                },
            }]),
            tool_call_id: None,
        });
        let original = CompletionRequest::OpenaiChat(req);
        let as_codex = transform_request(&original, Proto::CodexResponses).unwrap();
        let canon = request_to_canonical(&as_codex).unwrap();
        let call = canon
            .messages
            .iter()
            .find_map(|m| m.tool_calls.first())
            .expect("tool call preserved");
        assert_eq!(call.name, "get_time");
        assert_eq!(call.arguments, "{\"tz\":\"UTC\"}");
    }

    #[test]
    fn same_dialect_transform_is_identity() {
        let original = CompletionRequest::OpenaiChat(sample_openai_request());
        let same = transform_request(&original, Proto::OpenaiChat).unwrap();
        assert_eq!(original.model(), same.model());
    }
}
