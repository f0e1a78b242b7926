use routecodex_transform::{CompletionRequest, Proto};

/// A classification rule: `(dialect, model, messagesShape, toolsPresent,
/// tokenEstimate) -> category`. Rules are ordered and loaded from
/// `RuntimeConfig` rather than hardcoded; this struct is the predicate
/// the config's rule table compiles into.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub category: String,
    pub dialect: Option<Proto>,
    pub model_contains: Option<String>,
    pub requires_tools: Option<bool>,
    pub min_token_estimate: Option<u64>,
}

/// Rough token estimate used only for classification, not billing: one
/// token per four characters of the flattened prompt text, matching the
/// conventional OpenAI-ish heuristic.
pub fn estimate_tokens(req: &CompletionRequest) -> u64 {
    let chars: usize = match req {
        CompletionRequest::OpenaiChat(r) => r
            .messages
            .iter()
            .filter_map(|m| match &m.content {
                Some(routecodex_protocol::openai::types::ChatContent::Text(t)) => Some(t.len()),
                _ => None,
            })
            .sum(),
        CompletionRequest::AnthropicMessages(r) => r
            .messages
            .iter()
            .map(|m| match &m.content {
                routecodex_protocol::anthropic::types::MessageContent::Text(t) => t.len(),
                routecodex_protocol::anthropic::types::MessageContent::Blocks(blocks) => blocks
                    .iter()
                    .filter_map(|b| match b {
                        routecodex_protocol::anthropic::types::ContentBlock::Text { text } => {
                            Some(text.len())
                        }
                        _ => None,
                    })
                    .sum(),
            })
            .sum(),
        CompletionRequest::CodexResponses(r) => r.input.len() * 8,
    };
    (chars as u64) / 4
}

/// First-match-wins over the ordered rule list; an explicit `category`
/// hint on the request bypasses classification entirely when that
/// category exists in `known_categories`.
pub fn classify(
    req: &CompletionRequest,
    hint: Option<&str>,
    rules: &[ClassificationRule],
    known_categories: &[String],
) -> String {
    if let Some(hint) = hint {
        if known_categories.iter().any(|c| c == hint) {
            return hint.to_string();
        }
    }

    let dialect = req.proto();
    let model = req.model();
    let tools_present = req.tools_present();
    let tokens = estimate_tokens(req);

    for rule in rules {
        if let Some(d) = rule.dialect {
            if d != dialect {
                continue;
            }
        }
        if let Some(substr) = &rule.model_contains {
            if !model.contains(substr.as_str()) {
                continue;
            }
        }
        if let Some(requires_tools) = rule.requires_tools {
            if requires_tools != tools_present {
                continue;
            }
        }
        if let Some(min_tokens) = rule.min_token_estimate {
            if tokens < min_tokens {
                continue;
            }
        }
        return rule.category.clone();
    }

    "default".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use routecodex_protocol::openai::request::ChatCompletionRequest;
    use routecodex_protocol::openai::types::{ChatContent, ChatMessage, ChatRole};

    fn request_with(content: &str) -> CompletionRequest {
        CompletionRequest::OpenaiChat(ChatCompletionRequest {
            model: "gpt-4".to_string(),
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: Some(ChatContent::Text(content.to_string())),
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
        })
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = vec![
            ClassificationRule {
                category: "longContext".to_string(),
                dialect: None,
                model_contains: None,
                requires_tools: None,
                min_token_estimate: Some(1),
            },
            ClassificationRule {
                category: "default".to_string(),
                dialect: None,
                model_contains: None,
                requires_tools: None,
                min_token_estimate: None,
            },
        ];
        let req = request_with("hello world this is a long enough message to count tokens");
        let category = classify(&req, None, &rules, &["longContext".to_string(), "default".to_string()]);
        assert_eq!(category, "longContext");
    }

    #[test]
    fn explicit_hint_bypasses_classification_when_known() {
        let req = request_with("hi");
        let category = classify(&req, Some("coding"), &[], &["coding".to_string()]);
        assert_eq!(category, "coding");
    }

    #[test]
    fn unknown_hint_falls_back_to_rules() {
        let req = request_with("hi");
        let category = classify(&req, Some("not-a-real-category"), &[], &["coding".to_string()]);
        assert_eq!(category, "default");
    }
}
