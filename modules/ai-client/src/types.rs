use serde::{Deserialize, Serialize};

/// Completion budget for every request this crate issues.
pub(crate) const MAX_TOKENS: u32 = 4096;

/// Single request turn. Responses come back as content blocks, not messages.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Message {
    pub role: &'static str,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Definition of a tool offered to the model.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolSpec>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<serde_json::Value>,
}

impl MessagesRequest {
    /// One user turn with the answer forced through `tool`.
    pub fn forced_tool(model: &str, system: &str, user: &str, tool: ToolSpec) -> Self {
        let choice = serde_json::json!({
            "type": "tool",
            "name": tool.name.clone(),
        });
        Self {
            model: model.to_string(),
            max_tokens: MAX_TOKENS,
            messages: vec![Message::user(user)],
            system: Some(system.to_string()),
            tools: Some(vec![tool]),
            tool_choice: Some(choice),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MessagesResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl MessagesResponse {
    /// Input payload of the first tool call in the response, if any.
    pub fn tool_input(&self) -> Option<&serde_json::Value> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::ToolUse { input } => Some(input),
            ContentBlock::Other => None,
        })
    }
}

/// Only tool calls are read back; text and any future block types fall
/// through to `Other`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum ContentBlock {
    #[serde(rename = "tool_use")]
    ToolUse { input: serde_json::Value },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_tool_request_serializes_the_choice() {
        let tool = ToolSpec {
            name: "structured_response".to_string(),
            description: "Extract structured data from the input.".to_string(),
            input_schema: serde_json::json!({"type": "object"}),
        };
        let request = MessagesRequest::forced_tool("claude-test", "be terse", "hello", tool);
        let wire = serde_json::to_value(&request).unwrap();

        assert_eq!(wire["model"], "claude-test");
        assert_eq!(wire["system"], "be terse");
        assert_eq!(wire["messages"][0]["role"], "user");
        assert_eq!(wire["messages"][0]["content"], "hello");
        assert_eq!(wire["tool_choice"]["name"], "structured_response");
    }

    #[test]
    fn response_parsing_skips_text_blocks() {
        let raw = serde_json::json!({
            "content": [
                {"type": "text", "text": "Let me look."},
                {"type": "tool_use", "id": "tu_1", "name": "structured_response",
                 "input": {"verdict": "parked"}}
            ],
            "stop_reason": "tool_use"
        });
        let response: MessagesResponse = serde_json::from_value(raw).unwrap();
        let input = response.tool_input().unwrap();
        assert_eq!(input["verdict"], "parked");
    }

    #[test]
    fn response_without_tool_call_has_no_input() {
        let raw = serde_json::json!({
            "content": [{"type": "text", "text": "I refuse."}],
            "stop_reason": "end_turn"
        });
        let response: MessagesResponse = serde_json::from_value(raw).unwrap();
        assert!(response.tool_input().is_none());
    }
}
