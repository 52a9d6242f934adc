//! Vendor-neutral chat request.

use super::entities::{ChatMessage, Role};
use crate::tool::ToolDefinition;
use serde::{Deserialize, Serialize};

/// One request to a chat provider.
///
/// `model` and `max_tokens` fall back to provider defaults when empty/zero.
/// System messages are lifted out of `messages` by the provider and sent
/// through its dedicated system field (see [`ChatRequest::system_prompt`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Model to use, or `default` when unset.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.model.trim().is_empty() {
            default
        } else {
            &self.model
        }
    }

    /// Max tokens to request, or `default` when unset.
    pub fn max_tokens_or(&self, default: u32) -> u32 {
        if self.max_tokens == 0 {
            default
        } else {
            self.max_tokens
        }
    }

    /// All system messages joined by blank lines, if any.
    pub fn system_prompt(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System && !m.content.is_empty())
            .map(|m| m.content.as_str())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    /// Conversational turns, with system messages removed.
    pub fn conversation(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.role != Role::System)
    }

    /// Tool name for a call ID, taken from the nearest assistant call that
    /// precedes message `index`. IDs may repeat across turns.
    pub fn tool_name_for_call(&self, index: usize, call_id: &str) -> Option<&str> {
        self.messages[..index.min(self.messages.len())]
            .iter()
            .rev()
            .flat_map(|m| m.tool_calls.iter())
            .find(|c| c.id == call_id)
            .map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ToolCall;

    #[test]
    fn defaults_apply_when_unset() {
        let req = ChatRequest::new(vec![ChatMessage::user("hi")]);
        assert_eq!(req.model_or("claude"), "claude");
        assert_eq!(req.max_tokens_or(4096), 4096);

        let req = req.with_model("gpt").with_max_tokens(10);
        assert_eq!(req.model_or("claude"), "gpt");
        assert_eq!(req.max_tokens_or(4096), 10);
    }

    #[test]
    fn system_prompt_is_extracted() {
        let req = ChatRequest::new(vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("hi"),
            ChatMessage::system("use tools"),
        ]);
        assert_eq!(req.system_prompt().as_deref(), Some("be brief\n\nuse tools"));
        let turns: Vec<_> = req.conversation().collect();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::User);
    }

    #[test]
    fn no_system_prompt() {
        let req = ChatRequest::new(vec![ChatMessage::user("hi")]);
        assert!(req.system_prompt().is_none());
    }

    #[test]
    fn tool_name_lookup_by_call_id() {
        let req = ChatRequest::new(vec![
            ChatMessage::user("list files"),
            ChatMessage::assistant_with_tool_calls(
                "",
                vec![ToolCall::new("call_9", "shell", serde_json::json!({}))],
            ),
        ]);
        assert_eq!(req.tool_name_for_call(2, "call_9"), Some("shell"));
        assert_eq!(req.tool_name_for_call(2, "call_0"), None);
        // Calls issued after the message are not visible to it
        assert_eq!(req.tool_name_for_call(1, "call_9"), None);
    }

    #[test]
    fn tool_name_lookup_with_reused_ids() {
        let req = ChatRequest::new(vec![
            ChatMessage::assistant_with_tool_calls(
                "",
                vec![ToolCall::new("c0", "shell", serde_json::json!({}))],
            ),
            ChatMessage::user(""),
            ChatMessage::assistant_with_tool_calls(
                "",
                vec![ToolCall::new("c0", "read_file", serde_json::json!({}))],
            ),
            ChatMessage::user(""),
        ]);
        assert_eq!(req.tool_name_for_call(1, "c0"), Some("shell"));
        assert_eq!(req.tool_name_for_call(3, "c0"), Some("read_file"));
        assert_eq!(req.tool_name_for_call(100, "c0"), Some("read_file"));
    }
}
