//! Session domain entities

use crate::core::error::DomainError;
use crate::tool::{ToolCall, ToolResult};
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A message in a conversation (Entity)
///
/// Assistant messages may carry the tool calls the model issued; user
/// messages may carry the results of those calls. A message never carries
/// both: use [`ChatMessage::validate`] on externally built messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolResult>,
}

impl ChatMessage {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Assistant turn that requested tool invocations.
    pub fn assistant_with_tool_calls(content: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::plain(Role::Assistant, content)
        }
    }

    /// User turn answering previously issued tool calls.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self {
            tool_results: results,
            ..Self::plain(Role::User, "")
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn has_tool_results(&self) -> bool {
        !self.tool_results.is_empty()
    }

    /// Check the role/payload invariant.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.has_tool_calls() && self.has_tool_results() {
            return Err(DomainError::InvalidMessage(
                "a message cannot carry both tool calls and tool results".to_string(),
            ));
        }
        if self.has_tool_calls() && self.role != Role::Assistant {
            return Err(DomainError::InvalidMessage(format!(
                "tool calls must be authored by the assistant, not {}",
                self.role
            )));
        }
        if self.has_tool_results() && self.role != Role::User {
            return Err(DomainError::InvalidMessage(format!(
                "tool results must be authored by the user, not {}",
                self.role
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_roles() {
        assert_eq!(ChatMessage::system("s").role, Role::System);
        assert_eq!(ChatMessage::user("u").role, Role::User);
        assert_eq!(ChatMessage::assistant("a").role, Role::Assistant);
    }

    #[test]
    fn tool_call_message_is_assistant() {
        let call = ToolCall::new("toolu_1", "shell", serde_json::json!({"command": "ls"}));
        let msg = ChatMessage::assistant_with_tool_calls("running", vec![call]);
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.has_tool_calls());
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn tool_result_message_is_user() {
        let msg = ChatMessage::tool_results(vec![ToolResult::success("toolu_1", "ok")]);
        assert_eq!(msg.role, Role::User);
        assert!(msg.content.is_empty());
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_mixed_payloads() {
        let mut msg = ChatMessage::assistant_with_tool_calls(
            "",
            vec![ToolCall::new("a", "b", serde_json::json!({}))],
        );
        msg.tool_results.push(ToolResult::success("a", "c"));
        assert!(msg.validate().is_err());
    }

    #[test]
    fn validate_rejects_results_from_assistant() {
        let mut msg = ChatMessage::assistant("");
        msg.tool_results.push(ToolResult::success("a", "c"));
        assert!(msg.validate().is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
