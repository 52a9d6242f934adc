//! Tool domain value objects

use serde::{Deserialize, Serialize};

/// Outcome of one tool invocation, fed back to the model.
///
/// Exactly one `ToolResult` is produced per [`ToolCall`](super::ToolCall);
/// `tool_call_id` carries the vendor-assigned call ID so the provider can
/// correlate it on the next request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Create a failed result
    pub fn error(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            is_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success("toolu_1", "file contents");
        assert!(!result.is_error);
        assert_eq!(result.tool_call_id, "toolu_1");
    }

    #[test]
    fn test_tool_result_error() {
        let result = ToolResult::error("toolu_2", "permission denied");
        assert!(result.is_error);
        assert_eq!(result.content, "permission denied");
    }
}
