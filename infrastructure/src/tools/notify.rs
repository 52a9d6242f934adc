//! Notify tool: notify
//!
//! Pushes a message to the chat/channel session the call belongs to.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use toolgate_application::{Notifier, NotifyError, Sandbox, Tool, ToolContext, ToolError, parse_input};
use toolgate_domain::{Policy, ToolDefinition};

/// Tool name constant
pub const NOTIFY: &str = "notify";

#[derive(Debug, Deserialize)]
struct NotifyArgs {
    text: String,
}

pub struct NotifyTool {
    notifier: Arc<dyn Notifier>,
}

impl NotifyTool {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl Tool for NotifyTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(NOTIFY, "Send a message to the user's current session.")
            .with_input_schema(serde_json::json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "Message to send"}
                },
                "required": ["text"]
            }))
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
        _sandbox: &dyn Sandbox,
        _policy: &Policy,
    ) -> Result<String, ToolError> {
        let args: NotifyArgs = parse_input(input)?;
        if args.text.trim().is_empty() {
            return Err(ToolError::InvalidInput("text is empty".into()));
        }
        let session = ctx
            .session_id
            .as_deref()
            .ok_or_else(|| ToolError::Execution(NotifyError::NoSession.to_string()))?;

        self.notifier
            .send(session, &args.text)
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?;
        Ok("Notification sent".to_string())
    }
}
