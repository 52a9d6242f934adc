//! Credential tool: credential
//!
//! Named secrets for the agent to use in later tool calls. Values only
//! leave the store on an explicit `get`; `list` returns names.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use toolgate_application::{CredentialStore, Sandbox, Tool, ToolContext, ToolError, parse_input};
use toolgate_domain::{Policy, ToolDefinition};
use tracing::debug;

/// Tool name constant
pub const CREDENTIAL: &str = "credential";

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Action {
    List,
    Get,
    Set,
    Delete,
}

#[derive(Debug, Deserialize)]
struct CredentialArgs {
    action: Action,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

impl CredentialArgs {
    fn name(&self) -> Result<&str, ToolError> {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ToolError::InvalidInput("'name' is required".into()))
    }
}

pub struct CredentialTool {
    store: Arc<dyn CredentialStore>,
}

impl CredentialTool {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for CredentialTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            CREDENTIAL,
            "Manage stored credentials. Actions: list, get, set, delete.",
        )
        .with_input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "action": {"type": "string", "enum": ["list", "get", "set", "delete"]},
                "name": {"type": "string"},
                "value": {"type": "string"}
            },
            "required": ["action"]
        }))
    }

    async fn execute(
        &self,
        _ctx: &ToolContext,
        input: serde_json::Value,
        _sandbox: &dyn Sandbox,
        _policy: &Policy,
    ) -> Result<String, ToolError> {
        let args: CredentialArgs = parse_input(input)?;
        let failed = |e: toolgate_application::StoreError| ToolError::Execution(e.to_string());

        match args.action {
            Action::List => {
                let names = self.store.list().await.map_err(failed)?;
                if names.is_empty() {
                    Ok("(no credentials)".to_string())
                } else {
                    Ok(names.join("\n"))
                }
            }
            Action::Get => {
                let name = args.name()?;
                debug!(credential = %name, "Credential read");
                self.store
                    .get(name)
                    .await
                    .map_err(failed)?
                    .ok_or_else(|| ToolError::Execution(format!("no credential named '{}'", name)))
            }
            Action::Set => {
                let name = args.name()?;
                let value = args
                    .value
                    .as_deref()
                    .ok_or_else(|| ToolError::InvalidInput("'value' is required for set".into()))?;
                self.store.set(name, value).await.map_err(failed)?;
                Ok(format!("Stored credential '{}'", name))
            }
            Action::Delete => {
                let name = args.name()?;
                if self.store.delete(name).await.map_err(failed)? {
                    Ok(format!("Deleted credential '{}'", name))
                } else {
                    Ok(format!("No credential named '{}'", name))
                }
            }
        }
    }
}
