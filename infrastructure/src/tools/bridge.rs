//! Remote tool bridge
//!
//! Exposes tools served by a [`RemoteToolClient`] (e.g. an MCP server) as
//! ordinary [`Tool`]s. Bridged names are qualified as `server__tool` so
//! two servers can offer a tool with the same name.

use std::sync::Arc;

use async_trait::async_trait;
use toolgate_application::{
    RemoteToolClient, RemoteToolError, Sandbox, Tool, ToolContext, ToolError, ToolRegistry,
};
use toolgate_domain::{Policy, ToolDefinition, cap_with_marker};
use tracing::{debug, info};

/// Separator between server and tool name
pub const NAME_SEPARATOR: &str = "__";

pub fn qualified_name(server: &str, tool: &str) -> String {
    format!("{}{}{}", server, NAME_SEPARATOR, tool)
}

pub struct BridgedTool {
    client: Arc<dyn RemoteToolClient>,
    /// Name on the remote server
    remote_name: String,
    definition: ToolDefinition,
}

impl BridgedTool {
    pub fn new(client: Arc<dyn RemoteToolClient>, remote: ToolDefinition) -> Self {
        let remote_name = remote.name.clone();
        let definition = ToolDefinition {
            name: qualified_name(client.server_name(), &remote.name),
            ..remote
        };
        Self {
            client,
            remote_name,
            definition,
        }
    }

    pub fn remote_name(&self) -> &str {
        &self.remote_name
    }
}

#[async_trait]
impl Tool for BridgedTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
        _sandbox: &dyn Sandbox,
        policy: &Policy,
    ) -> Result<String, ToolError> {
        debug!(
            server = self.client.server_name(),
            tool = %self.remote_name,
            "Calling remote tool"
        );
        let output = tokio::select! {
            _ = ctx.cancel.cancelled() => return Err(ToolError::Cancelled),
            res = self.client.call_tool(&self.remote_name, input) => {
                res.map_err(|e| ToolError::Execution(e.to_string()))?
            }
        };

        let content = cap_with_marker(&output.content, policy.effective_max_output_bytes());
        if output.is_error {
            Err(ToolError::Execution(content))
        } else {
            Ok(content)
        }
    }
}

/// Register every tool the client currently offers. Returns how many were
/// registered.
pub async fn register_remote_tools(
    registry: &ToolRegistry,
    client: Arc<dyn RemoteToolClient>,
) -> Result<usize, RemoteToolError> {
    let tools = client.list_tools().await?;
    let count = tools.len();
    for remote in tools {
        registry.register(Arc::new(BridgedTool::new(Arc::clone(&client), remote)));
    }
    info!(server = client.server_name(), tools = count, "Registered remote tools");
    Ok(count)
}
