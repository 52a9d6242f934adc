//! Port for tools served by an external tool server.
//!
//! A [`RemoteToolClient`] lists the tools a server offers and forwards
//! calls to it. Infrastructure wraps each listed tool in a bridging
//! [`Tool`](super::tool::Tool) so the registry treats it like a built-in.

use async_trait::async_trait;
use thiserror::Error;
use toolgate_domain::ToolDefinition;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteToolError {
    #[error("Remote server unavailable: {0}")]
    Unavailable(String),

    #[error("Remote call failed: {0}")]
    Call(String),
}

/// Result of a remote call. `is_error` marks a failure reported by the
/// tool itself, as opposed to a transport failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteToolOutput {
    pub content: String,
    pub is_error: bool,
}

#[async_trait]
pub trait RemoteToolClient: Send + Sync {
    /// Server name, used to namespace bridged tool names.
    fn server_name(&self) -> &str;

    async fn list_tools(&self) -> Result<Vec<ToolDefinition>, RemoteToolError>;

    async fn call_tool(
        &self,
        name: &str,
        input: serde_json::Value,
    ) -> Result<RemoteToolOutput, RemoteToolError>;
}
