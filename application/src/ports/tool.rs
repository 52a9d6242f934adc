//! Tool port
//!
//! Every tool is a standalone type implementing [`Tool`]; the registry
//! stores them as `Arc<dyn Tool>` and dispatches by name.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use toolgate_domain::{Policy, ToolDefinition};

use super::sandbox::{PathGuardError, Sandbox, SandboxError};

/// Error that occurred during tool execution.
///
/// Variants follow the failure taxonomy the orchestration loop relies on:
///
/// | Variant | Detected | Aborts the turn? |
/// |---------|----------|------------------|
/// | `InvalidInput` | before any side effect | yes |
/// | `NotFound` | before any side effect | yes |
/// | `PolicyViolation` | before execution starts | yes |
/// | `Cancelled` | any time | yes |
/// | `Execution` | during execution | no, rendered back to the model |
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl ToolError {
    /// Whether the current turn must stop instead of feeding this back.
    pub fn aborts_turn(&self) -> bool {
        !matches!(self, ToolError::Execution(_))
    }

    /// Stable code for logs and tool results.
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::InvalidInput(_) => "INVALID_INPUT",
            ToolError::NotFound(_) => "NOT_FOUND",
            ToolError::PolicyViolation(_) => "POLICY_VIOLATION",
            ToolError::Execution(_) => "EXECUTION_FAILED",
            ToolError::Cancelled => "CANCELLED",
        }
    }
}

impl From<PathGuardError> for ToolError {
    fn from(err: PathGuardError) -> Self {
        // A path that cannot be resolved cannot be proven inside its roots
        ToolError::PolicyViolation(err.to_string())
    }
}

impl From<SandboxError> for ToolError {
    fn from(err: SandboxError) -> Self {
        match err {
            SandboxError::EmptyProgram => ToolError::InvalidInput(err.to_string()),
            SandboxError::Policy(e) => e.into(),
            other => ToolError::Execution(other.to_string()),
        }
    }
}

/// Per-invocation context, passed explicitly instead of ambient state.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    /// Chat/channel session the call belongs to, if any
    pub session_id: Option<String>,
    /// Agent identity used to scope per-agent state (memory)
    pub agent_id: String,
    /// Cancellation signal for the whole invocation
    pub cancel: CancellationToken,
}

impl ToolContext {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// A capability the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Schema advertised to the model; `name` is the dispatch key.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with the raw JSON input the model produced.
    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
        sandbox: &dyn Sandbox,
        policy: &Policy,
    ) -> Result<String, ToolError>;
}

/// Decode raw tool input into a typed argument struct.
pub fn parse_input<T: DeserializeOwned>(input: serde_json::Value) -> Result<T, ToolError> {
    serde_json::from_value(input).map_err(|e| ToolError::InvalidInput(e.to_string()))
}
