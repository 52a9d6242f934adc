//! Dispatch Tool Call use case.
//!
//! Turns one assembled [`ToolCall`] into exactly one [`ToolResult`]:
//!
//! ```text
//! ToolCall
//!   ├─ cancelled?            → Err(Cancelled)
//!   ├─ registry lookup       → Err(NotFound)
//!   ├─ approval gate         → Err(PolicyViolation)   (require_approval)
//!   └─ Tool::execute
//!        ├─ Ok(text)              → ToolResult::success
//!        ├─ Err(Execution)        → ToolResult::error  (fed back to the model)
//!        └─ Err(other)            → Err(..)            (aborts the turn)
//! ```

use std::sync::Arc;

use toolgate_domain::util::truncate_str;
use toolgate_domain::{Policy, ToolCall, ToolResult};
use tracing::{debug, info, warn};

use crate::ports::approval::{ApprovalDecision, ApprovalPort};
use crate::ports::sandbox::Sandbox;
use crate::ports::tool::{ToolContext, ToolError};
use crate::registry::ToolRegistry;

/// Looks up tools in a registry and runs them through a sandbox.
#[derive(Clone)]
pub struct DispatchToolCallUseCase {
    registry: Arc<ToolRegistry>,
    sandbox: Arc<dyn Sandbox>,
    approval: Option<Arc<dyn ApprovalPort>>,
}

impl DispatchToolCallUseCase {
    pub fn new(registry: Arc<ToolRegistry>, sandbox: Arc<dyn Sandbox>) -> Self {
        Self {
            registry,
            sandbox,
            approval: None,
        }
    }

    /// Set the approver consulted when the policy requires approval.
    pub fn with_approval(mut self, approval: Arc<dyn ApprovalPort>) -> Self {
        self.approval = Some(approval);
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Execute one tool call.
    ///
    /// Execution failures come back as `Ok` with `is_error` set so the
    /// conversation can continue; invocation, policy and cancellation
    /// errors are returned as `Err`.
    pub async fn execute(
        &self,
        ctx: &ToolContext,
        call: &ToolCall,
        policy: &Policy,
    ) -> Result<ToolResult, ToolError> {
        if ctx.cancel.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        let tool = self.registry.get(&call.name)?;

        if policy.require_approval {
            let Some(approval) = &self.approval else {
                warn!(tool = %call.name, "Approval required but no approver configured");
                return Err(ToolError::PolicyViolation(format!(
                    "tool '{}' requires approval and no approver is configured",
                    call.name
                )));
            };
            if let ApprovalDecision::Deny(reason) = approval.request_approval(call).await {
                info!(tool = %call.name, reason = %reason, "Tool call denied");
                return Err(ToolError::PolicyViolation(format!(
                    "tool '{}' denied: {}",
                    call.name, reason
                )));
            }
        }

        debug!(
            tool = %call.name,
            id = %call.id,
            args = %tool_args_preview(call),
            sandbox = self.sandbox.name(),
            "Dispatching tool call"
        );

        match tool
            .execute(ctx, call.input.clone(), self.sandbox.as_ref(), policy)
            .await
        {
            Ok(content) => Ok(ToolResult::success(&call.id, content)),
            Err(ToolError::Execution(message)) => {
                debug!(tool = %call.name, error = %message, "Tool execution failed");
                Ok(ToolResult::error(&call.id, message))
            }
            Err(e) => {
                warn!(tool = %call.name, code = e.code(), error = %e, "Tool call aborted");
                Err(e)
            }
        }
    }
}

/// Short preview of the arguments for log lines.
///
/// Looks for well-known keys (`path`, `command`, `url`, `key`, `query`)
/// first, then falls back to the first string value found.
fn tool_args_preview(call: &ToolCall) -> String {
    const PREVIEW_BYTES: usize = 60;
    let Some(args) = call.input.as_object() else {
        return String::new();
    };
    ["path", "command", "url", "key", "query"]
        .iter()
        .find_map(|key| args.get(*key).and_then(|v| v.as_str()))
        .or_else(|| args.values().find_map(|v| v.as_str()))
        .map(|s| truncate_str(s, PREVIEW_BYTES).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::approval::{AutoApprove, AutoDeny};
    use crate::registry::tests::{LabelTool, NullSandbox};
    use async_trait::async_trait;
    use serde_json::json;
    use toolgate_domain::ToolDefinition;

    struct FailingTool(fn() -> ToolError);

    #[async_trait]
    impl crate::ports::tool::Tool for FailingTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("fail", "always fails")
        }

        async fn execute(
            &self,
            _ctx: &ToolContext,
            _input: serde_json::Value,
            _sandbox: &dyn Sandbox,
            _policy: &Policy,
        ) -> Result<String, ToolError> {
            Err((self.0)())
        }
    }

    fn use_case(registry: ToolRegistry) -> DispatchToolCallUseCase {
        DispatchToolCallUseCase::new(Arc::new(registry), Arc::new(NullSandbox))
    }

    #[tokio::test]
    async fn test_success_becomes_result() {
        let uc = use_case(ToolRegistry::new().with(LabelTool {
            name: "echo",
            label: "hello",
        }));
        let call = ToolCall::new("call_1", "echo", json!({}));

        let result = uc
            .execute(&ToolContext::new("agent"), &call, &Policy::default())
            .await
            .unwrap();

        assert_eq!(result, ToolResult::success("call_1", "hello"));
    }

    #[tokio::test]
    async fn test_execution_failure_is_fed_back() {
        let uc = use_case(
            ToolRegistry::new().with(FailingTool(|| ToolError::Execution("exit code 2".into()))),
        );
        let call = ToolCall::new("call_1", "fail", json!({}));

        let result = uc
            .execute(&ToolContext::new("agent"), &call, &Policy::default())
            .await
            .unwrap();

        assert!(result.is_error);
        assert_eq!(result.content, "exit code 2");
    }

    #[tokio::test]
    async fn test_invalid_input_aborts() {
        let uc = use_case(
            ToolRegistry::new().with(FailingTool(|| ToolError::InvalidInput("missing path".into()))),
        );
        let call = ToolCall::new("call_1", "fail", json!({}));

        let err = uc
            .execute(&ToolContext::new("agent"), &call, &Policy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let uc = use_case(ToolRegistry::new());
        let call = ToolCall::new("call_1", "nope", json!({}));

        let err = uc
            .execute(&ToolContext::new("agent"), &call, &Policy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(ref n) if n == "nope"));
    }

    #[tokio::test]
    async fn test_cancelled_before_dispatch() {
        let uc = use_case(ToolRegistry::new().with(LabelTool {
            name: "echo",
            label: "x",
        }));
        let ctx = ToolContext::new("agent");
        ctx.cancel.cancel();

        let err = uc
            .execute(&ctx, &ToolCall::new("c", "echo", json!({})), &Policy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Cancelled));
    }

    #[tokio::test]
    async fn test_approval_required_without_approver() {
        let uc = use_case(ToolRegistry::new().with(LabelTool {
            name: "echo",
            label: "x",
        }));
        let policy = Policy::default().with_require_approval(true);

        let err = uc
            .execute(&ToolContext::new("a"), &ToolCall::new("c", "echo", json!({})), &policy)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::PolicyViolation(_)));
    }

    #[tokio::test]
    async fn test_approval_gate() {
        let registry = ToolRegistry::new().with(LabelTool {
            name: "echo",
            label: "ok",
        });
        let registry = Arc::new(registry);
        let policy = Policy::default().with_require_approval(true);
        let call = ToolCall::new("c", "echo", json!({}));

        let approved = DispatchToolCallUseCase::new(Arc::clone(&registry), Arc::new(NullSandbox))
            .with_approval(Arc::new(AutoApprove));
        let result = approved
            .execute(&ToolContext::new("a"), &call, &policy)
            .await
            .unwrap();
        assert_eq!(result.content, "ok");

        let denied = DispatchToolCallUseCase::new(registry, Arc::new(NullSandbox))
            .with_approval(Arc::new(AutoDeny::new("nope")));
        let err = denied
            .execute(&ToolContext::new("a"), &call, &policy)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_args_preview_prefers_known_keys() {
        let call = ToolCall::new("c", "read_file", json!({"other": "x", "path": "src/main.rs"}));
        assert_eq!(tool_args_preview(&call), "src/main.rs");

        let call = ToolCall::new("c", "t", json!({"n": 1, "text": "hi"}));
        assert_eq!(tool_args_preview(&call), "hi");
    }
}
