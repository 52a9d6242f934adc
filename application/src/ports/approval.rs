//! Approval port for tool calls that need a human decision.
//!
//! When [`Policy::require_approval`](toolgate_domain::Policy) is set, the
//! dispatcher asks an [`ApprovalPort`] before running any tool. Without an
//! approver configured, such calls are rejected.
//!
//! # Built-in Implementations
//!
//! - [`AutoApprove`] - Always approves
//! - [`AutoDeny`] - Always denies with a fixed reason

use async_trait::async_trait;
use toolgate_domain::ToolCall;

/// Outcome of an approval request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approve,
    Deny(String),
}

#[async_trait]
pub trait ApprovalPort: Send + Sync {
    /// Decide whether `call` may run.
    async fn request_approval(&self, call: &ToolCall) -> ApprovalDecision;
}

/// Approves every call. Useful for non-interactive runs that still set
/// `require_approval` to get the log trail.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl ApprovalPort for AutoApprove {
    async fn request_approval(&self, _call: &ToolCall) -> ApprovalDecision {
        ApprovalDecision::Approve
    }
}

#[derive(Debug, Clone, Default)]
pub struct AutoDeny {
    reason: String,
}

impl AutoDeny {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ApprovalPort for AutoDeny {
    async fn request_approval(&self, _call: &ToolCall) -> ApprovalDecision {
        let reason = if self.reason.is_empty() {
            "denied by policy".to_string()
        } else {
            self.reason.clone()
        };
        ApprovalDecision::Deny(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn auto_approve_approves() {
        let call = ToolCall::new("c1", "shell", json!({"command": "ls"}));
        assert_eq!(
            AutoApprove.request_approval(&call).await,
            ApprovalDecision::Approve
        );
    }

    #[tokio::test]
    async fn auto_deny_uses_reason() {
        let call = ToolCall::new("c1", "shell", json!({}));
        assert_eq!(
            AutoDeny::new("read-only session").request_approval(&call).await,
            ApprovalDecision::Deny("read-only session".into())
        );
        assert_eq!(
            AutoDeny::default().request_approval(&call).await,
            ApprovalDecision::Deny("denied by policy".into())
        );
    }
}
