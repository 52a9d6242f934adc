//! Outbound notification port used by the `notify` tool.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("No session to notify")]
    NoSession,

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to the channel bound to `session_id`.
    async fn send(&self, session_id: &str, text: &str) -> Result<(), NotifyError>;
}
