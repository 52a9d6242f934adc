//! Sandbox port
//!
//! Defines the execution contract shared by the process-based and
//! container-based sandboxes.
//!
//! # Error split
//!
//! | Situation | Reported as |
//! |-----------|-------------|
//! | empty program, working dir outside allowed roots | `Err(SandboxError)` |
//! | non-zero exit | `Ok(ExecResult { exit_code, .. })` |
//! | timeout, cancellation, spawn/IO failure | `Ok(ExecResult { exit_code: -1, error: Some(..) })` |

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use toolgate_domain::{Command, ExecResult, Policy};

/// Filesystem policy violations detected by the path guard
#[derive(Error, Debug)]
pub enum PathGuardError {
    #[error("Path {path} is outside the allowed roots ({roots})")]
    OutsideAllowedRoots { path: PathBuf, roots: String },

    #[error("Path {path} is inside read-only root {root}")]
    ReadOnly { path: PathBuf, root: PathBuf },

    #[error("Failed to resolve path {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Structural errors from [`Sandbox::exec`] and sandbox construction
#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("Command program is empty")]
    EmptyProgram,

    #[error("Policy violation: {0}")]
    Policy(#[from] PathGuardError),

    #[error("No container runtime found (tried: {0})")]
    RuntimeNotFound(String),

    #[error("Sandbox setup failed: {0}")]
    Setup(String),
}

/// Runs commands under a [`Policy`].
///
/// Each call owns its process exclusively; implementations hold no state
/// shared between concurrent executions.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Short identifier (e.g. "process", "container:docker")
    fn name(&self) -> &str;

    /// Execute a command. See the module docs for which failures are errors.
    async fn exec(
        &self,
        cancel: &CancellationToken,
        command: &Command,
        policy: &Policy,
    ) -> Result<ExecResult, SandboxError>;
}
