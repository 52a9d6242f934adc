//! Execution sandboxes
//!
//! Two [`Sandbox`] implementations share the process plumbing in
//! [`runner`]: [`ProcessSandbox`] runs the program directly, and
//! [`ContainerSandbox`] wraps it in a locked-down container. Filesystem
//! checks for both (and for the file tools) live in [`path_guard`].

pub mod container;
pub mod output;
pub mod path_guard;
pub mod process;
pub mod runner;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use toolgate_application::{Sandbox, SandboxError};

pub use container::{ContainerConfig, ContainerSandbox, RUNTIME_CANDIDATES, detect_runtime};
pub use path_guard::{PathGuard, check_allowed, check_writable, resolve_path};
pub use process::ProcessSandbox;

/// Which sandbox implementation to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxKind {
    #[default]
    Process,
    Container,
}

impl SandboxKind {
    pub fn as_str(&self) -> &str {
        match self {
            SandboxKind::Process => "process",
            SandboxKind::Container => "container",
        }
    }
}

impl fmt::Display for SandboxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SandboxKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "process" => Ok(SandboxKind::Process),
            "container" | "docker" => Ok(SandboxKind::Container),
            other => Err(format!("unknown sandbox kind: {}", other)),
        }
    }
}

/// Build the configured sandbox. Container construction fails when no
/// runtime can be found.
pub fn build_sandbox(
    kind: SandboxKind,
    container: &ContainerConfig,
) -> Result<Arc<dyn Sandbox>, SandboxError> {
    Ok(match kind {
        SandboxKind::Process => Arc::new(ProcessSandbox::new()),
        SandboxKind::Container => Arc::new(ContainerSandbox::new(container.clone())?),
    })
}
