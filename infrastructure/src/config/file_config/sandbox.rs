//! Sandbox configuration from TOML (`[sandbox]` section)

use serde::{Deserialize, Serialize};

use crate::sandbox::{ContainerConfig, SandboxKind};

/// ```toml
/// [sandbox]
/// kind = "container"
/// image = "alpine:3"
/// memory = "256m"
/// pids_limit = 128
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSandboxConfig {
    pub kind: SandboxKind,
    /// Container profile; ignored by the process sandbox
    #[serde(flatten)]
    pub container: ContainerConfig,
}
