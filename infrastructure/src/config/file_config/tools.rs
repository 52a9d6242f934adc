//! Tools configuration from TOML (`[tools]` section)

use serde::{Deserialize, Serialize};

/// ```toml
/// [tools]
/// enabled = ["shell", "read_file"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    /// Built-in tools to register; empty registers all of them
    pub enabled: Vec<String>,
}
