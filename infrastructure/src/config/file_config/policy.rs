//! Policy configuration from TOML (`[policy]` section)

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use toolgate_domain::{NetworkAccess, Policy};

use crate::config::ConfigError;

/// ```toml
/// [policy]
/// timeout_secs = 60
/// network = "allow_list"
/// allowed_hosts = ["api.github.com"]
/// allowed_paths = ["~/work"]
/// read_only_paths = ["~/work/vendor"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePolicyConfig {
    /// Unset or 0 means the built-in default
    pub timeout_secs: Option<u64>,
    /// 0 means the built-in default
    pub max_output_bytes: usize,
    /// `deny`, `allow_list` or `allow`
    pub network: String,
    pub allowed_hosts: Vec<String>,
    /// `~` expands to the home directory
    pub allowed_paths: Vec<String>,
    pub read_only_paths: Vec<String>,
    pub require_approval: bool,
}

impl Default for FilePolicyConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            max_output_bytes: 0,
            network: NetworkAccess::Deny.as_str().to_string(),
            allowed_hosts: Vec::new(),
            allowed_paths: Vec::new(),
            read_only_paths: Vec::new(),
            require_approval: false,
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None if path == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

impl FilePolicyConfig {
    pub fn to_policy(&self) -> Result<Policy, ConfigError> {
        let network_access: NetworkAccess = self
            .network
            .parse()
            .map_err(|e: String| ConfigError::Invalid(format!("policy.network: {}", e)))?;

        Ok(Policy {
            timeout: self
                .timeout_secs
                .filter(|s| *s > 0)
                .map(Duration::from_secs),
            max_output_bytes: self.max_output_bytes,
            network_access,
            allowed_hosts: self.allowed_hosts.clone(),
            allowed_paths: self.allowed_paths.iter().map(|p| expand_home(p)).collect(),
            read_only_paths: self.read_only_paths.iter().map(|p| expand_home(p)).collect(),
            require_approval: self.require_approval,
        })
    }
}
