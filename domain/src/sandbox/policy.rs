//! Execution policy: the resource and access envelope for one execution.

use std::path::PathBuf;
use std::time::Duration;

/// Timeout applied when a policy leaves it unset or non-positive.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Output cap applied per stream when a policy leaves it at zero (1 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Network posture for an execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NetworkAccess {
    /// No network at all.
    #[default]
    Deny,
    /// Only hosts listed in [`Policy::allowed_hosts`].
    AllowList,
    /// Unrestricted.
    Allow,
}

impl NetworkAccess {
    pub fn as_str(&self) -> &str {
        match self {
            NetworkAccess::Deny => "deny",
            NetworkAccess::AllowList => "allow_list",
            NetworkAccess::Allow => "allow",
        }
    }
}

impl std::fmt::Display for NetworkAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NetworkAccess {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "deny" | "none" => Ok(NetworkAccess::Deny),
            "allow_list" | "allowlist" => Ok(NetworkAccess::AllowList),
            "allow" | "all" => Ok(NetworkAccess::Allow),
            other => Err(format!("unknown network access '{}'", other)),
        }
    }
}

/// Caller-owned policy for a sandbox execution or tool call.
///
/// Defaults are resolved at the point of use ([`effective_timeout`](Self::effective_timeout),
/// [`effective_max_output_bytes`](Self::effective_max_output_bytes)), so a
/// policy built with `Default::default()` still behaves sensibly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    pub timeout: Option<Duration>,
    pub max_output_bytes: usize,
    pub network_access: NetworkAccess,
    /// Hosts reachable under [`NetworkAccess::AllowList`]
    pub allowed_hosts: Vec<String>,
    /// Filesystem roots that may be touched (empty = anywhere)
    pub allowed_paths: Vec<PathBuf>,
    /// Roots that must not be written (empty = nothing read-only)
    pub read_only_paths: Vec<PathBuf>,
    pub require_approval: bool,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    pub fn with_network_access(mut self, access: NetworkAccess) -> Self {
        self.network_access = access;
        self
    }

    pub fn with_allowed_host(mut self, host: impl Into<String>) -> Self {
        self.allowed_hosts.push(host.into());
        self
    }

    pub fn with_allowed_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.allowed_paths.push(path.into());
        self
    }

    pub fn with_read_only_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.read_only_paths.push(path.into());
        self
    }

    pub fn with_require_approval(mut self, require: bool) -> Self {
        self.require_approval = require;
        self
    }

    pub fn effective_timeout(&self) -> Duration {
        match self.timeout {
            Some(t) if !t.is_zero() => t,
            _ => DEFAULT_TIMEOUT,
        }
    }

    pub fn effective_max_output_bytes(&self) -> usize {
        if self.max_output_bytes == 0 {
            DEFAULT_MAX_OUTPUT_BYTES
        } else {
            self.max_output_bytes
        }
    }

    /// Whether outbound traffic to `host` is permitted.
    ///
    /// Allow-list entries match the host exactly or any subdomain of it;
    /// a leading `*.` or `.` on an entry is accepted and ignored.
    pub fn host_allowed(&self, host: &str) -> bool {
        match self.network_access {
            NetworkAccess::Deny => false,
            NetworkAccess::Allow => true,
            NetworkAccess::AllowList => {
                let host = host.trim_end_matches('.').to_ascii_lowercase();
                self.allowed_hosts.iter().any(|entry| {
                    let entry = entry
                        .trim_start_matches("*.")
                        .trim_start_matches('.')
                        .to_ascii_lowercase();
                    host == entry || host.ends_with(&format!(".{}", entry))
                })
            }
        }
    }
}
