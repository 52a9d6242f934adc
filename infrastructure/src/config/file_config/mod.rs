//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Conversion into runtime values (policy, provider settings) happens here
//! so callers never touch the raw strings.

mod logging;
mod policy;
mod providers;
mod sandbox;
mod tools;

pub use logging::FileLoggingConfig;
pub use policy::FilePolicyConfig;
pub use providers::{DEFAULT_MAX_TOKENS, FileProvidersConfig, FileVendorConfig};
pub use sandbox::FileSandboxConfig;
pub use tools::FileToolsConfig;

use serde::{Deserialize, Serialize};
use toolgate_domain::Policy;

use super::ConfigError;
use crate::providers::{ProviderKind, ProviderSettings};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub providers: FileProvidersConfig,
    pub sandbox: FileSandboxConfig,
    pub policy: FilePolicyConfig,
    pub tools: FileToolsConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    pub fn to_policy(&self) -> Result<Policy, ConfigError> {
        self.policy.to_policy()
    }

    /// Connection settings for `kind`, reading API keys from the process
    /// environment.
    pub fn provider_settings(&self, kind: ProviderKind) -> ProviderSettings {
        self.providers
            .vendor(kind)
            .resolve(kind, |name| std::env::var(name).ok())
    }

    /// Check everything that can be checked without network or processes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_policy()?;
        if self.providers.default == ProviderKind::Compat
            && self.providers.compat.model.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConfigError::Invalid(
                "providers.compat.model is required when compat is the default provider".into(),
            ));
        }
        Ok(())
    }
}
