//! Provider configuration from TOML (`[providers]` section)
//!
//! ```toml
//! [providers]
//! default = "anthropic"
//!
//! [providers.anthropic]
//! model = "claude-sonnet-4-5"
//! max_tokens = 8192
//!
//! [providers.compat]
//! base_url = "http://localhost:8080/v1"
//! model = "llama3"
//! headers = { "x-router-key" = "..." }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::providers::{ProviderKind, ProviderSettings};

/// Default max tokens per response when neither config nor request sets it
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Settings for one vendor. Unset fields fall back to the vendor's defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileVendorConfig {
    /// Environment variable holding the API key (default per vendor)
    pub api_key_env: Option<String>,
    /// Direct API key (not recommended; use the env var instead)
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    /// Stream responses (SSE) instead of one JSON document
    pub streaming: bool,
    /// `anthropic-version` header (anthropic only)
    pub api_version: Option<String>,
    /// Extra request headers
    pub headers: BTreeMap<String, String>,
}

impl Default for FileVendorConfig {
    fn default() -> Self {
        Self {
            api_key_env: None,
            api_key: None,
            base_url: None,
            model: None,
            max_tokens: None,
            streaming: true,
            api_version: None,
            headers: BTreeMap::new(),
        }
    }
}

impl FileVendorConfig {
    /// Resolve against `kind`'s defaults. `env` looks up environment
    /// variables (injectable for tests).
    pub fn resolve(
        &self,
        kind: ProviderKind,
        env: impl Fn(&str) -> Option<String>,
    ) -> ProviderSettings {
        let key_env = self
            .api_key_env
            .clone()
            .unwrap_or_else(|| kind.default_api_key_env().to_string());
        let api_key = self
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| (!key_env.is_empty()).then(|| env(&key_env)).flatten())
            .filter(|k| !k.is_empty());

        ProviderSettings {
            api_key,
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| kind.default_base_url().to_string()),
            model: self
                .model
                .clone()
                .unwrap_or_else(|| kind.default_model().to_string()),
            max_tokens: self.max_tokens.filter(|t| *t > 0).unwrap_or(DEFAULT_MAX_TOKENS),
            streaming: self.streaming,
            api_version: self.api_version.clone(),
            headers: self.headers.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    /// Provider used when none is given on the command line
    pub default: ProviderKind,
    pub anthropic: FileVendorConfig,
    pub openai: FileVendorConfig,
    pub gemini: FileVendorConfig,
    pub compat: FileVendorConfig,
}

impl FileProvidersConfig {
    pub fn vendor(&self, kind: ProviderKind) -> &FileVendorConfig {
        match kind {
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::Compat => &self.compat,
        }
    }
}
