//! Vendor chat providers
//!
//! Each vendor module pairs a [`ChatProvider`] adapter with a stream
//! normalizer. [`build_provider`] selects one from configuration.

pub mod accumulator;
pub mod anthropic;
pub mod compat;
pub mod gemini;
pub mod http;
pub mod openai;
pub mod sse;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use toolgate_application::{ChatProvider, ProviderError};
use toolgate_domain::ChatRequest;

pub use anthropic::AnthropicProvider;
pub use compat::compat_provider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    #[serde(alias = "claude")]
    Anthropic,
    OpenAi,
    #[serde(alias = "google")]
    Gemini,
    #[serde(alias = "openai-compatible")]
    Compat,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Anthropic,
        ProviderKind::OpenAi,
        ProviderKind::Gemini,
        ProviderKind::Compat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Compat => "compat",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
            ProviderKind::Compat => "http://localhost:11434/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "claude-sonnet-4-5",
            ProviderKind::OpenAi => "gpt-4o",
            ProviderKind::Gemini => "gemini-2.5-flash",
            ProviderKind::Compat => "",
        }
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Compat => "",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "compat" | "openai-compatible" | "openai_compatible" => Ok(ProviderKind::Compat),
            other => Err(ProviderError::Configuration(format!(
                "unknown provider '{}' (expected one of: anthropic, openai, gemini, compat)",
                other
            ))),
        }
    }
}

/// Resolved connection settings for one provider
#[derive(Debug, Clone, Default)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub streaming: bool,
    /// Anthropic `anthropic-version` header
    pub api_version: Option<String>,
    /// Extra headers (compat servers)
    pub headers: BTreeMap<String, String>,
}

impl ProviderSettings {
    pub(crate) fn require_api_key(&self, kind: ProviderKind) -> Result<String, ProviderError> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::Configuration(format!(
                    "no API key configured for provider '{}' (set {} or providers.{}.api_key)",
                    kind,
                    kind.default_api_key_env(),
                    kind
                ))
            })
    }
}

pub(crate) fn build_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::Configuration(format!("failed to build HTTP client: {}", e)))
}

/// Reject requests no vendor would accept.
pub(crate) fn validate_request(request: &ChatRequest) -> Result<(), ProviderError> {
    if request.conversation().next().is_none() {
        return Err(ProviderError::RequestBuild(
            "request has no conversational messages".to_string(),
        ));
    }
    for message in &request.messages {
        message
            .validate()
            .map_err(|e| ProviderError::RequestBuild(e.to_string()))?;
    }
    for tool in &request.tools {
        tool.validate()
            .map_err(|e| ProviderError::RequestBuild(e.to_string()))?;
    }
    Ok(())
}

/// Construct the provider for `kind`.
pub fn build_provider(
    kind: ProviderKind,
    settings: ProviderSettings,
) -> Result<Arc<dyn ChatProvider>, ProviderError> {
    tracing::debug!(provider = %kind, base_url = %settings.base_url, model = %settings.model, "Building provider");
    Ok(match kind {
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(settings)?),
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(settings)?),
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(settings)?),
        ProviderKind::Compat => Arc::new(compat_provider(settings)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolgate_domain::{ChatMessage, ToolDefinition};

    #[test]
    fn test_kind_parse_round_trip() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        }
        assert_eq!("Claude".parse::<ProviderKind>().unwrap(), ProviderKind::Anthropic);
        assert!("bedrock".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_validate_request() {
        let empty = ChatRequest::new(vec![ChatMessage::system("only system")]);
        assert!(matches!(
            validate_request(&empty),
            Err(ProviderError::RequestBuild(_))
        ));

        let bad_tool = ChatRequest::new(vec![ChatMessage::user("hi")])
            .with_tools(vec![ToolDefinition::new("", "nameless")]);
        assert!(validate_request(&bad_tool).is_err());

        assert!(validate_request(&ChatRequest::new(vec![ChatMessage::user("hi")])).is_ok());
    }

    #[test]
    fn test_build_provider_names() {
        let settings = ProviderSettings {
            api_key: Some("k".into()),
            base_url: "http://localhost:1".into(),
            ..Default::default()
        };
        for kind in ProviderKind::ALL {
            let provider = build_provider(kind, settings.clone()).unwrap();
            assert_eq!(provider.name(), kind.as_str());
        }
    }
}
