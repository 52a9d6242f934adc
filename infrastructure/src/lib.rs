//! Infrastructure layer for toolgate
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer:
//!
//! - [`providers`]: Anthropic, OpenAI, Gemini and OpenAI-compatible chat
//!   providers with their stream normalizers
//! - [`sandbox`]: Path Guard plus process and container sandboxes
//! - [`tools`]: built-in tools and the remote tool bridge
//! - [`stores`]: in-memory memory and credential stores
//! - [`config`]: configuration file loading

pub mod config;
pub mod providers;
pub mod sandbox;
pub mod stores;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigError, ConfigLoader, ConfigSource, FileConfig};
pub use providers::{
    AnthropicProvider, GeminiProvider, OpenAiProvider, ProviderKind, ProviderSettings,
    build_provider, compat_provider,
};
pub use sandbox::{
    ContainerConfig, ContainerSandbox, PathGuard, ProcessSandbox, SandboxKind, build_sandbox,
};
pub use stores::{InMemoryCredentialStore, InMemoryMemoryStore};
pub use tools::{BUILTIN_TOOLS, BridgedTool, BuiltinTools, register_remote_tools};
