//! Tool implementations
//!
//! Every tool is a standalone struct implementing
//! [`Tool`](toolgate_application::Tool):
//!
//! | Tool | Module | Needs |
//! |------|--------|-------|
//! | `shell` | [`shell`] | a sandbox |
//! | `read_file`, `write_file` | [`file`] | Path Guard (policy) |
//! | `http_request` | [`http`] | network posture (policy) |
//! | `memory` | [`memory`] | a [`MemoryStore`] |
//! | `credential` | [`credential`] | a [`CredentialStore`] |
//! | `notify` | [`notify`] | a [`Notifier`] |
//! | `server__tool` | [`bridge`] | a [`RemoteToolClient`](toolgate_application::RemoteToolClient) |
//!
//! [`BuiltinTools`] assembles the built-in set into a registry.

pub mod bridge;
pub mod credential;
pub mod file;
pub mod http;
pub mod memory;
pub mod notify;
pub mod shell;

use std::sync::Arc;

use toolgate_application::{CredentialStore, MemoryStore, Notifier, Tool, ToolRegistry};
use tracing::{debug, warn};

pub use bridge::{BridgedTool, register_remote_tools};
pub use credential::{CREDENTIAL, CredentialTool};
pub use file::{READ_FILE, ReadFileTool, WRITE_FILE, WriteFileTool};
pub use http::{HTTP_REQUEST, HttpRequestTool};
pub use memory::{MEMORY, MemoryTool};
pub use notify::{NOTIFY, NotifyTool};
pub use shell::{SHELL, ShellTool};

/// Names of all built-in tools
pub const BUILTIN_TOOLS: [&str; 7] = [
    SHELL,
    READ_FILE,
    WRITE_FILE,
    HTTP_REQUEST,
    MEMORY,
    CREDENTIAL,
    NOTIFY,
];

/// Collaborators for the built-in tools. Tools whose collaborator is
/// missing are skipped.
#[derive(Default)]
pub struct BuiltinTools {
    memory_store: Option<Arc<dyn MemoryStore>>,
    credential_store: Option<Arc<dyn CredentialStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    http_tool: Option<HttpRequestTool>,
}

impl BuiltinTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory_store(mut self, store: Arc<dyn MemoryStore>) -> Self {
        self.memory_store = Some(store);
        self
    }

    pub fn with_credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credential_store = Some(store);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Use a preconfigured HTTP tool, e.g. one built with
    /// [`HttpRequestTool::from_builder`] for proxies or custom TLS.
    pub fn with_http_tool(mut self, tool: HttpRequestTool) -> Self {
        self.http_tool = Some(tool);
        self
    }

    fn http_tool(&self) -> Option<HttpRequestTool> {
        if let Some(tool) = &self.http_tool {
            return Some(tool.clone());
        }
        match HttpRequestTool::new() {
            Ok(tool) => Some(tool),
            Err(e) => {
                warn!(error = %e, "Failed to build HTTP client; http_request disabled");
                None
            }
        }
    }

    fn create(&self, name: &str) -> Option<Arc<dyn Tool>> {
        match name {
            SHELL => Some(Arc::new(ShellTool::new())),
            READ_FILE => Some(Arc::new(ReadFileTool::new())),
            WRITE_FILE => Some(Arc::new(WriteFileTool::new())),
            HTTP_REQUEST => self
                .http_tool()
                .map(|t| Arc::new(t) as Arc<dyn Tool>),
            MEMORY => self
                .memory_store
                .clone()
                .map(|s| Arc::new(MemoryTool::new(s)) as Arc<dyn Tool>),
            CREDENTIAL => self
                .credential_store
                .clone()
                .map(|s| Arc::new(CredentialTool::new(s)) as Arc<dyn Tool>),
            NOTIFY => self
                .notifier
                .clone()
                .map(|n| Arc::new(NotifyTool::new(n)) as Arc<dyn Tool>),
            _ => None,
        }
    }

    /// Register the enabled built-ins (`enabled` empty = all). Returns the
    /// names that were registered.
    pub fn register_into(&self, registry: &ToolRegistry, enabled: &[String]) -> Vec<String> {
        for name in enabled {
            if !BUILTIN_TOOLS.contains(&name.as_str()) {
                warn!(tool = %name, "Unknown tool in [tools] enabled; ignoring");
            }
        }

        let mut registered = Vec::new();
        for name in BUILTIN_TOOLS {
            if !enabled.is_empty() && !enabled.iter().any(|e| e == name) {
                continue;
            }
            match self.create(name) {
                Some(tool) => {
                    registry.register(tool);
                    registered.push(name.to_string());
                }
                None => debug!(tool = name, "Skipping tool without a configured backend"),
            }
        }
        registered
    }

    /// Build a fresh registry with the enabled built-ins.
    pub fn build(&self, enabled: &[String]) -> ToolRegistry {
        let registry = ToolRegistry::new();
        self.register_into(&registry, enabled);
        registry
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;
    use toolgate_application::{Sandbox, SandboxError};
    use toolgate_domain::{Command, ExecResult, Policy};

    /// Sandbox returning a canned result and recording what it was asked
    /// to run.
    pub(crate) struct ScriptedSandbox {
        result: Option<ExecResult>,
        seen: Mutex<Vec<(Command, Policy)>>,
    }

    impl ScriptedSandbox {
        pub(crate) fn returning(result: ExecResult) -> Self {
            Self {
                result: Some(result),
                seen: Mutex::new(Vec::new()),
            }
        }

        /// For tools that must not execute anything.
        pub(crate) fn unused() -> Self {
            Self {
                result: None,
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn commands(&self) -> Vec<Command> {
            self.seen.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
        }

        pub(crate) fn policies(&self) -> Vec<Policy> {
            self.seen.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
        }
    }

    #[async_trait]
    impl Sandbox for ScriptedSandbox {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn exec(
            &self,
            _cancel: &CancellationToken,
            command: &Command,
            policy: &Policy,
        ) -> Result<ExecResult, SandboxError> {
            self.seen
                .lock()
                .unwrap()
                .push((command.clone(), policy.clone()));
            self.result
                .clone()
                .ok_or_else(|| SandboxError::Setup("sandbox should not be used".into()))
        }
    }
}
