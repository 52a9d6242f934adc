//! Application layer for toolgate
//!
//! This crate contains port definitions, the tool registry and the tool
//! dispatch use case. It depends only on the domain layer.

pub mod ports;
pub mod registry;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    approval::{ApprovalDecision, ApprovalPort, AutoApprove, AutoDeny},
    chat_provider::{
        ChatProvider, ChatStream, ChatTurn, EVENT_CHANNEL_CAPACITY, EventSink, ProviderError,
        event_channel,
    },
    credential_store::CredentialStore,
    memory_store::{MemoryEntry, MemoryStore, StoreError},
    notifier::{Notifier, NotifyError},
    remote_tool::{RemoteToolClient, RemoteToolError, RemoteToolOutput},
    sandbox::{PathGuardError, Sandbox, SandboxError},
    tool::{Tool, ToolContext, ToolError, parse_input},
};
pub use registry::{RegistryError, ToolRegistry};
pub use use_cases::dispatch_tool_call::DispatchToolCallUseCase;
