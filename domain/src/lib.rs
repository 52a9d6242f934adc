//! Domain layer for toolgate
//!
//! This crate contains the vendor-neutral data model shared by providers,
//! sandboxes and tools. It has no dependencies on infrastructure concerns.
//!
//! # Core Concepts
//!
//! ## Chat
//!
//! - [`ChatRequest`] / [`ChatMessage`]: what the caller sends to a provider
//! - [`ChatEvent`]: the single ordered event vocabulary every vendor stream
//!   is normalized into (tokens, assembled tool calls, one terminal event)
//!
//! ## Tools
//!
//! - [`ToolDefinition`]: schema advertised to the model
//! - [`ToolCall`] / [`ToolResult`]: one invocation and its answer
//!
//! ## Sandbox
//!
//! - [`Policy`]: timeouts, output caps, network posture, path allow/deny lists
//! - [`Command`] / [`ExecResult`]: execution request and uniform outcome

pub mod core;
pub mod sandbox;
pub mod session;
pub mod tool;
pub mod util;

// Re-export commonly used types
pub use core::error::DomainError;
pub use sandbox::{
    Command, DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT, ExecResult, NetworkAccess, Policy,
};
pub use session::{ChatEvent, ChatMessage, ChatRequest, Role, StreamError, Usage};
pub use tool::{ToolCall, ToolDefinition, ToolResult, default_input_schema};
pub use util::{TRUNCATION_MARKER, cap_with_marker, truncate_str};
