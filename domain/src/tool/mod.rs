//! Tool domain module
//!
//! Data types describing tools and their invocations. The capability
//! itself (the `Tool` trait) and the registry live in the application
//! layer; this module stays free of I/O.
//!
//! ```text
//! ToolDefinition ──▶ ChatRequest.tools ──▶ model
//!                                            │
//! ToolResult ◀── Tool::execute ◀── ToolCall ◀┘
//! ```

pub mod entities;
pub mod value_objects;

pub use entities::{ToolCall, ToolDefinition, default_input_schema};
pub use value_objects::ToolResult;
