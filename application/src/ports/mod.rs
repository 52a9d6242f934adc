//! Ports (interfaces) implemented by the infrastructure layer

pub mod approval;
pub mod chat_provider;
pub mod credential_store;
pub mod memory_store;
pub mod notifier;
pub mod remote_tool;
pub mod sandbox;
pub mod tool;
