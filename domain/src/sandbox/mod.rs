//! Sandbox domain module
//!
//! [`Policy`] is the envelope a caller hands to a sandbox, [`Command`] the
//! request, and [`ExecResult`] the uniform outcome. Execution itself lives
//! behind the `Sandbox` port in the application layer.

pub mod command;
pub mod policy;

pub use command::{Command, ExecResult};
pub use policy::{DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT, NetworkAccess, Policy};
