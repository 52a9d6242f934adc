//! In-memory implementations of the store ports
//!
//! Process-lifetime only. Persistent and encrypted backends plug in
//! through the same traits.

mod credential;
mod memory;

pub use credential::InMemoryCredentialStore;
pub use memory::InMemoryMemoryStore;
