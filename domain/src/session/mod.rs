//! Session domain module
//!
//! Conversation messages, the vendor-neutral request, and the normalized
//! event vocabulary produced by every provider.

pub mod entities;
pub mod request;
pub mod stream;

pub use entities::{ChatMessage, Role};
pub use request::ChatRequest;
pub use stream::{ChatEvent, StreamError, Usage};
