//! Streaming events for chat provider communication.
//!
//! [`ChatEvent`] is the single vocabulary every vendor normalizer emits.
//! A stream is zero or more [`Token`](ChatEvent::Token) /
//! [`ToolCall`](ChatEvent::ToolCall) events followed by exactly one terminal
//! event ([`Done`](ChatEvent::Done) or [`Error`](ChatEvent::Error)).

use crate::tool::ToolCall;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token accounting reported by the vendor, best effort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Merge a later (possibly partial) report into this one.
    ///
    /// Vendors that report input tokens at stream start and output tokens
    /// at completion send zeros for the field they are not reporting, so
    /// zeros never overwrite a known count.
    pub fn merge(&mut self, other: Usage) {
        if other.input_tokens > 0 {
            self.input_tokens = other.input_tokens;
        }
        if other.output_tokens > 0 {
            self.output_tokens = other.output_tokens;
        }
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// Cause carried by a terminal [`ChatEvent::Error`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("Stream cancelled")]
    Cancelled,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Vendor error: {0}")]
    Vendor(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// An event in a normalized chat stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// An incremental text fragment, forwarded as soon as it arrives.
    Token(String),
    /// A fully assembled tool invocation.
    ToolCall(ToolCall),
    /// Successful end of stream.
    Done(Usage),
    /// Failed end of stream.
    Error(StreamError),
}

impl ChatEvent {
    /// Returns the text content if this is a Token event.
    pub fn text(&self) -> Option<&str> {
        match self {
            ChatEvent::Token(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true if this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChatEvent::Done(_) | ChatEvent::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_text_returns_content() {
        let event = ChatEvent::Token("hello".to_string());
        assert_eq!(event.text(), Some("hello"));
        assert!(!event.is_terminal());
    }

    #[test]
    fn done_and_error_are_terminal() {
        assert!(ChatEvent::Done(Usage::default()).is_terminal());
        assert!(ChatEvent::Error(StreamError::Cancelled).is_terminal());
    }

    #[test]
    fn tool_call_is_not_terminal() {
        let event = ChatEvent::ToolCall(ToolCall::new("id", "shell", serde_json::json!({})));
        assert!(!event.is_terminal());
        assert_eq!(event.text(), None);
    }

    #[test]
    fn usage_merge_keeps_known_counts() {
        let mut usage = Usage::new(120, 0);
        usage.merge(Usage::new(0, 45));
        assert_eq!(usage, Usage::new(120, 45));

        usage.merge(Usage::default());
        assert_eq!(usage, Usage::new(120, 45));
        assert_eq!(usage.total(), 165);
    }

    #[test]
    fn usage_merge_takes_later_cumulative_counts() {
        let mut usage = Usage::new(10, 5);
        usage.merge(Usage::new(10, 30));
        assert_eq!(usage.output_tokens, 30);
    }
}
