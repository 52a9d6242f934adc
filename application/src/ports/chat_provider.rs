//! Chat provider port
//!
//! Defines the vendor-neutral contract for talking to an LLM and the
//! bounded channel that carries its normalized event stream.
//!
//! # Stream lifecycle
//!
//! ```text
//! ChatProvider::chat()
//!   ├─ Err(ProviderError)  request build failed / non-success HTTP status
//!   └─ Ok(ChatStream)      background task owns the response body
//!        Token* ToolCall* ... then exactly one Done | Error, then closed
//! ```
//!
//! Once `chat` has returned `Ok`, every later failure (I/O, decode,
//! cancellation) arrives as a terminal [`ChatEvent::Error`].

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use toolgate_domain::{ChatEvent, ChatRequest, StreamError, ToolCall, Usage};

/// Buffered events per stream before the producer blocks on emission.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Errors returned by [`ChatProvider::chat`] before streaming begins
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to build request: {0}")]
    RequestBuild(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Operation cancelled")]
    Cancelled,
}

/// A vendor-neutral chat backend.
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Short identifier (e.g. "anthropic")
    fn name(&self) -> &str;

    /// Model used when the request leaves `model` empty
    fn default_model(&self) -> &str;

    /// Send a request and return its event stream.
    async fn chat(
        &self,
        cancel: CancellationToken,
        request: ChatRequest,
    ) -> Result<ChatStream, ProviderError>;
}

/// Create a connected sink/stream pair with the standard capacity.
pub fn event_channel() -> (EventSink, ChatStream) {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    (EventSink::new(tx), ChatStream::new(rx))
}

/// Producer side of a chat stream.
///
/// Enforces the single-terminal invariant: after the first `Done`/`Error`
/// the sender is dropped, closing the channel, and later emissions are
/// discarded.
#[derive(Debug)]
pub struct EventSink {
    sender: Option<mpsc::Sender<ChatEvent>>,
}

impl EventSink {
    pub fn new(sender: mpsc::Sender<ChatEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Send one event, waiting while the channel is full.
    ///
    /// Returns `false` once the stream has terminated or the consumer went
    /// away; producers should stop reading input at that point.
    pub async fn emit(&mut self, event: ChatEvent) -> bool {
        let Some(sender) = self.sender.as_ref() else {
            return false;
        };
        let terminal = event.is_terminal();
        let delivered = sender.send(event).await.is_ok();
        if terminal || !delivered {
            self.sender = None;
        }
        delivered && !terminal
    }

    /// Whether a terminal event was emitted or the consumer is gone.
    pub fn is_closed(&self) -> bool {
        self.sender.as_ref().is_none_or(|s| s.is_closed())
    }
}

/// The text, tool calls and usage of one completed turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatTurn {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Usage,
}

/// Handle for receiving normalized events from a provider.
///
/// Wraps an `mpsc::Receiver<ChatEvent>` and provides convenience methods
/// for consuming the stream.
#[derive(Debug)]
pub struct ChatStream {
    receiver: mpsc::Receiver<ChatEvent>,
}

impl ChatStream {
    pub fn new(receiver: mpsc::Receiver<ChatEvent>) -> Self {
        Self { receiver }
    }

    /// Receive the next event, or `None` once the channel has closed.
    pub async fn recv(&mut self) -> Option<ChatEvent> {
        self.receiver.recv().await
    }

    /// Consume the stream into a [`ChatTurn`].
    pub async fn collect(mut self) -> Result<ChatTurn, StreamError> {
        let mut turn = ChatTurn::default();
        while let Some(event) = self.receiver.recv().await {
            match event {
                ChatEvent::Token(chunk) => turn.text.push_str(&chunk),
                ChatEvent::ToolCall(call) => turn.tool_calls.push(call),
                ChatEvent::Done(usage) => {
                    turn.usage = usage;
                    return Ok(turn);
                }
                ChatEvent::Error(e) => return Err(e),
            }
        }
        Err(StreamError::Transport(
            "stream closed without a terminal event".to_string(),
        ))
    }

    /// Adapt into a [`futures::Stream`].
    pub fn into_stream(self) -> impl Stream<Item = ChatEvent> + Send {
        futures::stream::unfold(self.receiver, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn sink_closes_after_terminal_event() {
        let (mut sink, mut stream) = event_channel();
        assert!(sink.emit(ChatEvent::Token("a".into())).await);
        assert!(!sink.emit(ChatEvent::Done(Usage::new(1, 2))).await);
        assert!(sink.is_closed());
        assert!(!sink.emit(ChatEvent::Token("late".into())).await);

        assert_eq!(stream.recv().await, Some(ChatEvent::Token("a".into())));
        assert_eq!(stream.recv().await, Some(ChatEvent::Done(Usage::new(1, 2))));
        assert_eq!(stream.recv().await, None);
    }

    #[tokio::test]
    async fn sink_reports_dropped_consumer() {
        let (mut sink, stream) = event_channel();
        drop(stream);
        assert!(!sink.emit(ChatEvent::Token("x".into())).await);
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn collect_assembles_turn() {
        let (mut sink, stream) = event_channel();
        tokio::spawn(async move {
            sink.emit(ChatEvent::Token("Hel".into())).await;
            sink.emit(ChatEvent::Token("lo".into())).await;
            sink.emit(ChatEvent::ToolCall(ToolCall::new(
                "t1",
                "shell",
                serde_json::json!({"command": "ls"}),
            )))
            .await;
            sink.emit(ChatEvent::Done(Usage::new(3, 4))).await;
        });

        let turn = stream.collect().await.unwrap();
        assert_eq!(turn.text, "Hello");
        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(turn.usage, Usage::new(3, 4));
    }

    #[tokio::test]
    async fn collect_surfaces_stream_error() {
        let (mut sink, stream) = event_channel();
        tokio::spawn(async move {
            sink.emit(ChatEvent::Token("partial".into())).await;
            sink.emit(ChatEvent::Error(StreamError::Cancelled)).await;
        });
        assert_eq!(stream.collect().await, Err(StreamError::Cancelled));
    }

    #[tokio::test]
    async fn collect_without_terminal_is_an_error() {
        let (sink, stream) = event_channel();
        drop(sink);
        assert!(matches!(
            stream.collect().await,
            Err(StreamError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn into_stream_yields_all_events() {
        let (mut sink, stream) = event_channel();
        tokio::spawn(async move {
            sink.emit(ChatEvent::Token("x".into())).await;
            sink.emit(ChatEvent::Done(Usage::default())).await;
        });
        let events: Vec<ChatEvent> = stream.into_stream().collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[1].is_terminal());
    }
}
