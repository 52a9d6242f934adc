//! Server-Sent Events plumbing shared by every vendor normalizer
//!
//! ```text
//! response body ──bytes──▶ LineBuffer ──lines──▶ StreamNormalizer ──events──▶ EventSink
//!                  ▲                                                       │
//!                  └──────────── stops on cancel / terminal event ◀────────┘
//! ```
//!
//! The pump owns the body for its whole lifetime and drops it together with
//! the sink, so the HTTP connection and the event channel close together.

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use toolgate_application::{ChatStream, EventSink, event_channel};
use toolgate_domain::{ChatEvent, StreamError, Usage};

/// Vendor-specific translation from SSE lines to [`ChatEvent`]s.
///
/// Normalizers are synchronous state machines: all I/O, cancellation and
/// backpressure live in [`pump`].
pub trait StreamNormalizer: Send + 'static {
    /// Consume one line (without its trailing newline). Blank lines,
    /// comments and `event:` lines are passed through too.
    fn on_line(&mut self, line: &str) -> Vec<ChatEvent>;

    /// The body ended. Flush pending state and emit the terminal event if
    /// one has not been produced yet.
    fn on_end(&mut self) -> Vec<ChatEvent>;
}

/// Payload of a `data:` line, with the optional single leading space removed.
pub fn sse_data(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("data:")?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Name of an `event:` line.
pub fn sse_event(line: &str) -> Option<&str> {
    line.strip_prefix("event:").map(str::trim)
}

/// Splits an arbitrary chunked byte stream into lines.
///
/// Bytes are buffered until a newline arrives, so multi-byte UTF-8 sequences
/// split across chunks decode correctly.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append a chunk and return every line it completed.
    ///
    /// `pending` never holds a newline between calls, so only the new bytes
    /// are scanned.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut search_from = self.pending.len();
        self.pending.extend_from_slice(chunk);

        let mut line_start = 0;
        let mut lines = Vec::new();
        while let Some(offset) = self.pending[search_from..].iter().position(|&b| b == b'\n') {
            let end = search_from + offset;
            lines.push(decode_line(&self.pending[line_start..end]));
            line_start = end + 1;
            search_from = line_start;
        }
        self.pending.drain(..line_start);
        lines
    }

    /// Return the unterminated trailing line, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.pending);
        Some(decode_line(&raw))
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Spawn a background task that drives `normalizer` over `body`.
pub fn spawn_normalizer<S, B, E, N>(body: S, normalizer: N, cancel: CancellationToken) -> ChatStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
    N: StreamNormalizer,
{
    let (sink, stream) = event_channel();
    tokio::spawn(pump(body, normalizer, sink, cancel));
    stream
}

/// Drive a normalizer until the body ends, a terminal event is emitted,
/// the consumer goes away, or `cancel` fires.
pub async fn pump<S, B, E, N>(body: S, mut normalizer: N, mut sink: EventSink, cancel: CancellationToken)
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
    N: StreamNormalizer,
{
    let mut body = std::pin::pin!(body);
    let mut lines = LineBuffer::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Stream cancelled while waiting for data");
                sink.emit(ChatEvent::Error(StreamError::Cancelled)).await;
                return;
            }
            next = body.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                for line in lines.push(chunk.as_ref()) {
                    if !feed_line(&mut normalizer, &mut sink, &cancel, &line).await {
                        return;
                    }
                }
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "Failed to read response body");
                sink.emit(ChatEvent::Error(StreamError::Transport(e.to_string())))
                    .await;
                return;
            }
            None => break,
        }
    }

    if let Some(line) = lines.finish()
        && !feed_line(&mut normalizer, &mut sink, &cancel, &line).await
    {
        return;
    }

    for event in normalizer.on_end() {
        if !sink.emit(event).await {
            return;
        }
    }

    // Normalizers always finish with a terminal event; this covers one that
    // did not, so the consumer never waits on an unterminated stream.
    if !sink.is_closed() {
        sink.emit(ChatEvent::Done(Usage::default())).await;
    }
}

/// Returns `false` once the pump must stop.
async fn feed_line<N: StreamNormalizer>(
    normalizer: &mut N,
    sink: &mut EventSink,
    cancel: &CancellationToken,
    line: &str,
) -> bool {
    if cancel.is_cancelled() {
        tracing::debug!("Stream cancelled between lines");
        sink.emit(ChatEvent::Error(StreamError::Cancelled)).await;
        return false;
    }
    for event in normalizer.on_line(line) {
        if !sink.emit(event).await {
            return false;
        }
    }
    true
}
