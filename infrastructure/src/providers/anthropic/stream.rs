//! Anthropic stream normalizer
//!
//! ```text
//! message_start        → usage.input_tokens
//! content_block_start  → open tool slot (tool_use) / Token (text)
//! content_block_delta  → Token (text_delta) / append (input_json_delta)
//! content_block_stop   → ToolCall
//! message_delta        → usage.output_tokens
//! message_stop         → Done
//! error                → Error
//! ```

use toolgate_domain::{ChatEvent, StreamError, ToolCall, Usage};

use super::wire::{ContentBlock, Delta, MessagesResponse, StreamEvent};
use crate::providers::accumulator::ToolCallAccumulator;
use crate::providers::http::decode_json;
use crate::providers::sse::{StreamNormalizer, sse_data};

#[derive(Debug, Default)]
pub struct AnthropicNormalizer {
    tools: ToolCallAccumulator,
    usage: Usage,
    finished: bool,
}

impl AnthropicNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self, event: StreamEvent) -> Vec<ChatEvent> {
        match event {
            StreamEvent::MessageStart { message } => {
                self.usage.merge(message.usage.into());
                Vec::new()
            }
            StreamEvent::ContentBlockStart {
                index,
                content_block,
            } => match content_block {
                ContentBlock::ToolUse { id, name, .. } => {
                    self.tools.start(index, &id, &name);
                    Vec::new()
                }
                ContentBlock::Text { text } if !text.is_empty() => vec![ChatEvent::Token(text)],
                _ => Vec::new(),
            },
            StreamEvent::ContentBlockDelta { index, delta } => match delta {
                Delta::TextDelta { text } if !text.is_empty() => vec![ChatEvent::Token(text)],
                Delta::InputJsonDelta { partial_json } => {
                    self.tools.append(index, &partial_json);
                    Vec::new()
                }
                _ => Vec::new(),
            },
            StreamEvent::ContentBlockStop { index } => self
                .tools
                .finish(index)
                .map(ChatEvent::ToolCall)
                .into_iter()
                .collect(),
            StreamEvent::MessageDelta { usage } => {
                self.usage.merge(usage.into());
                Vec::new()
            }
            StreamEvent::MessageStop => self.finish(),
            StreamEvent::Error { error } => {
                self.finished = true;
                vec![ChatEvent::Error(StreamError::Vendor(format!(
                    "{}: {}",
                    error.kind, error.message
                )))]
            }
            StreamEvent::Ping | StreamEvent::Unknown => Vec::new(),
        }
    }

    fn finish(&mut self) -> Vec<ChatEvent> {
        self.finished = true;
        let mut events: Vec<ChatEvent> = self
            .tools
            .finish_all()
            .into_iter()
            .map(ChatEvent::ToolCall)
            .collect();
        events.push(ChatEvent::Done(self.usage));
        events
    }
}

impl StreamNormalizer for AnthropicNormalizer {
    fn on_line(&mut self, line: &str) -> Vec<ChatEvent> {
        if self.finished {
            return Vec::new();
        }
        // `event:` lines repeat the type carried in the data payload
        let Some(data) = sse_data(line) else {
            return Vec::new();
        };
        match serde_json::from_str::<StreamEvent>(data) {
            Ok(event) => self.handle(event),
            Err(e) => {
                tracing::trace!(error = %e, line = %data, "Skipping malformed Anthropic event");
                Vec::new()
            }
        }
    }

    fn on_end(&mut self) -> Vec<ChatEvent> {
        if self.finished {
            Vec::new()
        } else {
            self.finish()
        }
    }
}

/// Decode a non-streaming Messages response into events.
pub fn decode_full(body: &[u8]) -> Result<Vec<ChatEvent>, StreamError> {
    let response: MessagesResponse = decode_json(body)?;
    let mut events = Vec::new();
    for block in response.content {
        match block {
            ContentBlock::Text { text } if !text.is_empty() => events.push(ChatEvent::Token(text)),
            ContentBlock::ToolUse { id, name, input } => {
                events.push(ChatEvent::ToolCall(ToolCall::new(id, name, input)))
            }
            _ => {}
        }
    }
    events.push(ChatEvent::Done(response.usage.into()));
    Ok(events)
}
