//! OpenAI-style stream normalizer
//!
//! Tool call fragments are keyed by `choices[0].delta.tool_calls[].index`.
//! Open calls are finalized when the choice reports a `finish_reason`, and
//! any stragglers are flushed at `[DONE]` or end of body. Usage may arrive
//! in a trailing chunk with an empty `choices` array, so `Done` waits for
//! `[DONE]`.

use toolgate_domain::{ChatEvent, StreamError, ToolCall, Usage};

use super::wire::{CompletionChunk, CompletionResponse, StreamLine};
use crate::providers::accumulator::{ToolCallAccumulator, parse_arguments};
use crate::providers::http::decode_json;
use crate::providers::sse::{StreamNormalizer, sse_data};

#[derive(Debug, Default)]
pub struct OpenAiNormalizer {
    tools: ToolCallAccumulator,
    usage: Usage,
    finished: bool,
}

impl OpenAiNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self, chunk: CompletionChunk) -> Vec<ChatEvent> {
        if let Some(error) = chunk.error {
            self.finished = true;
            return vec![ChatEvent::Error(StreamError::Vendor(error.message))];
        }
        if let Some(usage) = chunk.usage {
            self.usage.merge(usage.into());
        }

        let mut events = Vec::new();
        for choice in chunk.choices {
            if choice.index != 0 {
                tracing::trace!(choice = choice.index, "Ignoring alternate choice");
                continue;
            }
            if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                events.push(ChatEvent::Token(text));
            }
            for delta in choice.delta.tool_calls {
                let (name, arguments) = match delta.function {
                    Some(f) => (f.name, f.arguments),
                    None => (None, None),
                };
                self.tools
                    .identify(delta.index, delta.id.as_deref(), name.as_deref());
                if let Some(arguments) = arguments {
                    self.tools.append(delta.index, &arguments);
                }
            }
            if choice.finish_reason.is_some() {
                events.extend(self.flush_tools());
            }
        }
        events
    }

    fn flush_tools(&mut self) -> Vec<ChatEvent> {
        self.tools
            .finish_all()
            .into_iter()
            .map(ChatEvent::ToolCall)
            .collect()
    }

    fn finish(&mut self) -> Vec<ChatEvent> {
        self.finished = true;
        let mut events = self.flush_tools();
        events.push(ChatEvent::Done(self.usage));
        events
    }
}

impl StreamNormalizer for OpenAiNormalizer {
    fn on_line(&mut self, line: &str) -> Vec<ChatEvent> {
        if self.finished {
            return Vec::new();
        }
        let Some(data) = sse_data(line) else {
            return Vec::new();
        };
        match StreamLine::parse(data) {
            Ok(StreamLine::Done) => self.finish(),
            Ok(StreamLine::Chunk(chunk)) => self.handle(chunk),
            Err(e) => {
                tracing::trace!(error = %e, line = %data, "Skipping malformed OpenAI chunk");
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

/// Decode a non-streaming completion into events.
pub fn decode_full(body: &[u8]) -> Result<Vec<ChatEvent>, StreamError> {
    let response: CompletionResponse = decode_json(body)?;
    let mut events = Vec::new();
    if let Some(choice) = response.choices.into_iter().next() {
        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            events.push(ChatEvent::Token(text));
        }
        for call in choice.message.tool_calls {
            let input = parse_arguments(&call.function.name, &call.function.arguments);
            events.push(ChatEvent::ToolCall(ToolCall::new(
                call.id,
                call.function.name,
                input,
            )));
        }
    }
    events.push(ChatEvent::Done(
        response.usage.map(Usage::from).unwrap_or_default(),
    ));
    Ok(events)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::providers::sse::spawn_normalizer;
    use crate::providers::sse::tests::chunked;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    pub(crate) const TOOL_STREAM: &str = concat!(
        "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
        "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Checking\"}}]}\n\n",
        "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_abc\",\"type\":\"function\",\"function\":{\"name\":\"shell\",\"arguments\":\"\"}}]}}]}\n\n",
        "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"command\\\":\"}}]}}]}\n\n",
        "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"\\\"ls\\\"}\"}}]}}]}\n\n",
        "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"tool_calls\"}]}\n\n",
        "data: {\"id\":\"c1\",\"choices\":[],\"usage\":{\"prompt_tokens\":12,\"completion_tokens\":8,\"total_tokens\":20}}\n\n",
        "data: [DONE]\n\n",
    );

    fn run(lines: &str) -> Vec<ChatEvent> {
        let mut n = OpenAiNormalizer::new();
        let mut events: Vec<ChatEvent> = lines.lines().flat_map(|l| n.on_line(l)).collect();
        events.extend(n.on_end());
        events
    }

    #[test]
    fn test_tool_call_stream() {
        assert_eq!(
            run(TOOL_STREAM),
            vec![
                ChatEvent::Token("Checking".into()),
                ChatEvent::ToolCall(ToolCall::new("call_abc", "shell", json!({"command": "ls"}))),
                ChatEvent::Done(Usage::new(12, 8)),
            ]
        );
    }

    #[test]
    fn test_parallel_calls_flushed_in_index_order_at_done() {
        let events = run(concat!(
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":1,\"id\":\"b\",\"function\":{\"name\":\"second\",\"arguments\":\"{}\"}}]}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"a\",\"function\":{\"name\":\"first\"}}]}}]}\n",
            "data: [DONE]\n",
        ));
        assert_eq!(
            events,
            vec![
                ChatEvent::ToolCall(ToolCall::new("a", "first", json!({}))),
                ChatEvent::ToolCall(ToolCall::new("b", "second", json!({}))),
                ChatEvent::Done(Usage::default()),
            ]
        );
    }

    #[test]
    fn test_eof_without_done() {
        let events = run("data: {\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\n");
        assert_eq!(
            events,
            vec![
                ChatEvent::Token("hi".into()),
                ChatEvent::Done(Usage::default())
            ]
        );
    }

    #[test]
    fn test_error_chunk() {
        let events = run("data: {\"error\":{\"message\":\"rate limited\"}}\ndata: [DONE]\n");
        assert_eq!(
            events,
            vec![ChatEvent::Error(StreamError::Vendor("rate limited".into()))]
        );
    }

    #[tokio::test]
    async fn test_awkward_chunk_boundaries() {
        for size in [1, 2, 7, 50, 1 << 12] {
            let turn = spawn_normalizer(
                chunked(TOOL_STREAM, size),
                OpenAiNormalizer::new(),
                CancellationToken::new(),
            )
            .collect()
            .await
            .unwrap();
            assert_eq!(turn.text, "Checking");
            assert_eq!(turn.tool_calls[0].input, json!({"command": "ls"}));
            assert_eq!(turn.usage, Usage::new(12, 8));
        }
    }

    #[test]
    fn test_decode_full_response() {
        let body = json!({
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "read_file", "arguments": "{\"path\":\"a.txt\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 4, "completion_tokens": 6}
        });
        assert_eq!(
            decode_full(body.to_string().as_bytes()).unwrap(),
            vec![
                ChatEvent::ToolCall(ToolCall::new("call_1", "read_file", json!({"path": "a.txt"}))),
                ChatEvent::Done(Usage::new(4, 6)),
            ]
        );
    }
}
