//! Gemini stream normalizer
//!
//! Gemini sends whole parts rather than fragments: each `functionCall`
//! part is a complete call. There is no end marker, so `Done` is emitted
//! when the body ends.

use toolgate_domain::{ChatEvent, StreamError, ToolCall, Usage};

use super::wire::{GenerateResponse, ResponsePart, SYNTHETIC_ID_PREFIX};
use crate::providers::http::decode_json;
use crate::providers::sse::{StreamNormalizer, sse_data};

#[derive(Debug, Default)]
pub struct GeminiNormalizer {
    usage: Usage,
    next_call: usize,
    finished: bool,
}

impl GeminiNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self, response: GenerateResponse) -> Vec<ChatEvent> {
        if let Some(error) = response.error {
            self.finished = true;
            return vec![ChatEvent::Error(StreamError::Vendor(format!(
                "{}: {}",
                error.status, error.message
            )))];
        }
        if let Some(usage) = response.usage_metadata {
            self.usage.merge(usage.into());
        }

        let mut events = Vec::new();
        let parts = response
            .candidates
            .into_iter()
            .filter(|c| c.index == 0)
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts);
        for part in parts {
            match part {
                ResponsePart::Text { text, thought } if !thought && !text.is_empty() => {
                    events.push(ChatEvent::Token(text))
                }
                ResponsePart::FunctionCall { function_call } => {
                    let id = match function_call.id.filter(|id| !id.is_empty()) {
                        Some(id) => id,
                        None => format!("{}{}", SYNTHETIC_ID_PREFIX, self.next_call),
                    };
                    self.next_call += 1;
                    events.push(ChatEvent::ToolCall(ToolCall::new(
                        id,
                        function_call.name,
                        function_call.args,
                    )));
                }
                _ => {}
            }
        }
        events
    }

    fn finish(&mut self) -> Vec<ChatEvent> {
        self.finished = true;
        vec![ChatEvent::Done(self.usage)]
    }
}

impl StreamNormalizer for GeminiNormalizer {
    fn on_line(&mut self, line: &str) -> Vec<ChatEvent> {
        if self.finished {
            return Vec::new();
        }
        let Some(data) = sse_data(line) else {
            return Vec::new();
        };
        match serde_json::from_str::<GenerateResponse>(data) {
            Ok(response) => self.handle(response),
            Err(e) => {
                tracing::trace!(error = %e, line = %data, "Skipping malformed Gemini chunk");
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

/// Decode a non-streaming `generateContent` response into events.
pub fn decode_full(body: &[u8]) -> Result<Vec<ChatEvent>, StreamError> {
    let response: GenerateResponse = decode_json(body)?;
    let mut normalizer = GeminiNormalizer::new();
    let mut events = normalizer.handle(response);
    events.extend(normalizer.on_end());
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
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Looking \"}],\"role\":\"model\"},\"index\":0}],\"usageMetadata\":{\"promptTokenCount\":9}}\r\n\r\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"it up.\"}],\"role\":\"model\"},\"index\":0}]}\r\n\r\n",
        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"functionCall\":{\"name\":\"weather\",\"args\":{\"city\":\"Oslo\"}}}],\"role\":\"model\"},\"finishReason\":\"STOP\",\"index\":0}],\"usageMetadata\":{\"promptTokenCount\":9,\"candidatesTokenCount\":14}}\r\n\r\n",
    );

    fn run(lines: &str) -> Vec<ChatEvent> {
        let mut n = GeminiNormalizer::new();
        let mut events: Vec<ChatEvent> = lines.lines().flat_map(|l| n.on_line(l)).collect();
        events.extend(n.on_end());
        events
    }

    #[test]
    fn test_function_call_stream() {
        assert_eq!(
            run(TOOL_STREAM),
            vec![
                ChatEvent::Token("Looking ".into()),
                ChatEvent::Token("it up.".into()),
                ChatEvent::ToolCall(ToolCall::new(
                    "gemini_call_0",
                    "weather",
                    json!({"city": "Oslo"})
                )),
                ChatEvent::Done(Usage::new(9, 14)),
            ]
        );
    }

    #[test]
    fn test_vendor_ids_and_missing_args() {
        let events = run(concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[",
            "{\"functionCall\":{\"id\":\"fc_1\",\"name\":\"a\"}},",
            "{\"functionCall\":{\"name\":\"b\",\"args\":{}}}",
            "]}}]}\n",
        ));
        assert_eq!(
            events,
            vec![
                ChatEvent::ToolCall(ToolCall::new("fc_1", "a", json!({}))),
                ChatEvent::ToolCall(ToolCall::new("gemini_call_1", "b", json!({}))),
                ChatEvent::Done(Usage::default()),
            ]
        );
    }

    #[test]
    fn test_thought_parts_and_garbage_skipped() {
        let events = run(concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"plan\",\"thought\":true},{\"text\":\"answer\"}]}}]}\n",
            "data: not-json\n",
        ));
        assert_eq!(
            events,
            vec![
                ChatEvent::Token("answer".into()),
                ChatEvent::Done(Usage::default())
            ]
        );
    }

    #[test]
    fn test_error_payload() {
        let events = run(
            "data: {\"error\":{\"code\":429,\"status\":\"RESOURCE_EXHAUSTED\",\"message\":\"quota\"}}\n",
        );
        assert_eq!(
            events,
            vec![ChatEvent::Error(StreamError::Vendor(
                "RESOURCE_EXHAUSTED: quota".into()
            ))]
        );
    }

    #[tokio::test]
    async fn test_awkward_chunk_boundaries() {
        for size in [1, 5, 33, 2048] {
            let turn = spawn_normalizer(
                chunked(TOOL_STREAM, size),
                GeminiNormalizer::new(),
                CancellationToken::new(),
            )
            .collect()
            .await
            .unwrap();
            assert_eq!(turn.text, "Looking it up.");
            assert_eq!(turn.tool_calls[0].name, "weather");
            assert_eq!(turn.usage, Usage::new(9, 14));
        }
    }

    #[test]
    fn test_decode_full_response() {
        let body = json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Sunny."}]}}],
            "usageMetadata": {"promptTokenCount": 2, "candidatesTokenCount": 3}
        });
        assert_eq!(
            decode_full(body.to_string().as_bytes()).unwrap(),
            vec![
                ChatEvent::Token("Sunny.".into()),
                ChatEvent::Done(Usage::new(2, 3))
            ]
        );
    }
}
