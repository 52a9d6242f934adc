//! OpenAI Chat Completions wire types

use serde::{Deserialize, Serialize};
use toolgate_domain::{ChatMessage, ChatRequest, Role, ToolDefinition, Usage};

// ─── Request ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
}

#[derive(Debug, Serialize)]
pub struct StreamOptions {
    pub include_usage: bool,
}

#[derive(Debug, Serialize)]
pub struct WireMessage<'a> {
    pub role: &'static str,
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: WireFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    /// JSON-encoded arguments
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Serialize)]
pub struct WireTool<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: WireFunction<'a>,
}

#[derive(Debug, Serialize)]
pub struct WireFunction<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub parameters: &'a serde_json::Value,
}

impl<'a> From<&'a ToolDefinition> for WireTool<'a> {
    fn from(def: &'a ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: WireFunction {
                name: &def.name,
                description: &def.description,
                parameters: &def.input_schema,
            },
        }
    }
}

impl<'a> CompletionRequest<'a> {
    pub fn build(request: &'a ChatRequest, model: &'a str, max_tokens: u32, stream: bool) -> Self {
        let mut messages = Vec::new();
        if let Some(system) = request.system_prompt() {
            messages.push(WireMessage {
                role: "system",
                content: Some(system),
                tool_calls: Vec::new(),
                tool_call_id: None,
            });
        }
        for message in request.conversation() {
            convert_message(message, &mut messages);
        }

        Self {
            model,
            max_tokens,
            messages,
            tools: request.tools.iter().map(WireTool::from).collect(),
            temperature: request.temperature,
            stream,
            stream_options: stream.then_some(StreamOptions {
                include_usage: true,
            }),
        }
    }
}

fn convert_message<'a>(message: &'a ChatMessage, out: &mut Vec<WireMessage<'a>>) {
    // Results travel as separate `tool` role messages ahead of any text
    for result in &message.tool_results {
        let content = if result.is_error {
            format!("Error: {}", result.content)
        } else {
            result.content.clone()
        };
        out.push(WireMessage {
            role: "tool",
            content: Some(content),
            tool_calls: Vec::new(),
            tool_call_id: Some(&result.tool_call_id),
        });
    }

    let role = match message.role {
        Role::Assistant => "assistant",
        _ => "user",
    };
    let tool_calls: Vec<WireToolCall> = message
        .tool_calls
        .iter()
        .map(|call| WireToolCall {
            id: call.id.clone(),
            kind: function_type(),
            function: WireFunctionCall {
                name: call.name.clone(),
                arguments: call.input.to_string(),
            },
        })
        .collect();

    if message.content.is_empty() && tool_calls.is_empty() {
        return;
    }
    out.push(WireMessage {
        role,
        content: (!message.content.is_empty()).then(|| message.content.clone()),
        tool_calls,
        tool_call_id: None,
    });
}

// ─── Response ────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct WireUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

impl From<WireUsage> for Usage {
    fn from(u: WireUsage) -> Self {
        Usage::new(u.prompt_tokens, u.completion_tokens)
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: String,
}

/// Non-streaming response body
#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<ResponseChoice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseChoice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<WireToolCall>,
}

// ─── Stream chunks ───────────────────────────────────────────────

/// One decoded `data:` line
#[derive(Debug)]
pub enum StreamLine {
    Done,
    Chunk(CompletionChunk),
}

impl StreamLine {
    pub fn parse(data: &str) -> Result<Self, serde_json::Error> {
        if data.trim() == "[DONE]" {
            Ok(StreamLine::Done)
        } else {
            serde_json::from_str(data).map(StreamLine::Chunk)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallDelta>,
}

#[derive(Debug, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Deserialize)]
pub struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolgate_domain::{ToolCall, ToolResult};

    #[test]
    fn test_request_shape() {
        let request = ChatRequest::new(vec![
            ChatMessage::system("sys"),
            ChatMessage::user("hi"),
            ChatMessage::assistant_with_tool_calls(
                "",
                vec![ToolCall::new("call_1", "shell", json!({"command": "ls"}))],
            ),
            ChatMessage::tool_results(vec![ToolResult::success("call_1", "a.txt")]),
        ])
        .with_tools(vec![ToolDefinition::new("shell", "run")]);

        let body = serde_json::to_value(CompletionRequest::build(&request, "gpt", 50, true)).unwrap();

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], json!({"role": "system", "content": "sys"}));
        assert_eq!(messages[2]["content"], serde_json::Value::Null);
        assert_eq!(messages[2]["tool_calls"][0]["function"]["arguments"], "{\"command\":\"ls\"}");
        assert_eq!(
            messages[3],
            json!({"role": "tool", "content": "a.txt", "tool_call_id": "call_1"})
        );
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["parameters"], json!({"type": "object"}));
        assert_eq!(body["stream_options"]["include_usage"], true);
    }

    #[test]
    fn test_non_streaming_has_no_stream_options() {
        let request = ChatRequest::new(vec![ChatMessage::user("hi")]);
        let body = serde_json::to_value(CompletionRequest::build(&request, "gpt", 50, false)).unwrap();
        assert!(body.get("stream_options").is_none());
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_stream_line_parse() {
        assert!(matches!(StreamLine::parse("[DONE]"), Ok(StreamLine::Done)));
        assert!(StreamLine::parse("{oops").is_err());
        match StreamLine::parse(r#"{"choices":[{"delta":{}}],"usage":null}"#).unwrap() {
            StreamLine::Chunk(chunk) => assert_eq!(chunk.choices.len(), 1),
            StreamLine::Done => panic!("expected chunk"),
        }
    }
}
