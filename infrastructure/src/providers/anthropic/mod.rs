//! Anthropic Messages API provider
//!
//! `POST {base_url}/v1/messages` with `x-api-key` and `anthropic-version`
//! headers. Streaming responses are normalized by [`AnthropicNormalizer`].

mod stream;
pub mod wire;

pub use stream::{AnthropicNormalizer, decode_full};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use toolgate_application::{ChatProvider, ChatStream, ProviderError};
use toolgate_domain::ChatRequest;
use tracing::debug;

use super::http::{endpoint, full_response, send, stream_response};
use super::{ProviderKind, ProviderSettings, build_client, validate_request};
use wire::MessagesRequest;

pub const DEFAULT_API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: reqwest::Client,
    settings: ProviderSettings,
    api_key: String,
}

impl AnthropicProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        let api_key = settings.require_api_key(ProviderKind::Anthropic)?;
        Ok(Self {
            client: build_client()?,
            settings,
            api_key,
        })
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &str {
        ProviderKind::Anthropic.as_str()
    }

    fn default_model(&self) -> &str {
        &self.settings.model
    }

    async fn chat(
        &self,
        cancel: CancellationToken,
        request: ChatRequest,
    ) -> Result<ChatStream, ProviderError> {
        validate_request(&request)?;

        let model = request.model_or(&self.settings.model);
        let max_tokens = request.max_tokens_or(self.settings.max_tokens);
        let body = MessagesRequest::build(&request, model, max_tokens, self.settings.streaming);
        let api_version = self
            .settings
            .api_version
            .as_deref()
            .unwrap_or(DEFAULT_API_VERSION);

        debug!(
            provider = "anthropic",
            model = %model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            stream = self.settings.streaming,
            "Sending chat request"
        );

        let http_request = self
            .client
            .post(endpoint(&self.settings.base_url, "v1/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", api_version)
            .json(&body);
        let response = send(&cancel, http_request).await?;

        Ok(if self.settings.streaming {
            stream_response(response, AnthropicNormalizer::new(), cancel)
        } else {
            full_response(response, decode_full, cancel)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolgate_domain::{ChatMessage, ToolDefinition, Usage};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer, streaming: bool) -> ProviderSettings {
        ProviderSettings {
            api_key: Some("test-key".into()),
            base_url: server.uri(),
            model: "claude-test".into(),
            max_tokens: 1024,
            streaming,
            ..Default::default()
        }
    }

    fn request() -> ChatRequest {
        ChatRequest::new(vec![
            ChatMessage::system("You run shell commands."),
            ChatMessage::user("list the files"),
        ])
        .with_tools(vec![ToolDefinition::new("shell", "Run a command")])
    }

    #[tokio::test]
    async fn test_streaming_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", DEFAULT_API_VERSION))
            .and(body_partial_json(json!({
                "model": "claude-test",
                "max_tokens": 1024,
                "system": "You run shell commands.",
                "stream": true,
                "tools": [{"name": "shell", "input_schema": {"type": "object"}}]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(stream::tests::TOOL_STREAM),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new(settings(&server, true)).unwrap();
        let turn = provider
            .chat(CancellationToken::new(), request())
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();

        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(turn.tool_calls[0].id, "toolu_01");
        assert_eq!(turn.tool_calls[0].name, "shell");
        assert_eq!(turn.usage, Usage::new(25, 42));
    }

    #[tokio::test]
    async fn test_non_streaming_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(body_partial_json(json!({"stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "Hello there"}],
                "usage": {"input_tokens": 3, "output_tokens": 2}
            })))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new(settings(&server, false)).unwrap();
        let turn = provider
            .chat(CancellationToken::new(), request())
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();

        assert_eq!(turn.text, "Hello there");
        assert_eq!(turn.usage, Usage::new(3, 2));
    }

    #[tokio::test]
    async fn test_error_status_is_immediate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\":\"bad key\"}"))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new(settings(&server, true)).unwrap();
        let err = provider
            .chat(CancellationToken::new(), request())
            .await
            .unwrap_err();

        match err {
            ProviderError::Status { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("bad key"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_api_key() {
        let result = AnthropicProvider::new(ProviderSettings::default());
        assert!(matches!(result, Err(ProviderError::Configuration(_))));
    }
}
