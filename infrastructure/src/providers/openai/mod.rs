//! OpenAI Chat Completions provider
//!
//! `POST {base_url}/chat/completions` with a bearer token. The same adapter
//! serves OpenAI-compatible servers (see [`crate::providers::compat`]).

mod stream;
pub mod wire;

pub use stream::{OpenAiNormalizer, decode_full};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use toolgate_application::{ChatProvider, ChatStream, ProviderError};
use toolgate_domain::ChatRequest;
use tracing::debug;

use super::http::{endpoint, full_response, send, stream_response};
use super::{ProviderKind, ProviderSettings, build_client, validate_request};
use wire::CompletionRequest;

pub struct OpenAiProvider {
    client: reqwest::Client,
    settings: ProviderSettings,
    api_key: Option<String>,
    kind: ProviderKind,
}

impl OpenAiProvider {
    /// OpenAI proper; an API key is required.
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        let api_key = settings.require_api_key(ProviderKind::OpenAi)?;
        Self::with_kind(settings, Some(api_key), ProviderKind::OpenAi)
    }

    pub(crate) fn with_kind(
        settings: ProviderSettings,
        api_key: Option<String>,
        kind: ProviderKind,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client()?,
            settings,
            api_key,
            kind,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn name(&self) -> &str {
        self.kind.as_str()
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
        if model.is_empty() {
            return Err(ProviderError::Configuration(format!(
                "no model configured for provider '{}'",
                self.kind
            )));
        }
        let max_tokens = request.max_tokens_or(self.settings.max_tokens);
        let body = CompletionRequest::build(&request, model, max_tokens, self.settings.streaming);

        debug!(
            provider = self.kind.as_str(),
            model = %model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            stream = self.settings.streaming,
            "Sending chat request"
        );

        let mut http_request = self
            .client
            .post(endpoint(&self.settings.base_url, "chat/completions"))
            .json(&body);
        if let Some(key) = &self.api_key {
            http_request = http_request.bearer_auth(key);
        }
        for (name, value) in &self.settings.headers {
            http_request = http_request.header(name, value);
        }
        let response = send(&cancel, http_request).await?;

        Ok(if self.settings.streaming {
            stream_response(response, OpenAiNormalizer::new(), cancel)
        } else {
            full_response(response, decode_full, cancel)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolgate_domain::{ChatMessage, StreamError, ToolDefinition, Usage};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> ProviderSettings {
        ProviderSettings {
            api_key: Some("sk-test".into()),
            base_url: format!("{}/v1", server.uri()),
            model: "gpt-test".into(),
            max_tokens: 256,
            streaming: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_streaming_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-test",
                "stream": true,
                "stream_options": {"include_usage": true},
                "messages": [{"role": "user", "content": "list files"}]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(stream::tests::TOOL_STREAM),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(settings(&server)).unwrap();
        let request = ChatRequest::new(vec![ChatMessage::user("list files")])
            .with_tools(vec![ToolDefinition::new("shell", "Run a command")]);
        let turn = provider
            .chat(CancellationToken::new(), request)
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();

        assert_eq!(turn.text, "Checking");
        assert_eq!(turn.tool_calls.len(), 1);
        assert_eq!(turn.tool_calls[0].id, "call_abc");
        assert_eq!(turn.usage, Usage::new(12, 8));
    }

    #[tokio::test]
    async fn test_cancel_mid_stream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(stream::tests::TOOL_STREAM)
                    .set_delay(std::time::Duration::from_millis(200)),
            )
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(settings(&server)).unwrap();
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = provider
            .chat(cancel, ChatRequest::new(vec![ChatMessage::user("hi")]))
            .await;

        // Cancellation lands either before the response or on the stream
        match result {
            Err(ProviderError::Cancelled) => {}
            Ok(stream) => assert_eq!(stream.collect().await.unwrap_err(), StreamError::Cancelled),
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_body_is_captured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(settings(&server)).unwrap();
        let err = provider
            .chat(
                CancellationToken::new(),
                ChatRequest::new(vec![ChatMessage::user("hi")]),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("upstream exploded"));
    }
}
