//! Gemini provider
//!
//! `POST {base_url}/v1beta/models/{model}:streamGenerateContent?alt=sse`
//! (or `:generateContent`) with the `x-goog-api-key` header.

mod stream;
pub mod wire;

pub use stream::{GeminiNormalizer, decode_full};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use toolgate_application::{ChatProvider, ChatStream, ProviderError};
use toolgate_domain::ChatRequest;
use tracing::debug;

use super::http::{endpoint, full_response, send, stream_response};
use super::{ProviderKind, ProviderSettings, build_client, validate_request};
use wire::GenerateRequest;

pub struct GeminiProvider {
    client: reqwest::Client,
    settings: ProviderSettings,
    api_key: String,
}

impl GeminiProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        let api_key = settings.require_api_key(ProviderKind::Gemini)?;
        Ok(Self {
            client: build_client()?,
            settings,
            api_key,
        })
    }

    fn url(&self, model: &str) -> String {
        let path = if self.settings.streaming {
            format!("v1beta/models/{}:streamGenerateContent?alt=sse", model)
        } else {
            format!("v1beta/models/{}:generateContent", model)
        };
        endpoint(&self.settings.base_url, &path)
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        ProviderKind::Gemini.as_str()
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
        let body = GenerateRequest::build(&request, max_tokens);

        debug!(
            provider = "gemini",
            model = %model,
            contents = body.contents.len(),
            stream = self.settings.streaming,
            "Sending chat request"
        );

        let http_request = self
            .client
            .post(self.url(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let response = send(&cancel, http_request).await?;

        Ok(if self.settings.streaming {
            stream_response(response, GeminiNormalizer::new(), cancel)
        } else {
            full_response(response, decode_full, cancel)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolgate_domain::{ChatMessage, Usage};
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer, streaming: bool) -> ProviderSettings {
        ProviderSettings {
            api_key: Some("g-key".into()),
            base_url: server.uri(),
            model: "gemini-test".into(),
            max_tokens: 128,
            streaming,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_streaming_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:streamGenerateContent"))
            .and(query_param("alt", "sse"))
            .and(header("x-goog-api-key", "g-key"))
            .and(body_partial_json(json!({
                "systemInstruction": {"parts": [{"text": "be brief"}]},
                "generationConfig": {"maxOutputTokens": 128}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(stream::tests::TOOL_STREAM))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(settings(&server, true)).unwrap();
        let request = ChatRequest::new(vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("weather in Oslo?"),
        ]);
        let turn = provider
            .chat(CancellationToken::new(), request)
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();

        assert_eq!(turn.text, "Looking it up.");
        assert_eq!(turn.tool_calls[0].id, "gemini_call_0");
        assert_eq!(turn.usage, Usage::new(9, 14));
    }

    #[tokio::test]
    async fn test_non_streaming_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/other:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "ok"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(settings(&server, false)).unwrap();
        let request = ChatRequest::new(vec![ChatMessage::user("hi")]).with_model("other");
        let turn = provider
            .chat(CancellationToken::new(), request)
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        assert_eq!(turn.text, "ok");
    }

    #[tokio::test]
    async fn test_malformed_full_body_is_stream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new(settings(&server, false)).unwrap();
        let err = provider
            .chat(
                CancellationToken::new(),
                ChatRequest::new(vec![ChatMessage::user("hi")]),
            )
            .await
            .unwrap()
            .collect()
            .await
            .unwrap_err();
        assert!(matches!(err, toolgate_domain::StreamError::Decode(_)));
    }
}
