//! OpenAI-compatible passthrough
//!
//! Local model servers and routers that speak the Chat Completions wire
//! format. Differences from OpenAI proper: the base URL is mandatory, the
//! API key is optional, and extra headers from config are sent verbatim.

use toolgate_application::ProviderError;

use super::openai::OpenAiProvider;
use super::{ProviderKind, ProviderSettings};

pub fn compat_provider(settings: ProviderSettings) -> Result<OpenAiProvider, ProviderError> {
    if settings.base_url.trim().is_empty() {
        return Err(ProviderError::Configuration(
            "compat provider requires base_url".to_string(),
        ));
    }
    let api_key = settings.api_key.clone().filter(|k| !k.is_empty());
    OpenAiProvider::with_kind(settings, api_key, ProviderKind::Compat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tokio_util::sync::CancellationToken;
    use toolgate_application::ChatProvider;
    use toolgate_domain::{ChatMessage, ChatRequest};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    #[tokio::test]
    async fn test_passthrough_without_key_sends_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat/completions"))
            .and(header("x-router-tag", "local"))
            .and(|req: &Request| !req.headers.contains_key("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_string(concat!(
                "data: {\"choices\":[{\"delta\":{\"content\":\"pong\"}}]}\n\n",
                "data: [DONE]\n\n",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let provider = compat_provider(ProviderSettings {
            base_url: format!("{}/api", server.uri()),
            model: "llama".into(),
            max_tokens: 64,
            streaming: true,
            headers: BTreeMap::from([("x-router-tag".to_string(), "local".to_string())]),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(provider.name(), "compat");
        let turn = provider
            .chat(
                CancellationToken::new(),
                ChatRequest::new(vec![ChatMessage::user("ping")]),
            )
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();
        assert_eq!(turn.text, "pong");
    }

    #[test]
    fn test_requires_base_url() {
        assert!(matches!(
            compat_provider(ProviderSettings::default()),
            Err(ProviderError::Configuration(_))
        ));
    }
}
