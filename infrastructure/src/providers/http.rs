//! HTTP helpers shared by the vendor providers

use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use toolgate_application::{ChatStream, ProviderError, event_channel};
use toolgate_domain::{ChatEvent, StreamError, Usage};

use super::sse::{StreamNormalizer, spawn_normalizer};

/// Send a request, mapping failures before the body is read to
/// [`ProviderError`]. A non-success status captures the response body.
pub async fn send(
    cancel: &CancellationToken,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, ProviderError> {
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
        result = request.send() => result.map_err(|e| {
            if e.is_builder() {
                ProviderError::RequestBuild(e.to_string())
            } else {
                ProviderError::Connection(e.to_string())
            }
        })?,
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), body = %body, "Provider returned error status");
        return Err(ProviderError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Hand a streaming response body to a background normalizer task.
pub fn stream_response<N: StreamNormalizer>(
    response: reqwest::Response,
    normalizer: N,
    cancel: CancellationToken,
) -> ChatStream {
    spawn_normalizer(response.bytes_stream(), normalizer, cancel)
}

/// Read a non-streaming response body in the background, decode it once
/// and replay its events.
pub fn full_response<F>(response: reqwest::Response, decode: F, cancel: CancellationToken) -> ChatStream
where
    F: FnOnce(&[u8]) -> Result<Vec<ChatEvent>, StreamError> + Send + 'static,
{
    let (mut sink, stream) = event_channel();
    tokio::spawn(async move {
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(StreamError::Cancelled),
            body = read_body(response) => body,
        };
        let events = match body.and_then(|bytes| decode(&bytes)) {
            Ok(events) => events,
            Err(e) => vec![ChatEvent::Error(e)],
        };
        for event in events {
            if !sink.emit(event).await {
                return;
            }
        }
        if !sink.is_closed() {
            sink.emit(ChatEvent::Done(Usage::default())).await;
        }
    });
    stream
}

async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, StreamError> {
    let mut body = Vec::new();
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|e| StreamError::Transport(e.to_string()))?;
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Decode a JSON document, mapping failures to [`StreamError::Decode`].
pub fn decode_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, StreamError> {
    serde_json::from_slice(bytes).map_err(|e| StreamError::Decode(e.to_string()))
}

/// Join a base URL and a path without doubling the slash.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
