//! HTTP tool: http_request
//!
//! Outbound requests honour the policy's network posture before anything is
//! sent: `Deny` rejects every request, `AllowList` only the hosts listed in
//! `Policy::allowed_hosts`. Redirects are followed by the tool itself so
//! every hop is checked against the same posture. The response body is read
//! incrementally and cut at `max_output_bytes`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use toolgate_application::{Sandbox, Tool, ToolContext, ToolError, parse_input};
use toolgate_domain::{NetworkAccess, Policy, TRUNCATION_MARKER, ToolDefinition, truncate_str};
use tracing::debug;

/// Tool name constant
pub const HTTP_REQUEST: &str = "http_request";

const USER_AGENT: &str = concat!("toolgate/", env!("CARGO_PKG_VERSION"));

/// Maximum redirect hops followed for one request
pub const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Deserialize)]
struct HttpArgs {
    url: String,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpRequestTool {
    client: reqwest::Client,
}

impl HttpRequestTool {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::from_builder(reqwest::Client::builder())
    }

    /// Build the tool's client from `builder`. Automatic redirects are
    /// always turned off; the tool follows them after a policy check.
    pub fn from_builder(builder: reqwest::ClientBuilder) -> Result<Self, reqwest::Error> {
        let client = builder.redirect(reqwest::redirect::Policy::none()).build()?;
        Ok(Self { client })
    }

    async fn send(
        &self,
        ctx: &ToolContext,
        method: &Method,
        url: &Url,
        headers: &BTreeMap<String, String>,
        body: Option<&str>,
        policy: &Policy,
    ) -> Result<reqwest::Response, ToolError> {
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .timeout(policy.effective_timeout())
            .header(reqwest::header::USER_AGENT, USER_AGENT);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        debug!(method = %method, url = %url, "Sending HTTP request");
        tokio::select! {
            _ = ctx.cancel.cancelled() => Err(ToolError::Cancelled),
            res = request.send() => res.map_err(|e| {
                if e.is_builder() {
                    ToolError::InvalidInput(e.to_string())
                } else {
                    ToolError::Execution(format!("Request failed: {}", e))
                }
            }),
        }
    }
}

fn parse_method(method: Option<&str>) -> Result<Method, ToolError> {
    match method.map(str::to_ascii_uppercase).as_deref() {
        None | Some("GET") => Ok(Method::GET),
        Some("POST") => Ok(Method::POST),
        Some("PUT") => Ok(Method::PUT),
        Some("PATCH") => Ok(Method::PATCH),
        Some("DELETE") => Ok(Method::DELETE),
        Some("HEAD") => Ok(Method::HEAD),
        Some(other) => Err(ToolError::InvalidInput(format!(
            "unsupported method: {}",
            other
        ))),
    }
}

/// Enforce the network posture for `url`.
fn check_network(url: &Url, policy: &Policy) -> Result<(), ToolError> {
    let host = url
        .host_str()
        .ok_or_else(|| ToolError::InvalidInput(format!("URL has no host: {}", url)))?;
    match policy.network_access {
        NetworkAccess::Deny => Err(ToolError::PolicyViolation(
            "network access is denied".into(),
        )),
        _ if policy.host_allowed(host) => Ok(()),
        _ => Err(ToolError::PolicyViolation(format!(
            "host '{}' is not in the allow list",
            host
        ))),
    }
}

fn check_scheme(url: &Url) -> Result<(), ToolError> {
    if matches!(url.scheme(), "http" | "https") {
        Ok(())
    } else {
        Err(ToolError::InvalidInput(format!(
            "unsupported scheme: {}",
            url.scheme()
        )))
    }
}

/// Target of a redirect response, if `response` is one.
fn redirect_target(response: &reqwest::Response) -> Option<Result<Url, ToolError>> {
    if !response.status().is_redirection() {
        return None;
    }
    let location = response.headers().get(reqwest::header::LOCATION)?;
    let target = location
        .to_str()
        .map_err(|e| ToolError::Execution(format!("invalid redirect location: {}", e)))
        .and_then(|loc| {
            response
                .url()
                .join(loc)
                .map_err(|e| ToolError::Execution(format!("invalid redirect location '{}': {}", loc, e)))
        });
    Some(target)
}

/// 303, and 301/302 after a POST, continue as a body-less GET.
fn redirect_method(status: StatusCode, method: &Method) -> Option<Method> {
    match status {
        StatusCode::SEE_OTHER if *method != Method::HEAD => Some(Method::GET),
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND if *method == Method::POST => {
            Some(Method::GET)
        }
        _ => None,
    }
}

#[async_trait]
impl Tool for HttpRequestTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            HTTP_REQUEST,
            "Send an HTTP request and return the status line and response body.",
        )
        .with_input_schema(serde_json::json!({
            "type": "object",
            "properties": {
                "url": {"type": "string", "description": "http or https URL"},
                "method": {"type": "string", "enum": ["GET", "POST", "PUT", "PATCH", "DELETE", "HEAD"]},
                "headers": {"type": "object", "additionalProperties": {"type": "string"}},
                "body": {"type": "string", "description": "Request body"}
            },
            "required": ["url"]
        }))
    }

    async fn execute(
        &self,
        ctx: &ToolContext,
        input: serde_json::Value,
        _sandbox: &dyn Sandbox,
        policy: &Policy,
    ) -> Result<String, ToolError> {
        let args: HttpArgs = parse_input(input)?;
        let mut url = Url::parse(&args.url)
            .map_err(|e| ToolError::InvalidInput(format!("invalid URL '{}': {}", args.url, e)))?;
        check_scheme(&url)?;
        let mut method = parse_method(args.method.as_deref())?;
        check_network(&url, policy)?;

        let mut headers = args.headers;
        let mut body = args.body;
        let mut hops = 0;
        let response = loop {
            let response = self
                .send(ctx, &method, &url, &headers, body.as_deref(), policy)
                .await?;
            let Some(target) = redirect_target(&response) else {
                break response;
            };
            let target = target?;
            hops += 1;
            if hops > MAX_REDIRECTS {
                return Err(ToolError::Execution(format!(
                    "too many redirects (limit {})",
                    MAX_REDIRECTS
                )));
            }
            if !matches!(target.scheme(), "http" | "https") {
                return Err(ToolError::PolicyViolation(format!(
                    "redirect to unsupported scheme: {}",
                    target.scheme()
                )));
            }
            check_network(&target, policy)?;
            if let Some(next) = redirect_method(response.status(), &method) {
                method = next;
                body = None;
            }
            if target.host_str() != url.host_str() {
                // Caller headers are scoped to the original host
                headers.clear();
            }
            debug!(from = %url, to = %target, "Following redirect");
            url = target;
        };

        let status = response.status();
        let max = policy.effective_max_output_bytes();
        let mut body: Vec<u8> = Vec::new();
        let mut truncated = false;
        let mut chunks = response.bytes_stream();
        loop {
            let chunk = tokio::select! {
                _ = ctx.cancel.cancelled() => return Err(ToolError::Cancelled),
                chunk = chunks.next() => chunk,
            };
            match chunk {
                Some(Ok(bytes)) => {
                    body.extend_from_slice(&bytes);
                    if body.len() > max {
                        truncated = true;
                        break;
                    }
                }
                Some(Err(e)) => {
                    return Err(ToolError::Execution(format!(
                        "Failed to read response body: {}",
                        e
                    )));
                }
                None => break,
            }
        }

        let text = String::from_utf8_lossy(&body);
        let mut output = format!(
            "HTTP {} {}\n\n{}",
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            truncate_str(&text, max)
        );
        if truncated {
            output.push_str(TRUNCATION_MARKER);
        }

        if status.is_success() {
            Ok(output)
        } else {
            Err(ToolError::Execution(output))
        }
    }
}
