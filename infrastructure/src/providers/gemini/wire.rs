//! Gemini `generateContent` wire types

use serde::{Deserialize, Serialize};
use serde_json::json;
use toolgate_domain::{ChatMessage, ChatRequest, Role, ToolDefinition, Usage};

// ─── Request ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest<'a> {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTools<'a>>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTools<'a> {
    pub function_declarations: Vec<FunctionDeclaration<'a>>,
}

#[derive(Debug, Serialize)]
pub struct FunctionDeclaration<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub parameters: &'a serde_json::Value,
}

impl<'a> From<&'a ToolDefinition> for FunctionDeclaration<'a> {
    fn from(def: &'a ToolDefinition) -> Self {
        Self {
            name: &def.name,
            description: &def.description,
            parameters: &def.input_schema,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestPart {
    #[serde(rename = "text")]
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct FunctionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub response: serde_json::Value,
}

impl<'a> GenerateRequest<'a> {
    pub fn build(request: &'a ChatRequest, max_tokens: u32) -> Self {
        let declarations: Vec<FunctionDeclaration<'a>> =
            request.tools.iter().map(FunctionDeclaration::from).collect();

        Self {
            contents: request
                .messages
                .iter()
                .enumerate()
                .filter(|(_, m)| m.role != Role::System)
                .filter_map(|(index, m)| convert_message(request, index, m))
                .collect(),
            system_instruction: request.system_prompt().map(|text| Content {
                role: None,
                parts: vec![RequestPart::Text(text)],
            }),
            tools: if declarations.is_empty() {
                Vec::new()
            } else {
                vec![WireTools {
                    function_declarations: declarations,
                }]
            },
            generation_config: GenerationConfig {
                max_output_tokens: max_tokens,
                temperature: request.temperature,
            },
        }
    }
}

fn convert_message(request: &ChatRequest, index: usize, message: &ChatMessage) -> Option<Content> {
    let role = match message.role {
        Role::Assistant => "model",
        _ => "user",
    };

    let mut parts = Vec::new();
    for result in &message.tool_results {
        // Gemini correlates responses by function name
        let name = request
            .tool_name_for_call(index, &result.tool_call_id)
            .unwrap_or(&result.tool_call_id)
            .to_string();
        let response = if result.is_error {
            json!({ "error": result.content })
        } else {
            json!({ "output": result.content })
        };
        parts.push(RequestPart::FunctionResponse(FunctionResponse {
            id: synthetic_id(&result.tool_call_id),
            name,
            response,
        }));
    }
    if !message.content.is_empty() {
        parts.push(RequestPart::Text(message.content.clone()));
    }
    for call in &message.tool_calls {
        parts.push(RequestPart::FunctionCall(FunctionCall {
            id: synthetic_id(&call.id),
            name: call.name.clone(),
            args: call.input.clone(),
        }));
    }

    (!parts.is_empty()).then_some(Content {
        role: Some(role),
        parts,
    })
}

/// Ids we minted ourselves are not sent back to the vendor.
fn synthetic_id(id: &str) -> Option<String> {
    (!id.starts_with(SYNTHETIC_ID_PREFIX)).then(|| id.to_string())
}

pub const SYNTHETIC_ID_PREFIX: &str = "gemini_call_";

// ─── Response ────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
}

impl From<UsageMetadata> for Usage {
    fn from(u: UsageMetadata) -> Self {
        Usage::new(u.prompt_token_count, u.candidates_token_count)
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// One SSE chunk, or the whole non-streaming body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ResponsePart {
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },
    Text {
        text: String,
        #[serde(default)]
        thought: bool,
    },
    Other(serde_json::Value),
}
