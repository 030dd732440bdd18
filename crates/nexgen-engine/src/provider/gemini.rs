use std::thread;
use std::time::Duration;

use nexgen_contracts::models::ChatRole;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{
    AssistantTurn, Citation, FunctionCall, GenerateRequest, GenerativeTransport, Part, Tool,
};
use crate::config::EngineConfig;
use crate::credentials::Credential;
use crate::error::{classify_status, classify_transport, GenerationError};

const RETRY_BACKOFF: Duration = Duration::from_millis(750);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    generation_config: WireGenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WirePart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: WireBlob,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
    #[serde(default)]
    prompt_feedback: Option<WirePromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    #[serde(default)]
    content: Option<WireResponseContent>,
    #[serde(default)]
    grounding_metadata: Option<WireGroundingMetadata>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireResponseContent {
    #[serde(default)]
    parts: Vec<WireResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    function_call: Option<WireFunctionCall>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<WireGroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct WireGroundingChunk {
    #[serde(default)]
    web: Option<WireWebSource>,
}

#[derive(Debug, Default, Deserialize)]
struct WireWebSource {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

fn wire_role(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Model => "model",
    }
}

fn wire_part(part: &Part) -> WirePart {
    match part {
        Part::Text(text) => WirePart::Text { text: text.clone() },
        Part::InlineImage { mime_type, data } => WirePart::InlineData {
            inline_data: WireBlob {
                mime_type: mime_type.clone(),
                data: data.clone(),
            },
        },
    }
}

fn wire_tool(tool: &Tool) -> Value {
    match tool {
        Tool::WebSearch => json!({ "googleSearch": {} }),
        Tool::Functions(declarations) => json!({
            "functionDeclarations": declarations
                .iter()
                .map(|declaration| json!({
                    "name": declaration.name,
                    "description": declaration.description,
                    "parameters": declaration.parameters,
                }))
                .collect::<Vec<_>>(),
        }),
    }
}

fn build_body(request: &GenerateRequest) -> WireRequest {
    WireRequest {
        contents: request
            .turns
            .iter()
            .filter(|turn| !turn.parts.is_empty())
            .map(|turn| WireContent {
                role: Some(wire_role(turn.role)),
                parts: turn.parts.iter().map(wire_part).collect(),
            })
            .collect(),
        system_instruction: request.system_instruction.as_ref().map(|text| WireContent {
            role: None,
            parts: vec![WirePart::Text { text: text.clone() }],
        }),
        generation_config: WireGenerationConfig {
            temperature: request.temperature,
            response_mime_type: request.response_format.mime_type(),
        },
        tools: request.tools.iter().map(wire_tool).collect(),
    }
}

fn parse_response(body: &str) -> Result<AssistantTurn, GenerationError> {
    let response: WireResponse =
        serde_json::from_str(body).map_err(|err| GenerationError::Unknown {
            status: None,
            detail: format!("provider returned invalid JSON: {err}"),
        })?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        if let Some(reason) = response.prompt_feedback.and_then(|feedback| feedback.block_reason) {
            return Err(GenerationError::Unknown {
                status: None,
                detail: format!("prompt blocked: {reason}"),
            });
        }
        return Err(GenerationError::EmptyResponse);
    };

    let mut text = String::new();
    let mut call = None;
    for part in candidate.content.map(|content| content.parts).unwrap_or_default() {
        if part.thought {
            continue;
        }
        if let Some(chunk) = part.text {
            text.push_str(&chunk);
        }
        if call.is_none() {
            call = part.function_call.map(|raw| FunctionCall {
                name: raw.name,
                args: raw.args,
            });
        }
    }

    if let Some(call) = call {
        return Ok(AssistantTurn::FunctionCall { call, text });
    }

    let citations: Vec<Citation> = candidate
        .grounding_metadata
        .map(|metadata| metadata.grounding_chunks)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|chunk| chunk.web)
        .filter_map(|web| {
            let uri = web.uri.map(|uri| uri.trim().to_string()).filter(|uri| !uri.is_empty())?;
            Some(Citation {
                uri,
                title: web.title.filter(|title| !title.trim().is_empty()),
            })
        })
        .collect();

    if text.trim().is_empty() {
        tracing::debug!(finish_reason = ?candidate.finish_reason, "candidate carried no text");
        return Err(GenerationError::EmptyResponse);
    }
    if citations.is_empty() {
        Ok(AssistantTurn::Text(text))
    } else {
        Ok(AssistantTurn::Grounded { text, citations })
    }
}

/// `generateContent` over blocking HTTP.
pub struct GeminiTransport {
    api_base: String,
    credential: Credential,
    http: HttpClient,
}

impl GeminiTransport {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            api_base: config.api_base.trim_end_matches('/').to_string(),
            credential: config.credential.clone(),
            http: HttpClient::new(),
        }
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn post_with_connect_retries(
        &self,
        endpoint: &str,
        payload: &WireRequest,
        timeout: Duration,
        max_retries: usize,
    ) -> Result<reqwest::blocking::Response, GenerationError> {
        let mut attempt = 0;
        loop {
            let response = self
                .http
                .post(endpoint)
                .query(&[("key", self.credential.expose())])
                .timeout(timeout)
                .json(payload)
                .send();
            match response {
                Ok(ok) => return Ok(ok),
                Err(err) if err.is_connect() && attempt < max_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %err, "Gemini connect failed, retrying");
                    thread::sleep(RETRY_BACKOFF * attempt as u32);
                }
                Err(err) => return Err(classify_transport(&err, timeout)),
            }
        }
    }
}

impl GenerativeTransport for GeminiTransport {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn generate(&self, request: &GenerateRequest) -> Result<AssistantTurn, GenerationError> {
        if self.credential.is_empty() {
            return Err(GenerationError::MissingCredential);
        }
        let endpoint = self.endpoint_for_model(&request.model);
        let payload = build_body(request);
        let response = self.post_with_connect_retries(
            &endpoint,
            &payload,
            request.timeout,
            request.connect_retries,
        )?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|err| classify_transport(&err, request.timeout))?;
        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &body, request.uses_tools()));
        }
        parse_response(&body)
    }
}
