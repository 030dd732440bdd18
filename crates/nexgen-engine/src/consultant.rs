use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use indexmap::IndexMap;
use nexgen_contracts::events::ActivityPayload;
use nexgen_contracts::models::{ChatMessage, ChatRole, LeadDraft};
use serde_json::{Map, Value};

use crate::cancel::CancelToken;
use crate::error::ErrorKind;
use crate::prompts::{create_lead_declaration, CONSULTANT_SYSTEM_INSTRUCTION, LEAD_CAPTURE_ADDENDUM};
use crate::provider::{
    AssistantTurn, Citation, FunctionCall, GenerationContext, Part, TaskKind, Tool, Turn,
};

pub const EMPTY_TURN_GUIDANCE: &str = "Por favor, envie uma mensagem de texto ou uma imagem.";
pub const LEAD_ACKNOWLEDGEMENT: &str =
    "Perfeito! Registrei seus dados e nossa equipe entrará em contato em breve.";
/// Reply when a lead call arrives without the fields needed to store it.
pub const LEAD_DETAILS_REQUEST: &str =
    "Para darmos seguimento, pode partilhar o seu nome e um contacto (email ou telefone)?";
const SOURCES_HEADER: &str = "**Fontes consultadas:**";
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Web search and function calling cannot be combined on one request, so
/// lead capture replaces search when both are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsultantOptions {
    pub web_search: bool,
    pub capture_leads: bool,
}

impl Default for ConsultantOptions {
    fn default() -> Self {
        Self {
            web_search: true,
            capture_leads: false,
        }
    }
}

/// Result of one chat turn. Failures still carry displayable text.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsultantReply {
    pub text: String,
    pub lead: Option<LeadDraft>,
    pub citations: Vec<Citation>,
    pub error: Option<ErrorKind>,
}

impl ConsultantReply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lead: None,
            citations: Vec::new(),
            error: None,
        }
    }
}

pub struct Consultant {
    context: GenerationContext,
    options: ConsultantOptions,
}

impl Consultant {
    pub fn new(context: GenerationContext) -> Self {
        Self {
            context,
            options: ConsultantOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConsultantOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ConsultantOptions {
        self.options
    }

    pub fn set_options(&mut self, options: ConsultantOptions) {
        self.options = options;
    }

    /// Produces the model's reply to `message` (and optional base64 `image`)
    /// given the prior `history`. Never panics and never returns an error:
    /// failures become a user-facing message with `error` set.
    pub fn reply(
        &self,
        message: &str,
        image: Option<&str>,
        history: &[ChatMessage],
        cancel: &CancelToken,
    ) -> ConsultantReply {
        let current = message_parts(message, image);
        if current.is_empty() {
            return ConsultantReply::text(EMPTY_TURN_GUIDANCE);
        }

        let mut turns: Vec<Turn> = history
            .iter()
            .map(|entry| Turn {
                role: entry.role,
                parts: message_parts(&entry.text, entry.image.as_deref()),
            })
            .filter(|turn| !turn.parts.is_empty())
            .collect();
        turns.push(Turn {
            role: ChatRole::User,
            parts: current,
        });

        let mut request = self
            .context
            .request(TaskKind::Chat, self.context.config().temperatures.chat);
        let mut instruction = CONSULTANT_SYSTEM_INSTRUCTION.to_string();
        if self.options.capture_leads {
            instruction.push_str(LEAD_CAPTURE_ADDENDUM);
            request.tools.push(Tool::Functions(vec![create_lead_declaration()]));
        } else if self.options.web_search {
            request.tools.push(Tool::WebSearch);
        }
        request.system_instruction = Some(instruction);
        request.turns = turns;

        let reply = match self.context.execute(&request, cancel) {
            Ok(turn) => reply_from_turn(turn),
            Err(err) => {
                self.context.record_failure(TaskKind::Chat, &err);
                ConsultantReply {
                    error: Some(err.kind()),
                    ..ConsultantReply::text(err.user_message())
                }
            }
        };

        let mut payload = ActivityPayload::new();
        payload.insert("history_len".to_string(), Value::from(history.len()));
        payload.insert("has_image".to_string(), Value::Bool(image.is_some()));
        payload.insert("citations".to_string(), Value::from(reply.citations.len()));
        payload.insert("lead_captured".to_string(), Value::Bool(reply.lead.is_some()));
        payload.insert(
            "error".to_string(),
            reply
                .error
                .map(|kind| Value::String(kind.to_string()))
                .unwrap_or(Value::Null),
        );
        self.context.record("chat_turn", payload);
        reply
    }
}

fn message_parts(text: &str, image: Option<&str>) -> Vec<Part> {
    let mut parts = Vec::new();
    if let Some(part) = image.and_then(inline_image_part) {
        parts.push(part);
    }
    if !text.trim().is_empty() {
        parts.push(Part::Text(text.to_string()));
    }
    parts
}

/// Builds an inline image part from raw base64 or a `data:` URL. The MIME
/// type comes from the URL prefix when present, else from magic bytes.
pub fn inline_image_part(raw: &str) -> Option<Part> {
    let raw = raw.trim();
    let (declared, data) = match raw.strip_prefix("data:") {
        Some(rest) => match rest.split_once(',') {
            Some((header, data)) => {
                let mime = header
                    .split(';')
                    .next()
                    .map(str::trim)
                    .filter(|mime| mime.starts_with("image/"))
                    .map(str::to_string);
                (mime, data.trim())
            }
            None => (None, ""),
        },
        None => (None, raw),
    };
    if data.is_empty() {
        return None;
    }
    let mime_type = declared.unwrap_or_else(|| sniff_image_mime(data).to_string());
    Some(Part::InlineImage {
        mime_type,
        data: data.to_string(),
    })
}

pub fn sniff_image_mime(base64_data: &str) -> &'static str {
    let head: String = base64_data.chars().take(16).collect();
    let Ok(bytes) = BASE64.decode(head.as_bytes()) else {
        return DEFAULT_IMAGE_MIME;
    };
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else {
        DEFAULT_IMAGE_MIME
    }
}

fn reply_from_turn(turn: AssistantTurn) -> ConsultantReply {
    match turn {
        AssistantTurn::FunctionCall { call, text } => {
            let lead = lead_from_call(&call);
            let text = match (text.trim().is_empty(), lead.is_some()) {
                (true, true) => LEAD_ACKNOWLEDGEMENT.to_string(),
                (true, false) => LEAD_DETAILS_REQUEST.to_string(),
                (false, _) => text,
            };
            ConsultantReply {
                lead,
                ..ConsultantReply::text(text)
            }
        }
        AssistantTurn::Grounded { text, citations } => {
            let citations = dedupe_citations(citations);
            ConsultantReply {
                text: append_sources(&text, &citations),
                citations,
                ..ConsultantReply::text(String::new())
            }
        }
        AssistantTurn::Text(text) => ConsultantReply::text(text),
    }
}

fn string_arg(args: &Map<String, Value>, key: &str) -> Option<String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn lead_from_call(call: &FunctionCall) -> Option<LeadDraft> {
    if call.name != "createLead" {
        tracing::debug!(function = %call.name, "ignoring unknown function call");
        return None;
    }
    Some(LeadDraft {
        name: string_arg(&call.args, "name")?,
        contact: string_arg(&call.args, "contact")?,
        interest: string_arg(&call.args, "interest").unwrap_or_default(),
    })
}

fn dedupe_citations(citations: Vec<Citation>) -> Vec<Citation> {
    let mut by_uri: IndexMap<String, Option<String>> = IndexMap::new();
    for citation in citations {
        let slot = by_uri.entry(citation.uri).or_insert(None);
        if slot.is_none() {
            *slot = citation.title;
        }
    }
    by_uri
        .into_iter()
        .map(|(uri, title)| Citation { uri, title })
        .collect()
}

fn append_sources(text: &str, citations: &[Citation]) -> String {
    if citations.is_empty() {
        return text.to_string();
    }
    let mut out = format!("{text}\n\n{SOURCES_HEADER}\n");
    for citation in citations {
        let title = citation.title.as_deref().unwrap_or(&citation.uri);
        out.push_str(&format!("- [{title}]({})\n", citation.uri));
    }
    out
}
