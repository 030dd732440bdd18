//! Provider-neutral request/response model and the transport seam.

mod dryrun;
mod gemini;

use std::sync::Arc;
use std::time::{Duration, Instant};

use nexgen_contracts::events::{ActivityLog, ActivityPayload};
use nexgen_contracts::models::ChatRole;
use serde_json::{Map, Value};

use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::error::GenerationError;

pub use dryrun::DryrunTransport;
pub use gemini::GeminiTransport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Chat,
    Proposal,
    Feasibility,
    Plan,
    Website,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Proposal => "proposal",
            Self::Feasibility => "feasibility",
            Self::Plan => "plan",
            Self::Website => "website",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    InlineImage { mime_type: String, data: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: ChatRole,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Provider default, usually Markdown.
    Text,
    Json,
    PlainText,
}

impl ResponseFormat {
    pub fn mime_type(self) -> Option<&'static str> {
        match self {
            Self::Text => None,
            Self::Json => Some("application/json"),
            Self::PlainText => Some("text/plain"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    /// JSON-schema object describing the arguments.
    pub parameters: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tool {
    WebSearch,
    Functions(Vec<FunctionDeclaration>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub task: TaskKind,
    pub model: String,
    pub system_instruction: Option<String>,
    pub turns: Vec<Turn>,
    pub temperature: f32,
    pub response_format: ResponseFormat,
    pub tools: Vec<Tool>,
    pub timeout: Duration,
    /// Extra attempts allowed when the connection itself could not be made.
    pub connect_retries: usize,
}

impl GenerateRequest {
    pub fn uses_tools(&self) -> bool {
        !self.tools.is_empty()
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.turns.push(Turn {
            role: ChatRole::User,
            parts: vec![Part::Text(prompt.into())],
        });
        self
    }

    pub fn without_tools(&self) -> Self {
        Self {
            tools: Vec::new(),
            ..self.clone()
        }
    }

    /// Text of the last user turn, for transports that only echo.
    pub fn last_user_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .filter(|turn| turn.role == ChatRole::User)
            .flat_map(|turn| turn.parts.iter())
            .find_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                Part::InlineImage { .. } => None,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub uri: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Map<String, Value>,
}

/// What the model sent back for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantTurn {
    Text(String),
    Grounded {
        text: String,
        citations: Vec<Citation>,
    },
    FunctionCall {
        call: FunctionCall,
        text: String,
    },
}

impl AssistantTurn {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Grounded { text, .. } | Self::FunctionCall { text, .. } => text,
        }
    }

    pub fn citations(&self) -> &[Citation] {
        match self {
            Self::Grounded { citations, .. } => citations,
            _ => &[],
        }
    }
}

pub trait GenerativeTransport: Send + Sync {
    fn name(&self) -> &'static str;
    fn generate(&self, request: &GenerateRequest) -> Result<AssistantTurn, GenerationError>;
}

/// Everything a generative component needs: settings, a transport and an
/// optional activity log. Cheap to clone.
#[derive(Clone)]
pub struct GenerationContext {
    config: Arc<EngineConfig>,
    transport: Arc<dyn GenerativeTransport>,
    activity: Option<ActivityLog>,
}

impl GenerationContext {
    pub fn new(config: EngineConfig, transport: Arc<dyn GenerativeTransport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            activity: None,
        }
    }

    pub fn with_activity(mut self, activity: ActivityLog) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn activity(&self) -> Option<&ActivityLog> {
        self.activity.as_ref()
    }

    pub fn request(&self, task: TaskKind, temperature: f32) -> GenerateRequest {
        GenerateRequest {
            task,
            model: self.config.model.clone(),
            system_instruction: None,
            turns: Vec::new(),
            temperature,
            response_format: ResponseFormat::Text,
            tools: Vec::new(),
            timeout: self.config.request_timeout,
            connect_retries: match task {
                TaskKind::Chat => 0,
                _ => 1,
            },
        }
    }

    /// Sends one request. Never touches the transport without a credential,
    /// and drops any result that lands after `cancel` fired.
    pub fn execute(
        &self,
        request: &GenerateRequest,
        cancel: &CancelToken,
    ) -> Result<AssistantTurn, GenerationError> {
        if self.config.credential.is_empty() {
            return Err(GenerationError::MissingCredential);
        }
        cancel.check()?;

        let started = Instant::now();
        let result = self.transport.generate(request);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if cancel.is_cancelled() {
            tracing::debug!(task = request.task.as_str(), elapsed_ms, "discarding result of cancelled request");
            return Err(GenerationError::Cancelled);
        }
        match &result {
            Ok(_) => tracing::debug!(
                provider = self.transport.name(),
                task = request.task.as_str(),
                tools = request.uses_tools(),
                elapsed_ms,
                "generation completed"
            ),
            Err(err) => tracing::warn!(
                provider = self.transport.name(),
                task = request.task.as_str(),
                kind = %err.kind(),
                elapsed_ms,
                error = %err,
                "generation failed"
            ),
        }
        result
    }

    pub fn record(&self, event_type: &str, payload: ActivityPayload) {
        if let Some(activity) = &self.activity {
            activity.record(event_type, payload);
        }
    }

    pub(crate) fn record_failure(&self, task: TaskKind, err: &GenerationError) {
        let mut payload = ActivityPayload::new();
        payload.insert("task".to_string(), Value::String(task.as_str().to_string()));
        payload.insert("kind".to_string(), Value::String(err.kind().to_string()));
        payload.insert("detail".to_string(), Value::String(err.to_string()));
        self.record("generation_failed", payload);
    }
}
