use nexgen_contracts::models::{ProjectIdea, ProposalData, StartupAnalysis, StartupFeasibility};
use serde::de::DeserializeOwned;

use crate::cancel::CancelToken;
use crate::error::GenerationError;
use crate::json_payload::{parse_json_payload, strip_code_fence};
use crate::pipeline::IdeaMode;
use crate::prompts::{feasibility_prompt, plan_prompt, proposal_prompt, website_prompt};
use crate::provider::{GenerateRequest, GenerationContext, ResponseFormat, TaskKind, Tool};

/// One self-contained prompt plus how to send it.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredCall {
    pub task: TaskKind,
    pub prompt: String,
    pub temperature: f32,
    pub format: ResponseFormat,
    pub web_search: bool,
}

/// Single-prompt generation that yields typed JSON or cleaned text.
#[derive(Clone)]
pub struct StructuredGenerator {
    context: GenerationContext,
}

impl StructuredGenerator {
    pub fn new(context: GenerationContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &GenerationContext {
        &self.context
    }

    fn build_request(&self, call: &StructuredCall) -> GenerateRequest {
        let mut request = self
            .context
            .request(call.task, call.temperature)
            .with_prompt(call.prompt.clone());
        request.response_format = call.format;
        if call.web_search {
            request.tools.push(Tool::WebSearch);
        }
        request
    }

    /// Runs `parse` on the response. When tools were requested and the
    /// attempt fails for any reason other than credentials or cancellation,
    /// repeats the call once without tools.
    fn run<T>(
        &self,
        call: &StructuredCall,
        cancel: &CancelToken,
        parse: impl Fn(&str) -> Result<T, GenerationError>,
    ) -> Result<T, GenerationError> {
        let request = self.build_request(call);
        let attempt = |request: &GenerateRequest| {
            let turn = self.context.execute(request, cancel)?;
            parse(turn.text())
        };

        let result = match attempt(&request) {
            Err(err) if request.uses_tools() && err.allows_toolless_retry() => {
                tracing::warn!(
                    task = call.task.as_str(),
                    kind = %err.kind(),
                    "tool-assisted attempt failed, retrying without tools"
                );
                attempt(&request.without_tools())
            }
            other => other,
        };
        if let Err(err) = &result {
            self.context.record_failure(call.task, err);
        }
        result
    }

    pub fn generate_json<T: DeserializeOwned>(
        &self,
        call: &StructuredCall,
        cancel: &CancelToken,
    ) -> Result<T, GenerationError> {
        self.run(call, cancel, parse_json_payload::<T>)
    }

    /// Free text with any surrounding code fence removed.
    pub fn generate_text(
        &self,
        call: &StructuredCall,
        cancel: &CancelToken,
    ) -> Result<String, GenerationError> {
        self.run(call, cancel, |text| {
            let cleaned = strip_code_fence(text);
            if cleaned.is_empty() {
                Err(GenerationError::EmptyResponse)
            } else {
                Ok(cleaned.to_string())
            }
        })
    }

    pub fn proposal(
        &self,
        project: &ProjectIdea,
        cancel: &CancelToken,
    ) -> Result<ProposalData, GenerationError> {
        let call = StructuredCall {
            task: TaskKind::Proposal,
            prompt: proposal_prompt(project),
            temperature: self.context.config().temperatures.proposal,
            format: ResponseFormat::Json,
            web_search: false,
        };
        self.generate_json(&call, cancel)
    }

    pub fn feasibility(
        &self,
        input: &str,
        mode: IdeaMode,
        cancel: &CancelToken,
    ) -> Result<StartupFeasibility, GenerationError> {
        let call = StructuredCall {
            task: TaskKind::Feasibility,
            prompt: feasibility_prompt(input, mode),
            temperature: self.context.config().temperatures.feasibility,
            format: ResponseFormat::Json,
            web_search: true,
        };
        self.generate_json(&call, cancel)
    }

    /// Branding, strategy and budgets only. The website is a separate call.
    pub fn plan(
        &self,
        input: &str,
        mode: IdeaMode,
        cancel: &CancelToken,
    ) -> Result<StartupAnalysis, GenerationError> {
        let call = StructuredCall {
            task: TaskKind::Plan,
            prompt: plan_prompt(input, mode),
            temperature: self.context.config().temperatures.plan,
            format: ResponseFormat::Json,
            web_search: false,
        };
        let mut analysis: StartupAnalysis = self.generate_json(&call, cancel)?;
        analysis.website_html = None;
        Ok(analysis)
    }

    pub fn website(
        &self,
        analysis: &StartupAnalysis,
        cancel: &CancelToken,
    ) -> Result<String, GenerationError> {
        let call = StructuredCall {
            task: TaskKind::Website,
            prompt: website_prompt(analysis),
            temperature: self.context.config().temperatures.website,
            format: ResponseFormat::PlainText,
            web_search: false,
        };
        self.generate_text(&call, cancel)
    }
}
