use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::cancel::CancelToken;
use crate::config::EngineConfig;
use crate::credentials::Credential;
use crate::error::GenerationError;
use crate::provider::{AssistantTurn, GenerateRequest, GenerationContext, GenerativeTransport};

type Step = Box<dyn FnOnce(&GenerateRequest) -> Result<AssistantTurn, GenerationError> + Send>;

/// Replays queued results in order and records every request it saw.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<GenerateRequest>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_text(&self, text: &str) {
        let text = text.to_string();
        self.push_with(move |_| Ok(AssistantTurn::Text(text)));
    }

    pub(crate) fn push_turn(&self, turn: AssistantTurn) {
        self.push_with(move |_| Ok(turn));
    }

    pub(crate) fn push_error(&self, err: GenerationError) {
        self.push_with(move |_| Err(err));
    }

    pub(crate) fn push_with<F>(&self, step: F)
    where
        F: FnOnce(&GenerateRequest) -> Result<AssistantTurn, GenerationError> + Send + 'static,
    {
        if let Ok(mut steps) = self.steps.lock() {
            steps.push_back(Box::new(step));
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().map(|rows| rows.clone()).unwrap_or_default()
    }
}

impl GenerativeTransport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn generate(&self, request: &GenerateRequest) -> Result<AssistantTurn, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut rows) = self.requests.lock() {
            rows.push(request.clone());
        }
        let step = self.steps.lock().ok().and_then(|mut steps| steps.pop_front());
        match step {
            Some(step) => step(request),
            None => Err(GenerationError::Unknown {
                status: None,
                detail: "no scripted response left".to_string(),
            }),
        }
    }
}

pub(crate) fn keyed_config() -> EngineConfig {
    EngineConfig {
        credential: Credential::new("test-key"),
        ..EngineConfig::default()
    }
}

pub(crate) fn context(transport: &Arc<ScriptedTransport>) -> GenerationContext {
    GenerationContext::new(keyed_config(), transport.clone())
}

pub(crate) fn context_with(config: EngineConfig, transport: &Arc<ScriptedTransport>) -> GenerationContext {
    GenerationContext::new(config, transport.clone())
}

/// Step that cancels `token` as if the caller navigated away mid-request.
pub(crate) fn cancel_during(token: &CancelToken, text: &str) -> impl FnOnce(&GenerateRequest) -> Result<AssistantTurn, GenerationError> + Send + 'static {
    let token = token.clone();
    let text = text.to_string();
    move |_| {
        token.cancel();
        Ok(AssistantTurn::Text(text))
    }
}
