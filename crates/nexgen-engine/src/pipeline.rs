//! Startup Builder: feasibility, then plan, then a lazily generated website.
//!
//! ```text
//! Input -> AnalyzingFeasibility -> FeasibilityResult -> AnalyzingPlan -> FullResult{tab}
//! ```
//!
//! A failed phase puts the builder back in the last stable step and keeps the
//! error plus the failed phase so `retry` can run it again.

use nexgen_contracts::events::ActivityPayload;
use nexgen_contracts::models::{StartupAnalysis, StartupFeasibility};
use serde_json::Value;

use crate::cancel::CancelToken;
use crate::error::GenerationError;
use crate::provider::GenerationContext;
use crate::structured::StructuredGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdeaMode {
    #[default]
    Idea,
    /// The input is the URL of an existing site.
    Site,
}

impl IdeaMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::Site => "website",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTab {
    Business,
    Budget,
    Website,
}

impl ResultTab {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "business" | "negocio" | "negócio" => Some(Self::Business),
            "budget" | "orcamento" | "orçamento" => Some(Self::Budget),
            "website" | "site" => Some(Self::Website),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderStep {
    Input,
    AnalyzingFeasibility,
    FeasibilityResult,
    AnalyzingPlan,
    FullResult { tab: ResultTab },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Feasibility,
    Plan,
    Website,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("descreva a ideia ou indique a URL antes de analisar")]
    BlankIdea,
    #[error("`{action}` is not available in step {step:?}")]
    InvalidStep {
        step: BuilderStep,
        action: &'static str,
    },
    #[error("score {score} is below the continue threshold {threshold}")]
    BelowThreshold { score: u8, threshold: u8 },
    #[error("nothing to retry")]
    NothingToRetry,
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

pub struct StartupBuilder {
    generator: StructuredGenerator,
    step: BuilderStep,
    idea: String,
    mode: IdeaMode,
    /// Idea awaiting its feasibility verdict. Committed to `idea`/`mode`
    /// only once the verdict arrives.
    pending: Option<(String, IdeaMode)>,
    feasibility: Option<StartupFeasibility>,
    analysis: Option<StartupAnalysis>,
    last_error: Option<GenerationError>,
    failed_phase: Option<Phase>,
    cancel: CancelToken,
}

impl StartupBuilder {
    pub fn new(context: GenerationContext) -> Self {
        Self {
            generator: StructuredGenerator::new(context),
            step: BuilderStep::Input,
            idea: String::new(),
            mode: IdeaMode::Idea,
            pending: None,
            feasibility: None,
            analysis: None,
            last_error: None,
            failed_phase: None,
            cancel: CancelToken::new(),
        }
    }

    pub fn step(&self) -> BuilderStep {
        self.step
    }

    pub fn idea(&self) -> &str {
        &self.idea
    }

    pub fn mode(&self) -> IdeaMode {
        self.mode
    }

    pub fn feasibility(&self) -> Option<&StartupFeasibility> {
        self.feasibility.as_ref()
    }

    pub fn analysis(&self) -> Option<&StartupAnalysis> {
        self.analysis.as_ref()
    }

    pub fn last_error(&self) -> Option<&GenerationError> {
        self.last_error.as_ref()
    }

    pub fn failed_phase(&self) -> Option<Phase> {
        self.failed_phase
    }

    /// Token for the call in flight; cancelling it makes the pending phase
    /// fail with `Cancelled` instead of applying its result.
    pub fn cancel_handle(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs the feasibility phase for a new idea or URL.
    pub fn submit_idea(&mut self, input: &str, mode: IdeaMode) -> Result<&StartupFeasibility, PipelineError> {
        if !matches!(self.step, BuilderStep::Input | BuilderStep::FeasibilityResult) {
            return Err(PipelineError::InvalidStep {
                step: self.step,
                action: "submit_idea",
            });
        }
        let input = input.trim();
        if input.is_empty() {
            return Err(PipelineError::BlankIdea);
        }
        self.pending = Some((input.to_string(), mode));
        self.run_feasibility()
    }

    fn run_feasibility(&mut self) -> Result<&StartupFeasibility, PipelineError> {
        let Some((idea, mode)) = self.pending.clone() else {
            return Err(PipelineError::NothingToRetry);
        };
        let stable = self.step;
        self.refresh_cancel();
        self.step = BuilderStep::AnalyzingFeasibility;

        match self.generator.feasibility(&idea, mode, &self.cancel) {
            Ok(feasibility) => {
                let mut payload = ActivityPayload::new();
                payload.insert("mode".to_string(), Value::String(mode.as_str().to_string()));
                payload.insert("score".to_string(), Value::from(feasibility.score));
                payload.insert(
                    "verdict".to_string(),
                    Value::String(feasibility.verdict.as_str().to_string()),
                );
                self.generator.context().record("feasibility_completed", payload);

                self.clear_failure();
                self.idea = idea;
                self.mode = mode;
                self.analysis = None;
                self.step = BuilderStep::FeasibilityResult;
                Ok(&*self.feasibility.insert(feasibility))
            }
            Err(err) => Err(self.fail(stable, Phase::Feasibility, err)),
        }
    }

    /// Whether the plan phase may start. A missing threshold never gates.
    pub fn can_continue(&self) -> bool {
        match (&self.feasibility, self.generator.context().config().continue_threshold) {
            (Some(_), None) => true,
            (Some(feasibility), Some(threshold)) => feasibility.score >= threshold,
            (None, _) => false,
        }
    }

    /// Generates branding, strategy and budgets. The website is left for
    /// the first activation of the website tab.
    pub fn generate_plan(&mut self) -> Result<&StartupAnalysis, PipelineError> {
        if self.step != BuilderStep::FeasibilityResult {
            return Err(PipelineError::InvalidStep {
                step: self.step,
                action: "generate_plan",
            });
        }
        if let (Some(feasibility), Some(threshold)) = (
            &self.feasibility,
            self.generator.context().config().continue_threshold,
        ) {
            if feasibility.score < threshold {
                return Err(PipelineError::BelowThreshold {
                    score: feasibility.score,
                    threshold,
                });
            }
        }

        self.refresh_cancel();
        self.step = BuilderStep::AnalyzingPlan;
        match self.generator.plan(&self.idea, self.mode, &self.cancel) {
            Ok(analysis) => {
                let mut payload = ActivityPayload::new();
                payload.insert("name".to_string(), Value::String(analysis.name.clone()));
                self.generator.context().record("plan_completed", payload);

                self.clear_failure();
                self.step = BuilderStep::FullResult {
                    tab: ResultTab::Business,
                };
                Ok(&*self.analysis.insert(analysis))
            }
            Err(err) => Err(self.fail(BuilderStep::FeasibilityResult, Phase::Plan, err)),
        }
    }

    /// Switches the result tab. The first activation of `Website` generates
    /// the landing page; later activations reuse the cached HTML.
    pub fn activate_tab(&mut self, tab: ResultTab) -> Result<(), PipelineError> {
        let BuilderStep::FullResult { tab: current } = self.step else {
            return Err(PipelineError::InvalidStep {
                step: self.step,
                action: "activate_tab",
            });
        };
        let cached = match &self.analysis {
            Some(analysis) => analysis.website_html.is_some(),
            None => {
                return Err(PipelineError::InvalidStep {
                    step: self.step,
                    action: "activate_tab",
                })
            }
        };
        self.step = BuilderStep::FullResult { tab };
        if tab != ResultTab::Website || cached {
            return Ok(());
        }

        self.refresh_cancel();
        let Some(analysis) = self.analysis.as_ref() else {
            return Ok(());
        };
        match self.generator.website(analysis, &self.cancel) {
            Ok(html) => {
                let mut payload = ActivityPayload::new();
                payload.insert("name".to_string(), Value::String(analysis.name.clone()));
                payload.insert("bytes".to_string(), Value::from(html.len()));
                self.generator.context().record("website_generated", payload);

                self.clear_failure();
                if let Some(analysis) = self.analysis.as_mut() {
                    analysis.website_html = Some(html);
                }
                Ok(())
            }
            Err(err) => Err(self.fail(BuilderStep::FullResult { tab: current }, Phase::Website, err)),
        }
    }

    pub fn website_html(&self) -> Option<&str> {
        self.analysis.as_ref()?.website_html.as_deref()
    }

    /// Re-runs whichever phase failed last.
    pub fn retry(&mut self) -> Result<(), PipelineError> {
        match self.failed_phase {
            Some(Phase::Feasibility) => self.run_feasibility().map(|_| ()),
            Some(Phase::Plan) => self.generate_plan().map(|_| ()),
            Some(Phase::Website) => self.activate_tab(ResultTab::Website),
            None => Err(PipelineError::NothingToRetry),
        }
    }

    /// Abandons the current run. Anything still in flight is cancelled.
    pub fn reset(&mut self) {
        self.cancel.cancel();
        self.cancel = CancelToken::new();
        self.step = BuilderStep::Input;
        self.idea.clear();
        self.mode = IdeaMode::Idea;
        self.pending = None;
        self.feasibility = None;
        self.analysis = None;
        self.clear_failure();
    }

    fn refresh_cancel(&mut self) {
        if self.cancel.is_cancelled() {
            self.cancel = CancelToken::new();
        }
    }

    fn clear_failure(&mut self) {
        self.pending = None;
        self.last_error = None;
        self.failed_phase = None;
    }

    fn fail(&mut self, stable: BuilderStep, phase: Phase, err: GenerationError) -> PipelineError {
        tracing::warn!(?phase, ?stable, kind = %err.kind(), "startup builder phase failed");
        self.step = stable;
        self.failed_phase = Some(phase);
        self.last_error = Some(err.clone());
        PipelineError::Generation(err)
    }
}

#[cfg(test)]
mod tests {
    use nexgen_contracts::events::ActivityLog;
    use serde_json::json;

    use super::{BuilderStep, IdeaMode, Phase, PipelineError, ResultTab, StartupBuilder};
    use crate::config::EngineConfig;
    use crate::error::{ErrorKind, GenerationError};
    use crate::testing::{cancel_during, context, context_with, keyed_config, ScriptedTransport};

    fn feasibility(score: u8) -> String {
        json!({
            "score": score,
            "verdict": "Potencial",
            "summary": "Procura real, execução difícil.",
            "strengths": ["Recorrência"],
            "weaknesses": ["Logística"],
            "pivotAdvice": "Comece por construtoras."
        })
        .to_string()
    }

    fn plan() -> String {
        json!({
            "name": "Alugaí",
            "slogan": "Equipamento quando precisa.",
            "colors": ["#0f172a", "#22d3ee"],
            "budgets": {
                "mvp": {"range": "€2.500 - €4.000", "description": "Core", "timeline": "4 Semanas"},
                "ideal": {"range": "€8.000 - €15.000", "description": "Completo", "timeline": "3 Meses"}
            }
        })
        .to_string()
    }

    fn builder_at_full_result(transport: &std::sync::Arc<ScriptedTransport>) -> anyhow::Result<StartupBuilder> {
        transport.push_text(&feasibility(70));
        transport.push_text(&plan());
        let mut builder = StartupBuilder::new(context(transport));
        builder.submit_idea("marketplace de explicadores", IdeaMode::Idea)?;
        builder.generate_plan()?;
        Ok(builder)
    }

    #[test]
    fn idea_above_threshold_moves_through_to_the_plan() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_text(&feasibility(45));
        transport.push_text(&plan());
        let mut builder = StartupBuilder::new(context(&transport));

        let result = builder.submit_idea("ferramenta de aluguel de equipamentos", IdeaMode::Idea)?;
        assert_eq!(result.score, 45);
        assert!(result.pivot_advice.as_deref().is_some_and(|advice| !advice.is_empty()));
        assert_eq!(builder.step(), BuilderStep::FeasibilityResult);
        assert!(builder.can_continue());

        let analysis = builder.generate_plan()?;
        assert_eq!(analysis.name, "Alugaí");
        assert!(analysis.website_html.is_none());
        assert_eq!(
            builder.step(),
            BuilderStep::FullResult {
                tab: ResultTab::Business
            }
        );
        assert_eq!(transport.calls(), 2);
        Ok(())
    }

    #[test]
    fn low_score_blocks_the_plan_without_a_call() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_text(&feasibility(12));
        let mut builder = StartupBuilder::new(context(&transport));
        builder.submit_idea("outra rede social", IdeaMode::Idea)?;

        assert!(!builder.can_continue());
        let err = builder.generate_plan().err();
        assert_eq!(
            err,
            Some(PipelineError::BelowThreshold {
                score: 12,
                threshold: 30
            })
        );
        assert_eq!(builder.step(), BuilderStep::FeasibilityResult);
        assert_eq!(transport.calls(), 1);
        Ok(())
    }

    #[test]
    fn disabled_threshold_never_gates() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_text(&feasibility(5));
        transport.push_text(&plan());
        let config = EngineConfig {
            continue_threshold: None,
            ..keyed_config()
        };
        let mut builder = StartupBuilder::new(context_with(config, &transport));
        builder.submit_idea("ideia fraca", IdeaMode::Idea)?;
        assert!(builder.can_continue());
        builder.generate_plan()?;
        Ok(())
    }

    #[test]
    fn website_is_generated_once_and_cached() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        let mut builder = builder_at_full_result(&transport)?;
        assert_eq!(transport.calls(), 2);

        builder.activate_tab(ResultTab::Budget)?;
        assert_eq!(transport.calls(), 2);

        transport.push_text("```html\n<section>Alugaí</section>\n```");
        builder.activate_tab(ResultTab::Website)?;
        assert_eq!(transport.calls(), 3);
        assert_eq!(builder.website_html(), Some("<section>Alugaí</section>"));

        builder.activate_tab(ResultTab::Business)?;
        builder.activate_tab(ResultTab::Website)?;
        assert_eq!(transport.calls(), 3);
        Ok(())
    }

    #[test]
    fn failed_phase_reverts_and_can_be_retried() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_text(&feasibility(60));
        transport.push_error(GenerationError::Timeout(std::time::Duration::from_secs(90)));
        let mut builder = StartupBuilder::new(context(&transport));
        builder.submit_idea("https://exemplo.pt", IdeaMode::Site)?;

        let err = builder.generate_plan().err();
        assert!(matches!(err, Some(PipelineError::Generation(GenerationError::Timeout(_)))));
        assert_eq!(builder.step(), BuilderStep::FeasibilityResult);
        assert_eq!(builder.failed_phase(), Some(Phase::Plan));
        assert_eq!(builder.last_error().map(|err| err.kind()), Some(ErrorKind::Timeout));

        transport.push_text(&plan());
        builder.retry()?;
        assert!(matches!(builder.step(), BuilderStep::FullResult { .. }));
        assert!(builder.last_error().is_none());
        assert_eq!(transport.requests()[2].turns.len(), 1);
        Ok(())
    }

    #[test]
    fn failed_feasibility_returns_to_input() {
        let transport = ScriptedTransport::new();
        transport.push_text("sem json nenhum");
        let mut builder = StartupBuilder::new(context(&transport));
        transport.push_text("continua sem json");

        let err = builder.submit_idea("ideia", IdeaMode::Idea).err();
        assert!(matches!(err, Some(PipelineError::Generation(GenerationError::MalformedJson { .. }))));
        assert_eq!(builder.step(), BuilderStep::Input);
        assert_eq!(builder.failed_phase(), Some(Phase::Feasibility));
        assert!(builder.feasibility().is_none());
    }

    #[test]
    fn failed_resubmission_keeps_the_vetted_idea() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_text(&feasibility(90));
        let mut builder = StartupBuilder::new(context(&transport));
        builder.submit_idea("ideia forte A", IdeaMode::Idea)?;

        transport.push_text("sem json");
        transport.push_text("continua sem json");
        assert!(builder.submit_idea("ideia fraca B", IdeaMode::Site).is_err());
        assert_eq!(builder.step(), BuilderStep::FeasibilityResult);
        assert_eq!(builder.failed_phase(), Some(Phase::Feasibility));
        assert_eq!(builder.idea(), "ideia forte A");
        assert_eq!(builder.mode(), IdeaMode::Idea);
        assert_eq!(builder.feasibility().map(|row| row.score), Some(90));

        transport.push_text(&plan());
        builder.generate_plan()?;
        let prompt = transport.requests()[3].last_user_text().unwrap_or_default().to_string();
        assert!(prompt.contains("ideia forte A"));
        assert!(!prompt.contains("ideia fraca B"));
        Ok(())
    }

    #[test]
    fn retried_resubmission_commits_the_new_idea() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_text(&feasibility(90));
        let mut builder = StartupBuilder::new(context(&transport));
        builder.submit_idea("ideia A", IdeaMode::Idea)?;

        transport.push_error(GenerationError::Timeout(std::time::Duration::from_secs(90)));
        transport.push_error(GenerationError::Timeout(std::time::Duration::from_secs(90)));
        assert!(builder.submit_idea("https://b.pt", IdeaMode::Site).is_err());

        transport.push_text(&feasibility(20));
        builder.retry()?;
        assert_eq!(builder.idea(), "https://b.pt");
        assert_eq!(builder.mode(), IdeaMode::Site);
        assert_eq!(builder.feasibility().map(|row| row.score), Some(20));
        assert!(builder.failed_phase().is_none());
        Ok(())
    }

    #[test]
    fn website_failure_keeps_the_previous_tab() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        let mut builder = builder_at_full_result(&transport)?;
        builder.activate_tab(ResultTab::Budget)?;

        transport.push_error(GenerationError::ProviderOutage {
            status: 503,
            detail: "overloaded".to_string(),
        });
        assert!(builder.activate_tab(ResultTab::Website).is_err());
        assert_eq!(
            builder.step(),
            BuilderStep::FullResult {
                tab: ResultTab::Budget
            }
        );
        assert!(builder.website_html().is_none());
        assert_eq!(builder.failed_phase(), Some(Phase::Website));
        Ok(())
    }

    #[test]
    fn cancelled_result_is_not_applied() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        let mut builder = StartupBuilder::new(context(&transport));
        transport.push_with(cancel_during(&builder.cancel_handle(), &feasibility(90)));

        let err = builder.submit_idea("ideia", IdeaMode::Idea).err();
        assert_eq!(err, Some(PipelineError::Generation(GenerationError::Cancelled)));
        assert_eq!(builder.step(), BuilderStep::Input);
        assert!(builder.feasibility().is_none());

        transport.push_text(&feasibility(90));
        builder.retry()?;
        assert_eq!(builder.feasibility().map(|row| row.score), Some(90));
        Ok(())
    }

    #[test]
    fn blank_idea_and_out_of_order_calls_are_rejected() {
        let transport = ScriptedTransport::new();
        let mut builder = StartupBuilder::new(context(&transport));
        assert_eq!(builder.submit_idea("   ", IdeaMode::Idea).err(), Some(PipelineError::BlankIdea));
        assert!(matches!(
            builder.generate_plan().err(),
            Some(PipelineError::InvalidStep { .. })
        ));
        assert!(builder.activate_tab(ResultTab::Website).is_err());
        assert_eq!(builder.retry().err(), Some(PipelineError::NothingToRetry));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn reset_clears_results_and_cancels_the_old_token() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        let mut builder = builder_at_full_result(&transport)?;
        let old = builder.cancel_handle();
        builder.reset();
        assert!(old.is_cancelled());
        assert!(!builder.cancel_handle().is_cancelled());
        assert_eq!(builder.step(), BuilderStep::Input);
        assert!(builder.analysis().is_none());
        assert!(builder.idea().is_empty());
        Ok(())
    }

    #[test]
    fn milestones_are_recorded() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("activity.jsonl");
        let transport = ScriptedTransport::new();
        transport.push_text(&feasibility(70));
        transport.push_text(&plan());
        transport.push_text("<section>ok</section>");
        let ctx = context(&transport).with_activity(ActivityLog::new(&path, "s1"));
        let mut builder = StartupBuilder::new(ctx);
        builder.submit_idea("ideia", IdeaMode::Idea)?;
        builder.generate_plan()?;
        builder.activate_tab(ResultTab::Website)?;

        let types: Vec<String> = std::fs::read_to_string(&path)?
            .lines()
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .filter_map(|row| row["type"].as_str().map(str::to_string))
            .collect();
        assert_eq!(types, vec!["feasibility_completed", "plan_completed", "website_generated"]);
        Ok(())
    }
}
