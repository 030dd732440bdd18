use nexgen_contracts::events::ActivityPayload;
use nexgen_contracts::models::{Lead, ProjectIdea, ProposalData};
use nexgen_contracts::store::{LocalDatabase, Repository, StorageBackend};
use serde_json::Value;

use crate::cancel::CancelToken;
use crate::error::GenerationError;
use crate::provider::GenerationContext;
use crate::structured::StructuredGenerator;

pub const MANUAL_FEATURES_PLACEHOLDER: &str = "A ser definido na proposta";

#[derive(Debug, thiserror::Error)]
pub enum ProposalError {
    #[error("lead `{0}` not found")]
    LeadNotFound(String),
    #[error("lead `{0}` has no project data to build a proposal from")]
    MissingProjectData(String),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("failed to store proposal: {0:#}")]
    Storage(anyhow::Error),
}

/// Where a proposal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalSource {
    Cached,
    Generated,
}

#[derive(Clone)]
pub struct ProposalService {
    generator: StructuredGenerator,
}

impl ProposalService {
    pub fn new(context: GenerationContext) -> Self {
        Self {
            generator: StructuredGenerator::new(context),
        }
    }

    /// Proposal for a stored lead. A proposal already on the lead is
    /// returned as is; otherwise one is generated and saved onto the lead.
    pub fn for_lead<B: StorageBackend>(
        &self,
        db: &LocalDatabase<B>,
        lead_id: &str,
        cancel: &CancelToken,
    ) -> Result<(ProposalData, ProposalSource), ProposalError> {
        let mut lead: Lead = db
            .leads()
            .get(lead_id)
            .ok_or_else(|| ProposalError::LeadNotFound(lead_id.to_string()))?;
        if let Some(proposal) = &lead.generated_proposal {
            tracing::debug!(lead_id, "reusing stored proposal");
            return Ok((proposal.clone(), ProposalSource::Cached));
        }
        let project = lead
            .project_data
            .as_ref()
            .ok_or_else(|| ProposalError::MissingProjectData(lead_id.to_string()))?;

        let proposal = self.generator.proposal(project, cancel)?;
        self.record(&proposal, Some(lead_id));
        lead.generated_proposal = Some(proposal.clone());
        db.update_lead(lead).map_err(ProposalError::Storage)?;
        Ok((proposal, ProposalSource::Generated))
    }

    /// Ad-hoc proposal typed in by an admin. Nothing is persisted.
    pub fn manual(
        &self,
        client_name: &str,
        title: &str,
        description: &str,
        cancel: &CancelToken,
    ) -> Result<ProposalData, ProposalError> {
        let mut project = ProjectIdea::new(title.trim(), description.trim());
        project.features = vec![MANUAL_FEATURES_PLACEHOLDER.to_string()];
        tracing::info!(client = client_name, title, "generating manual proposal");
        let proposal = self.generator.proposal(&project, cancel)?;
        self.record(&proposal, None);
        Ok(proposal)
    }

    fn record(&self, proposal: &ProposalData, lead_id: Option<&str>) {
        let mut payload = ActivityPayload::new();
        payload.insert("title".to_string(), Value::String(proposal.title.clone()));
        payload.insert(
            "lead_id".to_string(),
            lead_id.map_or(Value::Null, |id| Value::String(id.to_string())),
        );
        self.generator.context().record("proposal_generated", payload);
    }
}

#[cfg(test)]
mod tests {
    use nexgen_contracts::models::{Lead, LeadDraft, ProjectIdea};
    use nexgen_contracts::store::{LocalDatabase, MemoryBackend, Repository};
    use serde_json::json;

    use super::{ProposalError, ProposalService, ProposalSource, MANUAL_FEATURES_PLACEHOLDER};
    use crate::cancel::CancelToken;
    use crate::error::GenerationError;
    use crate::testing::{context, ScriptedTransport};

    fn proposal_json() -> String {
        json!({
            "title": "Vinho Digital",
            "executiveSummary": "Loja online com clube de assinaturas.",
            "scope": [{"title": "Loja", "description": "Catálogo e checkout"}],
            "techStack": ["Next.js"],
            "timeline": [{"phase": "1. Discovery", "duration": "1 Semana", "deliverable": "Wireframes"}],
            "investmentValue": "€5.000",
            "investmentDetails": "50/50"
        })
        .to_string()
    }

    fn lead(with_project: bool) -> Lead {
        let lead = Lead::from_draft(LeadDraft {
            name: "Ana".to_string(),
            contact: "ana@exemplo.pt".to_string(),
            interest: "Pedido de Orçamento: Loja de Vinhos".to_string(),
        });
        if with_project {
            lead.with_project(ProjectIdea::new("Loja de Vinhos", "E-commerce"))
        } else {
            lead
        }
    }

    #[test]
    fn generated_proposal_is_stored_and_then_reused() -> anyhow::Result<()> {
        let db = LocalDatabase::new(MemoryBackend::default());
        let stored = lead(true);
        db.add_lead(stored.clone())?;

        let transport = ScriptedTransport::new();
        transport.push_text(&proposal_json());
        let service = ProposalService::new(context(&transport));

        let (first, source) = service.for_lead(&db, &stored.id, &CancelToken::new())?;
        assert_eq!(source, ProposalSource::Generated);
        assert_eq!(first.title, "Vinho Digital");
        let saved = db.leads().get(&stored.id).and_then(|lead| lead.generated_proposal);
        assert_eq!(saved.as_ref(), Some(&first));

        let (second, source) = service.for_lead(&db, &stored.id, &CancelToken::new())?;
        assert_eq!(source, ProposalSource::Cached);
        assert_eq!(second, first);
        assert_eq!(transport.calls(), 1);
        Ok(())
    }

    #[test]
    fn lead_without_project_data_is_rejected_without_a_call() -> anyhow::Result<()> {
        let db = LocalDatabase::new(MemoryBackend::default());
        let stored = lead(false);
        db.add_lead(stored.clone())?;
        let transport = ScriptedTransport::new();
        let service = ProposalService::new(context(&transport));

        let err = service.for_lead(&db, &stored.id, &CancelToken::new()).err();
        assert!(matches!(err, Some(ProposalError::MissingProjectData(id)) if id == stored.id));
        assert!(matches!(
            service.for_lead(&db, "nope", &CancelToken::new()).err(),
            Some(ProposalError::LeadNotFound(_))
        ));
        assert_eq!(transport.calls(), 0);
        Ok(())
    }

    #[test]
    fn failed_generation_leaves_the_lead_untouched() -> anyhow::Result<()> {
        let db = LocalDatabase::new(MemoryBackend::default());
        let stored = lead(true);
        db.add_lead(stored.clone())?;
        let transport = ScriptedTransport::new();
        transport.push_text("isto não é json");
        let service = ProposalService::new(context(&transport));

        let err = service.for_lead(&db, &stored.id, &CancelToken::new()).err();
        assert!(matches!(
            err,
            Some(ProposalError::Generation(GenerationError::MalformedJson { .. }))
        ));
        assert_eq!(db.leads().get(&stored.id), Some(stored));
        Ok(())
    }

    #[test]
    fn manual_proposal_uses_placeholder_features() -> anyhow::Result<()> {
        let transport = ScriptedTransport::new();
        transport.push_text(&proposal_json());
        let service = ProposalService::new(context(&transport));
        let proposal = service.manual("Bruno", "App de Reservas", "Reservas para clínicas", &CancelToken::new())?;
        assert_eq!(proposal.investment_value, "€5.000");

        let prompt = transport.requests()[0].last_user_text().unwrap_or_default().to_string();
        assert!(prompt.contains(MANUAL_FEATURES_PLACEHOLDER));
        assert!(prompt.contains("App de Reservas"));
        Ok(())
    }
}
