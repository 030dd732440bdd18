use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::generated::ProposalData;
use super::project::ProjectIdea;
use super::timestamp::{iso, now_utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    New,
    Contacted,
    Confirmed,
    Cancelled,
}

impl LeadStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::New => "Novo",
            Self::Contacted => "Contactado",
            Self::Confirmed => "Confirmado",
            Self::Cancelled => "Cancelado",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "new" | "novo" => Some(Self::New),
            "contacted" | "contactado" => Some(Self::Contacted),
            "confirmed" | "confirmado" => Some(Self::Confirmed),
            "cancelled" | "canceled" | "cancelado" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// The three fields a lead needs before it gets an id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadDraft {
    pub name: String,
    pub contact: String,
    pub interest: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub contact: String,
    pub interest: String,
    #[serde(with = "iso")]
    pub created_at: DateTime<Utc>,
    pub status: LeadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_data: Option<ProjectIdea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_proposal: Option<ProposalData>,
}

impl Lead {
    pub fn from_draft(draft: LeadDraft) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name,
            contact: draft.contact,
            interest: draft.interest,
            created_at: now_utc(),
            status: LeadStatus::New,
            project_image: None,
            project_data: None,
            generated_proposal: None,
        }
    }

    pub fn with_project(mut self, project: ProjectIdea) -> Self {
        self.project_image = project.images.first().cloned();
        self.project_data = Some(project);
        self
    }

    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.interest.to_lowercase().contains(&needle)
    }
}
