//! Turning visitors into leads: the contact form, leads detected by the
//! consultant, and quote requests from clients and the Startup Builder.

use nexgen_contracts::events::{ActivityLog, ActivityPayload};
use nexgen_contracts::models::{Lead, LeadDraft, ProjectIdea, ServiceType, StartupAnalysis, User};
use nexgen_contracts::store::{LocalDatabase, StorageBackend};
use serde_json::Value;

use crate::config::EngineConfig;
use crate::messaging::{project_quote_message, startup_quote_message, whatsapp_link};
use crate::sheets::{SheetClient, SheetRecord, SheetSubmission};

#[derive(Debug, Clone, PartialEq)]
pub struct ContactForm {
    pub name: String,
    pub company: Option<String>,
    pub email: String,
    pub service: ServiceType,
    pub message: String,
}

impl ContactForm {
    pub fn interest(&self) -> String {
        match self.company.as_deref().map(str::trim).filter(|company| !company.is_empty()) {
            Some(company) => format!(
                "{} - Empresa: {} - {}",
                self.service.label(),
                company,
                self.message.trim()
            ),
            None => format!("{} - {}", self.service.label(), self.message.trim()),
        }
    }

    pub fn to_draft(&self) -> LeadDraft {
        LeadDraft {
            name: self.name.trim().to_string(),
            contact: self.email.trim().to_string(),
            interest: self.interest(),
        }
    }
}

#[derive(Debug)]
pub struct QuoteRequest {
    pub lead: Lead,
    pub whatsapp_url: String,
    pub sheet: SheetSubmission,
}

#[derive(Debug)]
pub struct StartupQuote {
    pub whatsapp_url: String,
    pub sheet: SheetSubmission,
}

pub struct LeadIntake<'a, B> {
    db: &'a LocalDatabase<B>,
    sheets: SheetClient,
    admin_phone: String,
    activity: Option<ActivityLog>,
}

impl<'a, B: StorageBackend> LeadIntake<'a, B> {
    pub fn new(db: &'a LocalDatabase<B>, config: &EngineConfig) -> Self {
        Self {
            db,
            sheets: SheetClient::from_config(config),
            admin_phone: config.admin_phone.clone(),
            activity: None,
        }
    }

    pub fn with_sheets(mut self, sheets: SheetClient) -> Self {
        self.sheets = sheets;
        self
    }

    pub fn with_activity(mut self, activity: ActivityLog) -> Self {
        self.activity = Some(activity);
        self
    }

    pub fn register_contact(&self, form: &ContactForm) -> anyhow::Result<Lead> {
        self.store(Lead::from_draft(form.to_draft()), "contact_form")
    }

    pub fn register_chat_lead(&self, draft: LeadDraft) -> anyhow::Result<Lead> {
        self.store(Lead::from_draft(draft), "consultant")
    }

    /// Client asks for a formal quote on one of their projects.
    pub fn request_quote(
        &self,
        client: &User,
        project: &ProjectIdea,
        extra_message: Option<&str>,
    ) -> anyhow::Result<QuoteRequest> {
        let draft = LeadDraft {
            name: client.name.clone(),
            contact: client.email.clone(),
            interest: format!("Pedido de Orçamento: {}", project.title),
        };
        let lead = self.store(Lead::from_draft(draft).with_project(project.clone()), "quote_request")?;

        let mut record = SheetRecord::new(&client.name, &client.email, &lead.interest)
            .detail("projectTitle", project.title.as_str())
            .detail("description", project.description.as_str());
        if let Some(budget) = &project.budget_range {
            record = record.detail("budget", budget.as_str());
        }
        if let Some(extra) = extra_message.map(str::trim).filter(|extra| !extra.is_empty()) {
            record = record.detail("extraMessage", extra);
        }
        let sheet = self.submit(record);

        let whatsapp_url = whatsapp_link(
            &self.admin_phone,
            &project_quote_message(client, project, extra_message),
        );
        Ok(QuoteRequest {
            lead,
            whatsapp_url,
            sheet,
        })
    }

    /// Quote for a startup generated by the Startup Builder. No lead is
    /// stored; the visitor is anonymous at that point.
    pub fn startup_quote(&self, analysis: &StartupAnalysis) -> StartupQuote {
        let record = SheetRecord::new(
            "Lead via Startup Builder",
            "WhatsApp Click",
            format!(
                "Startup Builder: {} - Orçamento Estimado: {}",
                analysis.name, analysis.budgets.mvp.range
            ),
        )
        .detail("slogan", analysis.slogan.as_str())
        .detail("budget_mvp", analysis.budgets.mvp.range.as_str())
        .detail("budget_ideal", analysis.budgets.ideal.range.as_str());
        StartupQuote {
            sheet: self.submit(record),
            whatsapp_url: whatsapp_link(&self.admin_phone, &startup_quote_message(analysis)),
        }
    }

    fn store(&self, lead: Lead, source: &str) -> anyhow::Result<Lead> {
        self.db.add_lead(lead.clone())?;
        tracing::info!(lead_id = %lead.id, source, "lead registered");
        let mut payload = ActivityPayload::new();
        payload.insert("lead_id".to_string(), Value::String(lead.id.clone()));
        payload.insert("source".to_string(), Value::String(source.to_string()));
        self.record("lead_created", payload);
        Ok(lead)
    }

    fn submit(&self, record: SheetRecord) -> SheetSubmission {
        let interest = record.interest.clone();
        let submission = self.sheets.submit(record);
        if submission.is_dispatched() {
            let mut payload = ActivityPayload::new();
            payload.insert("interest".to_string(), Value::String(interest));
            self.record("sheet_submitted", payload);
        }
        submission
    }

    fn record(&self, event_type: &str, payload: ActivityPayload) {
        if let Some(activity) = &self.activity {
            activity.record(event_type, payload);
        }
    }
}
