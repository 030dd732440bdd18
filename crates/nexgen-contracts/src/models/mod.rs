mod chat;
mod generated;
mod lead;
mod project;
mod service;
pub mod timestamp;
mod user;

pub use chat::{ChatMessage, ChatRole, Conversation};
pub use generated::{
    BudgetTier, ProposalData, ProposalScopeItem, ScoreBand, StartupAnalysis, StartupBudget,
    StartupFeasibility, TimelinePhase, Verdict,
};
pub use lead::{Lead, LeadDraft, LeadStatus};
pub use project::{projects_owned_by, ProjectIdea};
pub use service::ServiceType;
pub use user::{User, UserRole};

pub fn search_leads<'a>(leads: &'a [Lead], term: &str) -> Vec<&'a Lead> {
    leads.iter().filter(|lead| lead.matches_search(term)).collect()
}

pub fn search_users<'a>(users: &'a [User], term: &str) -> Vec<&'a User> {
    users.iter().filter(|user| user.matches_search(term)).collect()
}
