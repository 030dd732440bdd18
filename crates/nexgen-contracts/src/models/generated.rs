//! Shapes returned by the structured-generation calls. Only `ProposalData`
//! is ever persisted, and only when embedded in a lead.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalScopeItem {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePhase {
    pub phase: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub deliverable: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalData {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub executive_summary: String,
    #[serde(default)]
    pub scope: Vec<ProposalScopeItem>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    pub timeline: Vec<TimelinePhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marketing_strategy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_plan: Option<String>,
    pub investment_value: String,
    #[serde(default)]
    pub investment_details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_us: Option<String>,
}

/// Feasibility label. Anything the model invents outside the four known
/// labels reads back as `Incerto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verdict {
    Aprovado,
    Reprovado,
    Incerto,
    Potencial,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aprovado => "Aprovado",
            Self::Reprovado => "Reprovado",
            Self::Incerto => "Incerto",
            Self::Potencial => "Potencial",
        }
    }
}

impl From<String> for Verdict {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "aprovado" => Self::Aprovado,
            "reprovado" => Self::Reprovado,
            "potencial" => Self::Potencial,
            _ => Self::Incerto,
        }
    }
}

impl From<Verdict> for String {
    fn from(value: Verdict) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupFeasibility {
    #[serde(deserialize_with = "clamped_score")]
    pub score: u8,
    pub verdict: Verdict,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot_advice: Option<String>,
}

impl StartupFeasibility {
    pub fn band(&self) -> ScoreBand {
        match self.score {
            71..=u8::MAX => ScoreBand::Strong,
            41..=70 => ScoreBand::Moderate,
            _ => ScoreBand::Weak,
        }
    }
}

fn clamped_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    let number = match &raw {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    let number =
        number.ok_or_else(|| serde::de::Error::custom(format!("score is not numeric: {raw}")))?;
    if !number.is_finite() {
        return Err(serde::de::Error::custom("score is not finite"));
    }
    Ok(number.round().clamp(0.0, 100.0) as u8)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetTier {
    pub range: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timeline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupBudget {
    pub mvp: BudgetTier,
    pub ideal: BudgetTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupAnalysis {
    pub name: String,
    #[serde(default)]
    pub slogan: String,
    #[serde(default)]
    pub logo_svg: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub problem: String,
    #[serde(default)]
    pub solution: String,
    #[serde(default)]
    pub market_size: String,
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub monetization: String,
    #[serde(default)]
    pub marketing_strategy: String,
    pub budgets: StartupBudget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_html: Option<String>,
}
