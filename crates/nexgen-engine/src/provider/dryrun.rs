use serde_json::json;

use super::{AssistantTurn, GenerateRequest, GenerativeTransport, TaskKind};
use crate::error::GenerationError;

/// Offline transport returning canned, well-formed answers per task.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryrunTransport;

impl DryrunTransport {
    fn canned(task: TaskKind, prompt: &str) -> String {
        match task {
            TaskKind::Chat => format!(
                "[dryrun] Recebi a sua mensagem ({} caracteres). Para um orçamento, crie conta na Área do Cliente ou use o formulário de contacto.",
                prompt.chars().count()
            ),
            TaskKind::Feasibility => json!({
                "score": 62,
                "verdict": "Potencial",
                "summary": "Ideia com procura real, mas mercado competitivo.",
                "strengths": ["Dor clara", "Modelo recorrente"],
                "weaknesses": ["Concorrência local", "Logística"],
                "pivotAdvice": "Comece por um nicho B2B antes de abrir ao público."
            })
            .to_string(),
            TaskKind::Plan => json!({
                "name": "Dryrun",
                "slogan": "Valide antes de construir.",
                "logoSvg": "<svg viewBox=\"0 0 100 100\"><circle cx=\"50\" cy=\"50\" r=\"40\" fill=\"#7c3aed\"/></svg>",
                "colors": ["#7c3aed", "#ec4899", "#0f172a"],
                "problem": "Equipas perdem tempo a validar ideias.",
                "solution": "Um assistente que estrutura o plano num minuto.",
                "marketSize": "PMEs digitais na Europa.",
                "competitors": ["Notion", "Lean Canvas"],
                "monetization": "SaaS mensal",
                "marketingStrategy": "Conteúdo e parcerias com incubadoras.",
                "budgets": {
                    "mvp": {"range": "€2.500 - €4.000", "description": "Core features", "timeline": "3-4 Semanas"},
                    "ideal": {"range": "€8.000 - €15.000", "description": "Produto completo", "timeline": "2-3 Meses"}
                }
            })
            .to_string(),
            TaskKind::Website => "<section class=\"bg-slate-950 text-white p-16\"><h1 class=\"text-6xl\">Dryrun</h1></section>".to_string(),
            TaskKind::Proposal => json!({
                "title": "Solução Digital Dryrun",
                "subtitle": "Proposta de demonstração",
                "executiveSummary": "Proposta gerada sem contactar o fornecedor de IA.",
                "scope": [{"title": "Discovery", "description": "Workshops e requisitos."}],
                "techStack": ["Rust", "PostgreSQL"],
                "timeline": [{"phase": "1. Discovery", "duration": "1 Semana", "deliverable": "Wireframes"}],
                "investmentValue": "A definir",
                "investmentDetails": "40% entrada, 30% entrega, 30% final."
            })
            .to_string(),
        }
    }
}

impl GenerativeTransport for DryrunTransport {
    fn name(&self) -> &'static str {
        "dryrun"
    }

    fn generate(&self, request: &GenerateRequest) -> Result<AssistantTurn, GenerationError> {
        let prompt = request.last_user_text().unwrap_or_default();
        Ok(AssistantTurn::Text(Self::canned(request.task, prompt)))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use nexgen_contracts::models::{ProposalData, StartupAnalysis, StartupFeasibility};

    use super::DryrunTransport;
    use crate::provider::{GenerateRequest, GenerativeTransport, ResponseFormat, TaskKind};

    fn request(task: TaskKind) -> GenerateRequest {
        GenerateRequest {
            task,
            model: "dryrun".to_string(),
            system_instruction: None,
            turns: Vec::new(),
            temperature: 0.0,
            response_format: ResponseFormat::Json,
            tools: Vec::new(),
            timeout: Duration::from_secs(1),
            connect_retries: 0,
        }
        .with_prompt("ideia")
    }

    #[test]
    fn canned_json_matches_the_shapes() -> anyhow::Result<()> {
        let transport = DryrunTransport;
        let feasibility = transport.generate(&request(TaskKind::Feasibility))?;
        serde_json::from_str::<StartupFeasibility>(feasibility.text())?;
        let plan = transport.generate(&request(TaskKind::Plan))?;
        serde_json::from_str::<StartupAnalysis>(plan.text())?;
        let proposal = transport.generate(&request(TaskKind::Proposal))?;
        serde_json::from_str::<ProposalData>(proposal.text())?;
        Ok(())
    }

    #[test]
    fn chat_echoes_prompt_length() -> anyhow::Result<()> {
        let turn = DryrunTransport.generate(&request(TaskKind::Chat))?;
        assert!(turn.text().contains("(5 caracteres)"));
        Ok(())
    }
}
