//! Prompt text for every generative call. Kept in one place so wording
//! changes never touch orchestration code.

use nexgen_contracts::models::{ProjectIdea, StartupAnalysis};
use serde_json::{json, Value};

use crate::pipeline::IdeaMode;
use crate::provider::FunctionDeclaration;

pub const CONSULTANT_SYSTEM_INSTRUCTION: &str = r#"Você é um Consultor Sénior da "NexGen Digital", agência de tecnologia.

CAPACIDADES:
1. Pode VER imagens enviadas (designs, esboços, sites ou referências) e dar feedback técnico e criativo.
2. Pode pesquisar na web quando o utilizador pede para analisar um site ou tendências.

DADOS DA EMPRESA:
- Email: comercial.nexgen.iaestudio@gmail.com
- Tel Portugal: +351 925 460 063
- Tel Itália: +39 392 015 2416

ORÇAMENTOS: explique as duas opções.
- Área do Cliente (recomendada): criar conta, registar a ideia com imagens e pedir orçamento formal pelo painel.
- Formulário de Contacto: para dúvidas rápidas.

TOM: profissional, perspicaz, especialista em tecnologia e design."#;

pub const LEAD_CAPTURE_ADDENDUM: &str = "\n\nSe o cliente fornecer nome e contacto e mostrar interesse num projeto, registe-o com a função createLead.";

pub fn create_lead_declaration() -> FunctionDeclaration {
    FunctionDeclaration {
        name: "createLead".to_string(),
        description: "Registra um novo lead (cliente interessado) no sistema quando o usuário fornece nome e contato.".to_string(),
        parameters: json!({
            "type": "OBJECT",
            "properties": {
                "name": {"type": "STRING", "description": "Nome do cliente."},
                "contact": {"type": "STRING", "description": "Email ou telefone do cliente."},
                "interest": {"type": "STRING", "description": "Resumo do interesse ou projeto do cliente."}
            },
            "required": ["name", "contact", "interest"]
        }),
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

pub fn proposal_prompt(project: &ProjectIdea) -> String {
    let budget = project.budget_range.as_deref().unwrap_or("A definir");
    let features = if project.features.is_empty() {
        "Padrão de mercado".to_string()
    } else {
        project.features.join(", ")
    };
    let investment = project
        .budget_range
        .as_deref()
        .unwrap_or("A definir sob análise");
    let shape: Value = json!({
        "title": "Nome comercial impactante para a solução",
        "subtitle": "Slogan curto ou subtítulo técnico",
        "executiveSummary": "Parágrafo de 3-4 frases a vender a visão da solução",
        "scope": [{"title": "Módulo ou fase", "description": "O que será feito"}],
        "techStack": ["Tecnologia"],
        "timeline": [{"phase": "1. Discovery & Design", "duration": "X Semanas", "deliverable": "Wireframes, UI Kit"}],
        "marketingStrategy": "2 frases sobre como alavancar o produto",
        "maintenancePlan": "Suporte pós-lançamento",
        "investmentValue": investment,
        "investmentDetails": "Forma de pagamento sugerida e validade da proposta",
        "whyUs": "Uma frase sobre por que a NexGen Digital é a escolha certa"
    });
    format!(
        "Aja como um Arquiteto de Soluções Sénior de uma agência digital premium.\n\
         TAREFA: gerar uma proposta comercial detalhada em JSON.\n\n\
         DADOS DO PROJETO:\n\
         - Título: {title}\n\
         - Descrição: {description}\n\
         - Orçamento do cliente: {budget}\n\
         - Funcionalidades: {features}\n\n\
         Linguagem corporativa e persuasiva, foco em valor de negócio, prazos realistas.\n\
         Inclua 3 a 4 itens de escopo e 3 fases de cronograma.\n\
         Responda APENAS com JSON nesta estrutura:\n{shape}",
        title = or_default(&project.title, "Projeto Digital Personalizado"),
        description = or_default(&project.description, "Desenvolvimento de solução sob medida"),
    )
}

pub fn feasibility_prompt(input: &str, mode: IdeaMode) -> String {
    let subject = match mode {
        IdeaMode::Idea => "uma IDEIA DE NEGÓCIO",
        IdeaMode::Site => "a URL de um SITE existente; analise a proposta de valor provável desse negócio",
    };
    format!(
        "Aja como um investidor de venture capital experiente e crítico.\n\
         INPUT DO UTILIZADOR: \"{input}\"\n\
         O input é {subject}.\n\
         Avalie o potencial no mercado digital atual com honestidade.\n\
         Se o score for menor que 80, \"pivotAdvice\" é OBRIGATÓRIO, com sugestões concretas para pivotar.\n\
         Responda APENAS com JSON:\n\
         {{\"score\": 0-100, \"verdict\": \"Aprovado\" (score > 70) | \"Potencial\" (> 40) | \"Reprovado\", \
         \"summary\": \"máx. 2 frases\", \"strengths\": [\"...\"], \"weaknesses\": [\"...\"], \"pivotAdvice\": \"...\"}}"
    )
}

pub fn plan_prompt(input: &str, mode: IdeaMode) -> String {
    let shape = json!({
        "name": "Nome moderno e curto",
        "slogan": "One-liner focado em conversão",
        "logoSvg": "<svg viewBox=\"0 0 100 100\">...</svg> minimalista, cores sólidas",
        "colors": ["#principal", "#secundaria", "#acento"],
        "problem": "Dor do utilizador (1-2 frases)",
        "solution": "Como o produto resolve (1-2 frases)",
        "marketSize": "TAM/SAM ou público-alvo",
        "competitors": ["Competidor A"],
        "monetization": "Modelo de receita",
        "marketingStrategy": "Go-to-market resumido",
        "budgets": {
            "mvp": {"range": "€2.500 - €4.000", "description": "Core features", "timeline": "3-4 Semanas"},
            "ideal": {"range": "€8.000 - €15.000", "description": "Produto completo", "timeline": "2-3 Meses"}
        }
    });
    format!(
        "Aja como um CPO e estratega digital sénior.\n\
         INPUT ({mode}): \"{input}\"\n\
         Crie a estrutura estratégica completa de uma startup a partir do input.\n\
         Foco em negócio, estratégia e branding. NÃO gere HTML.\n\
         Responda APENAS com JSON nesta estrutura:\n{shape}",
        mode = mode.as_str(),
    )
}

pub fn website_prompt(analysis: &StartupAnalysis) -> String {
    format!(
        "Aja como um UI designer premiado especializado em SaaS moderno.\n\
         Nome: \"{name}\"\nSlogan: \"{slogan}\"\nCores: {colors}\nProblema: {problem}\nSolução: {solution}\n\n\
         Escreva o HTML de uma landing page de alta conversão com Tailwind CSS via CDN, estética dark premium \
         (bg-slate-950, cartões de vidro, gradientes vibrantes, títulos grandes).\n\
         Secções: header, hero com mockup abstrato, grelha de funcionalidades, como funciona em 3 passos, \
         preços (Starter vs Pro), CTA final e footer.\n\
         Use SVG inline para ícones. Devolva APENAS o conteúdo do <body>, sem <html> nem <head>.",
        name = analysis.name,
        slogan = analysis.slogan,
        colors = analysis.colors.join(", "),
        problem = analysis.problem,
        solution = analysis.solution,
    )
}
