//! WhatsApp deep links for quote requests. Nothing is sent; the caller opens
//! the link.

use nexgen_contracts::models::{ProjectIdea, StartupAnalysis, User};

const WHATSAPP_BASE: &str = "https://wa.me";

/// `https://wa.me/<digits>?text=<url-encoded text>`.
pub fn whatsapp_link(phone: &str, text: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    format!("{WHATSAPP_BASE}/{digits}?text={}", urlencoding::encode(text))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn project_quote_message(client: &User, project: &ProjectIdea, extra_message: Option<&str>) -> String {
    let features = if project.features.is_empty() {
        "N/A".to_string()
    } else {
        project.features.join(", ")
    };
    let mut text = format!(
        "📋 *PEDIDO DE ORÇAMENTO - NEXGEN*\n\n\
         *Cliente:* {name}\n\
         *Email:* {email}\n\
         *Projeto:* {title}\n\
         *Orçamento Est:* {budget}\n\
         *Funcionalidades:* {features}\n\n\
         *Descrição:*\n{description}",
        name = client.name,
        email = client.email,
        title = project.title,
        budget = non_blank(project.budget_range.as_deref()).unwrap_or("A definir"),
        description = project.description,
    );
    if let Some(extra) = non_blank(extra_message) {
        text.push_str("\n\n*Mensagem Adicional:*\n");
        text.push_str(extra);
    }
    if let Some(link) = non_blank(project.drive_link.as_deref()) {
        text.push_str("\n\n*Link Externo:* ");
        text.push_str(link);
    }
    text
}

pub fn startup_quote_message(analysis: &StartupAnalysis) -> String {
    format!(
        "🚀 *PEDIDO DE PROJETO - NEXGEN BUILDER*\n\n\
         Acabei de gerar uma startup na IA e quero um orçamento!\n\n\
         *Projeto:* {name}\n\
         *Slogan:* {slogan}\n\
         *MVP Estimado:* {mvp}\n\n\
         Podemos agendar uma reunião?",
        name = analysis.name,
        slogan = analysis.slogan,
        mvp = analysis.budgets.mvp.range,
    )
}

#[cfg(test)]
mod tests {
    use nexgen_contracts::models::{ProjectIdea, User, UserRole};

    use super::{project_quote_message, whatsapp_link};

    fn client() -> User {
        User {
            id: "client-1".to_string(),
            name: "Ana Costa".to_string(),
            email: "ana@exemplo.pt".to_string(),
            role: UserRole::Client,
            password: None,
            phone: None,
            avatar: None,
        }
    }

    #[test]
    fn link_keeps_only_phone_digits_and_encodes_text() {
        let link = whatsapp_link("+351 925 460 063", "Olá & até já?");
        assert_eq!(link, "https://wa.me/351925460063?text=Ol%C3%A1%20%26%20at%C3%A9%20j%C3%A1%3F");
    }

    #[test]
    fn quote_message_lists_optional_sections_only_when_present() {
        let mut project = ProjectIdea::new("Loja de Vinhos", "E-commerce com clube de assinaturas.");
        let bare = project_quote_message(&client(), &project, Some("   "));
        assert!(bare.contains("*Orçamento Est:* A definir"));
        assert!(bare.contains("*Funcionalidades:* N/A"));
        assert!(!bare.contains("Mensagem Adicional"));
        assert!(!bare.contains("Link Externo"));

        project.features = vec!["Pagamentos".to_string(), "Stock".to_string()];
        project.budget_range = Some("€5k - €10k".to_string());
        project.drive_link = Some("https://drive.example/pasta".to_string());
        let full = project_quote_message(&client(), &project, Some("Urgente"));
        assert!(full.contains("*Cliente:* Ana Costa"));
        assert!(full.contains("*Funcionalidades:* Pagamentos, Stock"));
        assert!(full.contains("*Mensagem Adicional:*\nUrgente"));
        assert!(full.ends_with("*Link Externo:* https://drive.example/pasta"));
    }
}
