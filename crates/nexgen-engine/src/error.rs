use std::fmt;
use std::time::Duration;

/// Coarse failure class, stable enough to log and branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingCredential,
    InvalidCredential,
    ModelUnavailable,
    ProviderOutage,
    ToolConflict,
    MalformedJson,
    EmptyResponse,
    Timeout,
    Network,
    Cancelled,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidCredential => "invalid_credential",
            Self::ModelUnavailable => "model_unavailable",
            Self::ProviderOutage => "provider_outage",
            Self::ToolConflict => "tool_conflict",
            Self::MalformedJson => "malformed_json",
            Self::EmptyResponse => "empty_response",
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    #[error("no generative API key configured")]
    MissingCredential,
    #[error("API key rejected ({status}): {detail}")]
    InvalidCredential { status: u16, detail: String },
    #[error("model unavailable ({status}): {detail}")]
    ModelUnavailable { status: u16, detail: String },
    #[error("provider unavailable ({status}): {detail}")]
    ProviderOutage { status: u16, detail: String },
    #[error("provider rejected the requested tools: {detail}")]
    ToolConflict { detail: String },
    #[error("response was not the expected JSON: {detail}")]
    MalformedJson { detail: String },
    #[error("provider returned an empty response")]
    EmptyResponse,
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("network failure: {0}")]
    Network(String),
    #[error("request cancelled")]
    Cancelled,
    #[error("provider error{}: {detail}", .status.map(|code| format!(" ({code})")).unwrap_or_default())]
    Unknown { status: Option<u16>, detail: String },
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredential => ErrorKind::MissingCredential,
            Self::InvalidCredential { .. } => ErrorKind::InvalidCredential,
            Self::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            Self::ProviderOutage { .. } => ErrorKind::ProviderOutage,
            Self::ToolConflict { .. } => ErrorKind::ToolConflict,
            Self::MalformedJson { .. } => ErrorKind::MalformedJson,
            Self::EmptyResponse => ErrorKind::EmptyResponse,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Network(_) => ErrorKind::Network,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Message shown to the end user in place of a model reply.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingCredential => "⛔ **Erro de configuração:**\nNenhuma chave de API encontrada. Defina VITE_API_KEY, API_KEY ou GEMINI_API_KEY e reinicie.".to_string(),
            Self::InvalidCredential { .. } => "❌ **Erro de Chave de API (403/400):**\nA chave configurada é inválida ou foi rejeitada pelo Google. Verifique se copiou corretamente.".to_string(),
            Self::ModelUnavailable { .. } => "❌ **Erro de Modelo (404):**\nO modelo configurado não está disponível para esta chave ou região.".to_string(),
            Self::ProviderOutage { .. } => "⚠️ **Erro no Servidor do Google:**\nO Gemini está temporariamente indisponível. Tente novamente em alguns segundos.".to_string(),
            Self::ToolConflict { .. } => "⚠️ **Erro de Configuração:**\nConflito de ferramentas (Search vs Function Calling). Contacte o admin.".to_string(),
            Self::MalformedJson { .. } | Self::EmptyResponse => "⚠️ A IA devolveu uma resposta num formato inesperado. Tente novamente.".to_string(),
            Self::Timeout(limit) => format!("⏱️ A IA demorou mais de {}s a responder. Tente novamente.", limit.as_secs()),
            Self::Network(_) => "⚠️ Falha de ligação ao serviço de IA. Verifique a sua ligação e tente novamente.".to_string(),
            Self::Cancelled => "Pedido cancelado.".to_string(),
            Self::Unknown { detail, .. } => format!("⚠️ **Erro Técnico:**\n{detail}"),
        }
    }

    /// Whether repeating the call without tools could plausibly succeed.
    pub fn allows_toolless_retry(&self) -> bool {
        !matches!(
            self,
            Self::MissingCredential | Self::InvalidCredential { .. } | Self::Cancelled
        )
    }
}

const DETAIL_LIMIT: usize = 512;

/// Maps a non-success HTTP status and body to a failure class.
pub fn classify_status(status: u16, body: &str, tools_requested: bool) -> GenerationError {
    let detail = error_detail(body);
    let mentions_key = body.contains("API key") || body.contains("API_KEY_INVALID");
    match status {
        401 | 403 => GenerationError::InvalidCredential { status, detail },
        400 if mentions_key => GenerationError::InvalidCredential { status, detail },
        400 if tools_requested && body.contains("INVALID_ARGUMENT") => {
            GenerationError::ToolConflict { detail }
        }
        404 => GenerationError::ModelUnavailable { status, detail },
        429 | 500..=599 => GenerationError::ProviderOutage { status, detail },
        _ => GenerationError::Unknown {
            status: Some(status),
            detail,
        },
    }
}

pub fn classify_transport(err: &reqwest::Error, timeout: Duration) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout(timeout)
    } else if err.is_connect() || err.is_request() {
        GenerationError::Network(err.to_string())
    } else {
        GenerationError::Unknown {
            status: err.status().map(|status| status.as_u16()),
            detail: err.to_string(),
        }
    }
}

/// Prefers `error.message` from a provider error envelope over the raw body.
fn error_detail(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        });
    truncate_text(message.as_deref().unwrap_or(body).trim(), DETAIL_LIMIT)
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{classify_status, truncate_text, ErrorKind, GenerationError};

    #[test]
    fn statuses_map_to_distinct_classes() {
        assert_eq!(classify_status(403, "forbidden", false).kind(), ErrorKind::InvalidCredential);
        assert_eq!(
            classify_status(400, r#"{"error":{"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#, true).kind(),
            ErrorKind::InvalidCredential
        );
        assert_eq!(
            classify_status(400, r#"{"error":{"message":"Tool use unsupported","status":"INVALID_ARGUMENT"}}"#, true).kind(),
            ErrorKind::ToolConflict
        );
        assert_eq!(
            classify_status(400, r#"{"error":{"status":"INVALID_ARGUMENT"}}"#, false).kind(),
            ErrorKind::Unknown
        );
        assert_eq!(classify_status(404, "", false).kind(), ErrorKind::ModelUnavailable);
        assert_eq!(classify_status(503, "", false).kind(), ErrorKind::ProviderOutage);
        assert_eq!(classify_status(429, "", false).kind(), ErrorKind::ProviderOutage);
        assert_eq!(classify_status(418, "", false).kind(), ErrorKind::Unknown);
    }

    #[test]
    fn detail_prefers_the_provider_message() {
        let err = classify_status(500, r#"{"error":{"message":"backend overloaded"}}"#, false);
        assert_eq!(
            err,
            GenerationError::ProviderOutage {
                status: 500,
                detail: "backend overloaded".to_string()
            }
        );
    }

    #[test]
    fn timeout_is_its_own_class_with_a_readable_message() {
        let err = GenerationError::Timeout(Duration::from_secs(90));
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.user_message().contains("90s"));
        assert_ne!(err.kind(), ErrorKind::ProviderOutage);
    }

    #[test]
    fn credential_failures_never_retry_without_tools() {
        assert!(!GenerationError::MissingCredential.allows_toolless_retry());
        assert!(!GenerationError::Cancelled.allows_toolless_retry());
        assert!(GenerationError::EmptyResponse.allows_toolless_retry());
        assert!(GenerationError::ToolConflict { detail: String::new() }.allows_toolless_retry());
    }

    #[test]
    fn truncation_marks_cut_text() {
        assert_eq!(truncate_text("abcdef", 3), "abc…");
        assert_eq!(truncate_text("abc", 3), "abc");
    }
}
