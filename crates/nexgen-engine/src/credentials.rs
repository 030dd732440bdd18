use std::fmt;

/// Environment variables consulted at runtime, in priority order.
pub const RUNTIME_KEY_VARIABLES: [&str; 3] = ["VITE_API_KEY", "API_KEY", "GEMINI_API_KEY"];

/// Generative API key. An empty credential is a valid value that every
/// remote call short-circuits on.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Credential(<empty>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

/// Resolves the key from a compile-time value first, then each runtime
/// variable in order. Blank values are skipped.
pub fn resolve_credential_with<F>(build_time: Option<&str>, lookup: F) -> Credential
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = build_time.map(str::trim).filter(|value| !value.is_empty()) {
        return Credential::new(value);
    }
    RUNTIME_KEY_VARIABLES
        .iter()
        .filter_map(|name| lookup(name))
        .map(Credential::new)
        .find(|credential| !credential.is_empty())
        .unwrap_or_default()
}

pub fn resolve_credential() -> Credential {
    resolve_credential_with(option_env!("VITE_API_KEY"), |name| std::env::var(name).ok())
}
