use std::time::Duration;

use crate::credentials::{resolve_credential_with, Credential};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ADMIN_PHONE: &str = "351925460063";
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;
pub const MIN_TIMEOUT_SECS: u64 = 15;
pub const MAX_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_CONTINUE_THRESHOLD: u8 = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperatures {
    pub chat: f32,
    pub proposal: f32,
    pub feasibility: f32,
    pub plan: f32,
    pub website: f32,
}

impl Default for Temperatures {
    fn default() -> Self {
        Self {
            chat: 0.7,
            proposal: 0.5,
            feasibility: 0.6,
            plan: 0.7,
            website: 0.7,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub credential: Credential,
    pub api_base: String,
    pub model: String,
    /// Applied to every remote generative call.
    pub request_timeout: Duration,
    pub temperatures: Temperatures,
    /// Spreadsheet web-app URL; `None` skips sheet ingestion.
    pub sheet_endpoint: Option<String>,
    pub admin_phone: String,
    /// Minimum feasibility score needed to continue to the plan phase.
    /// `None` never gates.
    pub continue_threshold: Option<u8>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            credential: Credential::empty(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            temperatures: Temperatures::default(),
            sheet_endpoint: None,
            admin_phone: DEFAULT_ADMIN_PHONE.to_string(),
            continue_threshold: Some(DEFAULT_CONTINUE_THRESHOLD),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(option_env!("VITE_API_KEY"), |name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(build_time_key: Option<&str>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| {
            lookup(name)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let defaults = Self::default();

        let request_timeout = match value("NEXGEN_REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) => timeout_from_secs(secs),
                Err(_) => {
                    tracing::warn!(value = %raw, "ignoring invalid NEXGEN_REQUEST_TIMEOUT_SECS");
                    defaults.request_timeout
                }
            },
            None => defaults.request_timeout,
        };

        let continue_threshold = match value("NEXGEN_CONTINUE_THRESHOLD") {
            Some(raw) => parse_threshold(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "ignoring invalid NEXGEN_CONTINUE_THRESHOLD");
                defaults.continue_threshold
            }),
            None => defaults.continue_threshold,
        };

        Self {
            credential: resolve_credential_with(build_time_key, &lookup),
            api_base: value("GEMINI_API_BASE")
                .map(|raw| raw.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            model: value("NEXGEN_MODEL").unwrap_or(defaults.model),
            request_timeout,
            temperatures: defaults.temperatures,
            sheet_endpoint: value("NEXGEN_SHEET_ENDPOINT"),
            admin_phone: value("NEXGEN_ADMIN_PHONE").unwrap_or(defaults.admin_phone),
            continue_threshold,
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout = timeout_from_secs(secs);
        self
    }
}

pub fn timeout_from_secs(secs: u64) -> Duration {
    Duration::from_secs(secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS))
}

/// `off`/`none` disables gating; otherwise a score between 0 and 100.
fn parse_threshold(raw: &str) -> Option<Option<u8>> {
    match raw.to_ascii_lowercase().as_str() {
        "off" | "none" | "disabled" => Some(None),
        other => other
            .parse::<u8>()
            .ok()
            .filter(|value| *value <= 100)
            .map(Some),
    }
}
