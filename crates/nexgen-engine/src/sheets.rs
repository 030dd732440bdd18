//! Fire-and-forget lead export to a spreadsheet web app.

use std::thread::JoinHandle;
use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::EngineConfig;

const SHEET_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRecord {
    pub name: String,
    pub contact: String,
    pub interest: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl SheetRecord {
    pub fn new(name: impl Into<String>, contact: impl Into<String>, interest: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact: contact.into(),
            interest: interest.into(),
            details: Map::new(),
        }
    }

    pub fn detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Outcome of handing a record to the sheet client. The response itself is
/// never read back.
#[derive(Debug)]
pub enum SheetSubmission {
    Skipped,
    Dispatched(JoinHandle<()>),
}

impl SheetSubmission {
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::Dispatched(_))
    }

    /// Blocks until the background POST finished, so a short-lived process
    /// does not exit before the request left.
    pub fn wait(self) {
        if let Self::Dispatched(handle) = self {
            if handle.join().is_err() {
                tracing::warn!("sheet submission thread panicked");
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SheetClient {
    endpoint: Option<String>,
    http: HttpClient,
}

impl SheetClient {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            endpoint: endpoint
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty()),
            http: HttpClient::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.sheet_endpoint.clone())
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// POSTs `record` as JSON on a background thread. Failures are logged,
    /// never returned.
    pub fn submit(&self, record: SheetRecord) -> SheetSubmission {
        let Some(endpoint) = self.endpoint.clone() else {
            tracing::warn!("sheet endpoint not configured; record not exported");
            return SheetSubmission::Skipped;
        };
        let http = self.http.clone();
        let handle = std::thread::spawn(move || {
            let sent = http
                .post(&endpoint)
                .timeout(SHEET_TIMEOUT)
                .json(&record)
                .send();
            match sent {
                Ok(response) => tracing::debug!(status = %response.status(), "sheet record sent"),
                Err(err) => tracing::warn!(error = %err, "failed to send sheet record"),
            }
        });
        SheetSubmission::Dispatched(handle)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{SheetClient, SheetRecord};

    #[test]
    fn record_serializes_flat_with_optional_details() -> anyhow::Result<()> {
        let bare = SheetRecord::new("Ana", "ana@exemplo.pt", "Website");
        assert_eq!(
            serde_json::to_value(&bare)?,
            json!({"name": "Ana", "contact": "ana@exemplo.pt", "interest": "Website"})
        );

        let detailed = bare.detail("budget", "€5k");
        assert_eq!(serde_json::to_value(&detailed)?["details"], json!({"budget": "€5k"}));
        Ok(())
    }

    #[test]
    fn blank_endpoint_skips_submission() {
        let client = SheetClient::new(Some("   ".to_string()));
        assert!(!client.is_configured());
        let submission = client.submit(SheetRecord::new("Ana", "ana@exemplo.pt", "Website"));
        assert!(!submission.is_dispatched());
        submission.wait();
    }

    #[test]
    fn unreachable_endpoint_is_swallowed() {
        let client = SheetClient::new(Some("http://127.0.0.1:9/exec".to_string()));
        let submission = client.submit(SheetRecord::new("Ana", "ana@exemplo.pt", "Website"));
        assert!(submission.is_dispatched());
        submission.wait();
    }
}
