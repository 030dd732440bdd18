use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub type ActivityPayload = Map<String, Value>;

const OMITTED: &str = "<omitted>";

/// Append-only `activity.jsonl` log.
///
/// - every line carries `type`, `session_id` and `ts`
/// - payload keys holding images or passwords are replaced with `<omitted>`
/// - one compact JSON object per line
#[derive(Debug, Clone)]
pub struct ActivityLog {
    inner: Arc<ActivityLogInner>,
}

#[derive(Debug)]
struct ActivityLogInner {
    path: PathBuf,
    session_id: String,
    lock: Mutex<()>,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(ActivityLogInner {
                path: path.into(),
                session_id: session_id.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn emit(&self, event_type: &str, payload: ActivityPayload) -> anyhow::Result<Value> {
        let mut event = Map::new();
        for (key, value) in payload {
            let value = sanitize_value(&key, &value);
            event.insert(key, value);
        }
        event.insert("type".to_string(), Value::String(event_type.to_string()));
        event.insert(
            "session_id".to_string(),
            Value::String(self.inner.session_id.clone()),
        );
        event.insert("ts".to_string(), Value::String(now_utc_iso()));

        if let Some(parent) = self.inner.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(&event)?;
        let _guard = self
            .inner
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("activity log lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;

        Ok(Value::Object(event))
    }

    /// Logging must never take down the operation being logged.
    pub fn record(&self, event_type: &str, payload: ActivityPayload) {
        if let Err(err) = self.emit(event_type, payload) {
            tracing::warn!(event_type, error = %err, "failed to append activity event");
        }
    }
}

fn is_sensitive_key(key: &str) -> bool {
    matches!(
        key.to_ascii_lowercase().as_str(),
        "image" | "images" | "data" | "projectimage" | "project_image" | "password"
    )
}

fn sanitize_value(key: &str, value: &Value) -> Value {
    if is_sensitive_key(key) && !value.is_null() {
        return Value::String(OMITTED.to_string());
    }
    sanitize_payload(value)
}

pub fn sanitize_payload(value: &Value) -> Value {
    match value {
        Value::Array(rows) => Value::Array(rows.iter().map(sanitize_payload).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, row)| (key.clone(), sanitize_value(key, row)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::DateTime;
    use serde_json::json;

    use super::*;

    #[test]
    fn emit_writes_compact_jsonl_line() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("logs").join("activity.jsonl");
        let log = ActivityLog::new(&path, "session-1");

        let mut payload = ActivityPayload::new();
        payload.insert("lead_id".to_string(), Value::String("abc".to_string()));
        let emitted = log.emit("lead_created", payload)?;

        let content = fs::read_to_string(&path)?;
        let line = content.lines().next().unwrap_or("");
        let parsed: Value = serde_json::from_str(line)?;

        assert_eq!(parsed, emitted);
        assert_eq!(parsed["type"], "lead_created");
        assert_eq!(parsed["session_id"], "session-1");
        assert_eq!(parsed["lead_id"], "abc");
        DateTime::parse_from_rfc3339(parsed["ts"].as_str().unwrap_or(""))?;
        Ok(())
    }

    #[test]
    fn payload_cannot_spoof_envelope_fields() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let log = ActivityLog::new(temp.path().join("activity.jsonl"), "session-1");
        let mut payload = ActivityPayload::new();
        payload.insert("type".to_string(), json!("forged"));
        payload.insert("session_id".to_string(), json!("other"));
        let emitted = log.emit("chat_turn", payload)?;
        assert_eq!(emitted["type"], "chat_turn");
        assert_eq!(emitted["session_id"], "session-1");
        Ok(())
    }

    #[test]
    fn images_and_passwords_are_omitted_at_any_depth() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let log = ActivityLog::new(temp.path().join("activity.jsonl"), "session-1");
        let mut payload = ActivityPayload::new();
        payload.insert("image".to_string(), json!("iVBORw0KGgo..."));
        payload.insert(
            "lead".to_string(),
            json!({"projectImage": "abc", "projectData": {"images": ["x"], "title": "T"}}),
        );
        payload.insert("user".to_string(), json!([{"password": "123", "email": "a@b.c"}]));
        payload.insert("data".to_string(), Value::Null);
        let emitted = log.emit("lead_created", payload)?;

        assert_eq!(emitted["image"], OMITTED);
        assert_eq!(emitted["lead"]["projectImage"], OMITTED);
        assert_eq!(emitted["lead"]["projectData"]["images"], OMITTED);
        assert_eq!(emitted["lead"]["projectData"]["title"], "T");
        assert_eq!(emitted["user"][0]["password"], OMITTED);
        assert_eq!(emitted["data"], Value::Null);
        Ok(())
    }

    #[test]
    fn emit_appends_lines() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("activity.jsonl");
        let log = ActivityLog::new(&path, "session-1");

        log.emit("one", ActivityPayload::new())?;
        log.record("two", ActivityPayload::new());

        let content = fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: Value = serde_json::from_str(lines[1])?;
        assert_eq!(second["type"], "two");
        Ok(())
    }
}
