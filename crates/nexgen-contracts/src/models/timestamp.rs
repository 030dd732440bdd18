use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

/// ISO-8601 text form used by every persisted record.
pub fn to_iso(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Accepts RFC 3339 and the offset-less ISO forms (`2025-01-02T03:04:05`,
/// `2025-01-02`), which are read as UTC.
pub fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
        return Some(value.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `#[serde(with = "iso")]` adapter so timestamps rehydrate as real instants
/// instead of opaque strings.
pub mod iso {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_iso(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_iso(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid ISO timestamp '{raw}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::{now_utc, parse_iso, to_iso};

    #[test]
    fn iso_text_round_trips_exactly() {
        let now = now_utc();
        assert_eq!(parse_iso(&to_iso(&now)), Some(now));
    }

    #[test]
    fn accepts_millisecond_and_offset_forms() {
        let millis = parse_iso("2025-03-01T10:15:30.250Z").expect("millis");
        let offset = parse_iso("2025-03-01T11:15:30.250+01:00").expect("offset");
        assert_eq!(millis, offset);
        assert!(parse_iso("yesterday").is_none());
    }

    #[test]
    fn offset_less_forms_read_as_utc() {
        let expected = parse_iso("2025-01-02T03:04:05Z").expect("utc");
        assert_eq!(parse_iso("2025-01-02T03:04:05"), Some(expected));
        let midnight = parse_iso("2025-01-02T00:00:00Z").expect("midnight");
        assert_eq!(parse_iso("2025-01-02"), Some(midnight));
    }
}
