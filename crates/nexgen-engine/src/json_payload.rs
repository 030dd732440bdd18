//! Recovering JSON from model output that may be wrapped in Markdown fences
//! or surrounded by prose.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{truncate_text, GenerationError};

const FENCE: &str = "```";

/// Returns the body of the first fenced block, or the trimmed text when no
/// fence is present. An unterminated fence runs to the end of the text.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find(FENCE) else {
        return trimmed;
    };
    let after_open = &trimmed[open + FENCE.len()..];
    let tag_len = after_open
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_')
        .map(char::len_utf8)
        .sum::<usize>();
    let body = &after_open[tag_len..];
    let body = match body.find(FENCE) {
        Some(close) => &body[..close],
        None => body,
    };
    body.trim()
}

fn first_json_value(text: &str) -> Option<Value> {
    let start = text.find(['{', '['])?;
    let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => Some(value),
        _ => None,
    }
}

/// Extracts the JSON document from raw model output.
///
/// Tries, in order: the fenced body as a whole, the full text as a whole,
/// then the first complete object or array found in either.
pub fn extract_json_payload(text: &str) -> Result<Value, GenerationError> {
    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    let fenced = strip_code_fence(text);
    let whole = text.trim();
    for candidate in [fenced, whole] {
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            if value.is_object() || value.is_array() {
                return Ok(value);
            }
        }
    }
    first_json_value(fenced)
        .or_else(|| first_json_value(whole))
        .ok_or_else(|| GenerationError::MalformedJson {
            detail: format!("no JSON object found in: {}", truncate_text(whole, 160)),
        })
}

pub fn parse_json_payload<T: DeserializeOwned>(text: &str) -> Result<T, GenerationError> {
    let value = extract_json_payload(text)?;
    serde_json::from_value(value).map_err(|err| GenerationError::MalformedJson {
        detail: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{extract_json_payload, parse_json_payload, strip_code_fence};
    use crate::error::{ErrorKind, GenerationError};

    #[test]
    fn fence_variants_yield_the_same_document() -> anyhow::Result<()> {
        let expected = json!({"score": 45, "verdict": "Potencial"});
        let cases = [
            "{\"score\": 45, \"verdict\": \"Potencial\"}",
            "```json\n{\"score\": 45, \"verdict\": \"Potencial\"}\n```",
            "```JSON\n{\"score\": 45, \"verdict\": \"Potencial\"}\n```",
            "```\n{\"score\": 45, \"verdict\": \"Potencial\"}\n```",
            "```json {\"score\": 45, \"verdict\": \"Potencial\"}```",
            "Aqui está a análise:\n```json\n{\"score\": 45, \"verdict\": \"Potencial\"}\n```\nBoa sorte!",
            "Resultado: {\"score\": 45, \"verdict\": \"Potencial\"} (fim da análise {ok})",
            "```json\n{\"score\": 45, \"verdict\": \"Potencial\"}",
        ];
        for case in cases {
            assert_eq!(extract_json_payload(case)?, expected, "case: {case}");
        }
        Ok(())
    }

    #[test]
    fn strips_html_fences() {
        assert_eq!(strip_code_fence("```html\n<section></section>\n```"), "<section></section>");
        assert_eq!(strip_code_fence("  <div>ok</div> "), "<div>ok</div>");
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_extraction() -> anyhow::Result<()> {
        let value = extract_json_payload("Nota: {\"summary\": \"use {chaves} com cuidado\"} fim")?;
        assert_eq!(value["summary"], "use {chaves} com cuidado");
        Ok(())
    }

    #[test]
    fn garbage_is_a_malformed_json_error() {
        let err = extract_json_payload("```json\n{score: }\n```");
        assert_eq!(err.map_err(|err| err.kind()), Err(ErrorKind::MalformedJson));
        assert_eq!(extract_json_payload("   "), Err(GenerationError::EmptyResponse));
    }

    #[test]
    fn schema_mismatch_is_malformed_json() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Shape {
            score: u8,
        }
        let parsed = parse_json_payload::<Shape>("{\"verdict\": \"Aprovado\"}");
        assert_eq!(parsed.map_err(|err| err.kind()).err(), Some(ErrorKind::MalformedJson));
    }
}
