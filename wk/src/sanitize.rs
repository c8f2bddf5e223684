//! Response sanitizer
//!
//! Turns raw model text into a JSON tree: strips markdown fences, slices out
//! the outermost object, repairs trailing garbage once, and removes citation
//! markers like `[3]` or `[12, 7]` from every string. Field-level semantics are
//! not inspected here.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

static CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\[\d+(?:,\s*\d+)*\]\s*").expect("citation regex is valid"));

/// Errors from sanitizing model output
#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("EmptyOrMalformedResponse: no JSON object found in the model output")]
    NoJsonObject,

    #[error("MalformedJSON: {0}")]
    MalformedJson(#[source] serde_json::Error),
}

/// Sanitize raw model text into a JSON tree
pub fn sanitize(raw: &str) -> Result<Value, SanitizeError> {
    debug!(raw_len = raw.len(), "sanitize: called");
    let parsed = extract_json(raw)?;
    Ok(strip_citations(parsed))
}

/// Remove a leading ```lang fence and a trailing ``` fence if present
pub fn strip_code_fences(text: &str) -> &str {
    let mut t = text.trim();
    if let Some(rest) = t.strip_prefix("```") {
        t = match rest.find('\n') {
            Some(i) => &rest[i + 1..],
            None => rest,
        };
    }
    let t = t.trim_end();
    t.strip_suffix("```").unwrap_or(t).trim()
}

/// Slice out the outermost `{ .. }` and parse it, repairing once on failure
pub fn extract_json(raw: &str) -> Result<Value, SanitizeError> {
    let text = strip_code_fences(raw);
    let (start, end) = match (text.find('{'), text.rfind('}')) {
        (Some(s), Some(e)) if e > s => (s, e),
        _ => {
            debug!("extract_json: no object delimiters");
            return Err(SanitizeError::NoJsonObject);
        }
    };
    let candidate = &text[start..=end];

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => Ok(value),
        Err(strict_err) => {
            warn!(error = %strict_err, "extract_json: strict parse failed, attempting repair");
            repair(candidate).map_err(|e| {
                debug!(error = %e, "extract_json: repair failed");
                SanitizeError::MalformedJson(e)
            })
        }
    }
}

/// Single repair attempt
///
/// Raw newlines inside strings are flattened to spaces, then the text is
/// truncated to the end of the first well-formed value.
fn repair(candidate: &str) -> Result<Value, serde_json::Error> {
    let flattened = candidate.replace(['\n', '\r'], " ");
    let mut stream = serde_json::Deserializer::from_str(&flattened).into_iter::<Value>();
    // candidate starts at '{', so the first value is always an object
    match stream.next() {
        Some(Ok(value)) => {
            debug!(consumed = stream.byte_offset(), total = flattened.len(), "repair: recovered object");
            Ok(value)
        }
        Some(Err(e)) => Err(e),
        None => serde_json::from_str::<Value>(&flattened),
    }
}

/// Recursively remove citation markers from every string in the tree
///
/// Strings without markers are returned untouched; strings with markers are
/// trimmed after removal.
pub fn strip_citations(value: Value) -> Value {
    match value {
        Value::String(s) => match strip_citation_text(&s) {
            Cow::Borrowed(_) => Value::String(s),
            Cow::Owned(cleaned) => Value::String(cleaned),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(strip_citations).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, strip_citations(v))).collect()),
        other => other,
    }
}

fn strip_citation_text(s: &str) -> Cow<'_, str> {
    if !CITATION.is_match(s) {
        return Cow::Borrowed(s);
    }
    let replaced = CITATION.replace_all(s, |caps: &Captures| {
        let m = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        let at_edge = m.0 == 0 || m.1 == s.len();
        let before_punct = s[m.1..].starts_with(['.', ',', ';', ':', '!', '?', ')']);
        if at_edge || before_punct { "" } else { " " }
    });
    Cow::Owned(replaced.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_clean_json_parses() {
        let v = sanitize(r#"{"title": "Weekend"}"#).unwrap();
        assert_eq!(v, json!({"title": "Weekend"}));
    }

    #[test]
    fn test_strips_code_fences() {
        let raw = "```json\n{\"title\": \"Weekend\"}\n```";
        assert_eq!(sanitize(raw).unwrap(), json!({"title": "Weekend"}));

        let raw = "```\n{\"a\": 1}```";
        assert_eq!(sanitize(raw).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn test_prose_around_object() {
        let raw = "Here is your plan:\n{\"a\": [1, 2]}\nEnjoy!";
        assert_eq!(sanitize(raw).unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_no_object_is_error() {
        assert!(matches!(sanitize(""), Err(SanitizeError::NoJsonObject)));
        assert!(matches!(sanitize("no json here"), Err(SanitizeError::NoJsonObject)));
        assert!(matches!(sanitize("} backwards {"), Err(SanitizeError::NoJsonObject)));
    }

    #[test]
    fn test_unrecoverable_is_malformed() {
        assert!(matches!(sanitize(r#"{"a": [1, 2}"#), Err(SanitizeError::MalformedJson(_))));
        assert!(matches!(sanitize(r#"{"a": }"#), Err(SanitizeError::MalformedJson(_))));
    }

    #[test]
    fn test_repairs_trailing_brace_garbage() {
        let raw = r#"{"title": "Weekend", "days": [{"d": 1}]} trailing note }"#;
        assert_eq!(sanitize(raw).unwrap(), json!({"title": "Weekend", "days": [{"d": 1}]}));
    }

    #[test]
    fn test_repairs_raw_newlines_in_strings() {
        let raw = "{\"description\": \"line one\nline two\"}";
        assert_eq!(sanitize(raw).unwrap(), json!({"description": "line one line two"}));
    }

    #[test]
    fn test_citation_removal() {
        let v = sanitize(r#"{"title": "Old Fort [12, 7]", "note": "plain"}"#).unwrap();
        assert_eq!(v["title"], "Old Fort");
        assert_eq!(v["note"], "plain");
    }

    #[test]
    fn test_citation_removal_nested_and_midsentence() {
        let v = strip_citations(json!({
            "days": [{"activities": [{"description": "Visit the fort [3] and museum [4, 5]."}]}],
            "count": 3
        }));
        assert_eq!(v["days"][0]["activities"][0]["description"], "Visit the fort and museum.");
        assert_eq!(v["count"], 3);
    }

    #[test]
    fn test_non_numeric_brackets_kept() {
        let v = strip_citations(json!({"t": "Gallery [Modern Art]"}));
        assert_eq!(v["t"], "Gallery [Modern Art]");
    }

    fn plain_string() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z ,.]{0,20}[A-Za-z]"
    }

    fn json_object() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            plain_string().prop_map(Value::String),
            any::<i32>().prop_map(|n| json!(n)),
            any::<bool>().prop_map(Value::Bool),
            Just(Value::Null),
        ];
        let tree = leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,8}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        });
        prop::collection::btree_map("[a-z]{1,8}", tree, 1..5).prop_map(|m| Value::Object(m.into_iter().collect()))
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_identity_on_clean_json(obj in json_object()) {
            let text = serde_json::to_string(&obj).unwrap();
            prop_assert_eq!(sanitize(&text).unwrap(), obj);
        }

        #[test]
        fn prop_trailing_truncated_token_is_recovered(obj in json_object(), tail in "[a-z\" ,:]{0,8}") {
            let text = format!("{}{}", serde_json::to_string_pretty(&obj).unwrap(), tail);
            prop_assert_eq!(sanitize(&text).unwrap(), obj);
        }
    }
}
