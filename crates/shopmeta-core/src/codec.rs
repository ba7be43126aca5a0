//! Encoding of typed lists into a single metadata value.
//!
//! Lists are stored as a JSON array serialized into a string. Decoding is
//! lenient about the container (a raw array or a versioned envelope
//! `{"version": 1, "items": [...]}` are accepted too) and strict about items:
//! every element must deserialize into the target type.

use serde_json::Value;
use thiserror::Error;

use crate::models::ListItem;

/// Highest envelope version this build understands.
pub const LIST_SCHEMA_VERSION: u64 = 1;

/// Why a stored list could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("stored value is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("stored value is a JSON {0}, expected an array")]
    NotAList(&'static str),
    #[error("unsupported list schema version {0} (expected {expected})", expected = LIST_SCHEMA_VERSION)]
    UnsupportedVersion(u64),
    #[error("item {index} is invalid: {source}")]
    InvalidItem {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Serialize a list into the metadata value stored under its field.
pub fn encode_list<T: ListItem>(items: &[T]) -> crate::Result<Value> {
    Ok(Value::String(serde_json::to_string(items)?))
}

/// Decode a stored metadata value. Absent or `null` values are an empty list.
pub fn decode_list<T: ListItem>(value: Option<&Value>) -> Result<Vec<T>, DecodeError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    let parsed;
    let value = match value {
        Value::Null => return Ok(Vec::new()),
        Value::String(raw) => {
            parsed = serde_json::from_str::<Value>(raw).map_err(DecodeError::Malformed)?;
            &parsed
        }
        other => other,
    };

    let items = match value {
        Value::Array(items) => items,
        Value::Object(envelope) => unwrap_envelope(envelope)?,
        other => return Err(DecodeError::NotAList(json_type_name(other))),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            T::decode_item(item, index).map_err(|source| DecodeError::InvalidItem { index, source })
        })
        .collect()
}

fn unwrap_envelope(envelope: &serde_json::Map<String, Value>) -> Result<&Vec<Value>, DecodeError> {
    let version = envelope.get("version").and_then(Value::as_u64);
    match version {
        Some(LIST_SCHEMA_VERSION) => {}
        Some(other) => return Err(DecodeError::UnsupportedVersion(other)),
        None => return Err(DecodeError::NotAList("object")),
    }
    match envelope.get("items") {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(DecodeError::NotAList(json_type_name(other))),
        None => Err(DecodeError::NotAList("object")),
    }
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::models::{Note, Quicklink};

    fn sample_notes() -> Vec<Note> {
        let first = Note::new(&[], "first", None, Utc.timestamp_millis_opt(1_000).unwrap());
        let second = Note::new(
            std::slice::from_ref(&first),
            "second",
            Some("ops@shop.test".to_string()),
            Utc.timestamp_millis_opt(2_000).unwrap(),
        );
        vec![first, second]
    }

    #[test]
    fn round_trip_preserves_order_and_fields() {
        let notes = sample_notes();
        let encoded = encode_list(&notes).unwrap();
        assert!(encoded.is_string());
        let decoded: Vec<Note> = decode_list(Some(&encoded)).unwrap();
        assert_eq!(decoded, notes);
    }

    #[test]
    fn absent_and_null_are_empty() {
        assert!(decode_list::<Note>(None).unwrap().is_empty());
        assert!(decode_list::<Note>(Some(&Value::Null)).unwrap().is_empty());
    }

    #[test]
    fn malformed_json_is_rejected() {
        let error = decode_list::<Note>(Some(&json!("not-json"))).unwrap_err();
        assert!(matches!(error, DecodeError::Malformed(_)));
    }

    #[test]
    fn non_array_is_rejected() {
        let error = decode_list::<Note>(Some(&json!("{\"a\":1}"))).unwrap_err();
        assert!(matches!(error, DecodeError::NotAList("object")));

        let error = decode_list::<Note>(Some(&json!(7))).unwrap_err();
        assert!(matches!(error, DecodeError::NotAList("number")));
    }

    #[test]
    fn raw_array_value_is_accepted() {
        let value = json!([{"title": "Docs", "link": "/docs", "type": "custom"}]);
        let links: Vec<Quicklink> = decode_list(Some(&value)).unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].link, "/docs");
    }

    #[test]
    fn versioned_envelope_is_accepted() {
        let raw = json!({"version": 1, "items": [{"title": "A", "link": "/a"}]}).to_string();
        let links: Vec<Quicklink> = decode_list(Some(&Value::String(raw))).unwrap();
        assert_eq!(links[0].title, "A");
    }

    #[test]
    fn unknown_envelope_version_is_rejected() {
        let raw = json!({"version": 2, "items": []}).to_string();
        let error = decode_list::<Quicklink>(Some(&Value::String(raw))).unwrap_err();
        assert!(matches!(error, DecodeError::UnsupportedVersion(2)));
    }

    #[test]
    fn invalid_item_reports_index() {
        let raw = json!([{"title": "A", "link": "/a"}, {"title": 3}]).to_string();
        let error = decode_list::<Quicklink>(Some(&Value::String(raw))).unwrap_err();
        assert!(matches!(error, DecodeError::InvalidItem { index: 1, .. }));
    }
}
