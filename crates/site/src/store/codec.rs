//! Firestore typed-value codec.
//!
//! Firestore's REST API wraps every value in a single-key object naming its
//! type (`{"stringValue": "x"}`, `{"integerValue": "42"}`). Integers travel
//! as strings. Documents in the site's collections only use the JSON-shaped
//! subset; reference, bytes and geo-point values decode to their string or
//! object form so foreign documents still load.

use serde_json::{Map, Number, Value, json};

use super::{Fields, StoreError};

/// Encode a field map into Firestore's `fields` object.
#[must_use]
pub fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

/// Encode a single JSON value.
#[must_use]
pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or_default() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => {
            let values: Vec<Value> = values.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

/// Decode Firestore's `fields` object into a plain field map.
///
/// # Errors
///
/// Returns `StoreError::Codec` if any value is not a recognized typed value.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Fields, StoreError> {
    fields
        .iter()
        .map(|(name, value)| {
            decode_value(value)
                .map(|decoded| (name.clone(), decoded))
                .map_err(|err| StoreError::Codec(format!("field `{name}`: {err}")))
        })
        .collect()
}

/// Decode a single typed value.
///
/// # Errors
///
/// Returns `StoreError::Codec` for unknown or malformed typed values.
pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let Value::Object(typed) = value else {
        return Err(StoreError::Codec(format!(
            "expected typed value, got {value}"
        )));
    };
    let Some((kind, inner)) = typed.iter().next() else {
        return Err(StoreError::Codec("empty typed value".to_string()));
    };

    match (kind.as_str(), inner) {
        ("nullValue", _) => Ok(Value::Null),
        ("booleanValue", Value::Bool(b)) => Ok(Value::Bool(*b)),
        ("integerValue", Value::String(s)) => s
            .parse::<i64>()
            .map(Value::from)
            .map_err(|e| StoreError::Codec(format!("integerValue {s:?}: {e}"))),
        ("integerValue" | "doubleValue", Value::Number(n)) => Ok(Value::Number(n.clone())),
        ("doubleValue", Value::String(s)) => {
            // NaN and infinities arrive as strings and have no JSON form.
            Ok(s.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number))
        }
        ("stringValue" | "timestampValue" | "referenceValue" | "bytesValue", Value::String(s)) => {
            Ok(Value::String(s.clone()))
        }
        ("geoPointValue", Value::Object(point)) => Ok(Value::Object(point.clone())),
        ("arrayValue", Value::Object(array)) => match array.get("values") {
            None => Ok(Value::Array(Vec::new())),
            Some(Value::Array(values)) => values
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Some(other) => Err(StoreError::Codec(format!("arrayValue.values: {other}"))),
        },
        ("mapValue", Value::Object(map)) => match map.get("fields") {
            None => Ok(Value::Object(Map::new())),
            Some(Value::Object(fields)) => decode_fields(fields).map(Value::Object),
            Some(other) => Err(StoreError::Codec(format!("mapValue.fields: {other}"))),
        },
        (kind, inner) => Err(StoreError::Codec(format!(
            "unsupported value {kind}: {inner}"
        ))),
    }
}

/// The document id: last segment of a resource name such as
/// `projects/p/databases/(default)/documents/events/abc123`.
#[must_use]
pub fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_encode_as_strings() {
        assert_eq!(
            encode_value(&json!(2024)),
            json!({ "integerValue": "2024" })
        );
        assert_eq!(encode_value(&json!(-3)), json!({ "integerValue": "-3" }));
        assert_eq!(encode_value(&json!(1.5)), json!({ "doubleValue": 1.5 }));
    }

    #[test]
    fn test_nested_map_and_array_survive() {
        let original = json!({
            "name": "Rafi",
            "year": 2024,
            "isFeatured": true,
            "socials": { "linkedin": "https://lnkd/rafi" },
            "tags": ["drama", 3, null]
        });
        let Value::Object(fields) = original.clone() else {
            unreachable!()
        };

        let encoded = encode_fields(&fields);
        assert_eq!(
            encoded["socials"],
            json!({ "mapValue": { "fields": { "linkedin": { "stringValue": "https://lnkd/rafi" } } } })
        );

        let decoded = decode_fields(&encoded).unwrap();
        assert_eq!(Value::Object(decoded), original);
    }

    #[test]
    fn test_decode_foreign_value_kinds() {
        assert_eq!(
            decode_value(&json!({ "timestampValue": "2024-12-25T10:00:00Z" })).unwrap(),
            json!("2024-12-25T10:00:00Z")
        );
        assert_eq!(
            decode_value(&json!({ "geoPointValue": { "latitude": 23.7, "longitude": 90.4 } }))
                .unwrap(),
            json!({ "latitude": 23.7, "longitude": 90.4 })
        );
        assert_eq!(
            decode_value(&json!({ "arrayValue": {} })).unwrap(),
            json!([])
        );
        assert_eq!(decode_value(&json!({ "mapValue": {} })).unwrap(), json!({}));
        assert_eq!(
            decode_value(&json!({ "doubleValue": "NaN" })).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_decode_rejects_unknown_kinds() {
        assert!(decode_value(&json!({ "mysteryValue": 1 })).is_err());
        assert!(decode_value(&json!({ "integerValue": "forty" })).is_err());
        assert!(decode_value(&json!("bare")).is_err());
    }

    #[test]
    fn test_document_id_from_name() {
        assert_eq!(
            document_id("projects/p/databases/(default)/documents/events/abc123"),
            "abc123"
        );
        assert_eq!(document_id("solo"), "solo");
    }
}
