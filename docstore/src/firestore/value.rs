//! Conversion between plain JSON and Firestore's typed `Value` representation.
//!
//! Firestore's REST API wraps every value in a single-key object naming its type, e.g.
//! `{"stringValue": "CS"}` or `{"integerValue": "3"}` (64-bit integers travel as strings).
//! Timestamps, references and bytes decode to strings; geo points decode to
//! `{"latitude", "longitude"}` objects.

use serde_json::{json, Map, Number, Value};

use crate::{document::Fields, error::StoreError};

/// Encodes document fields into a Firestore `fields` map.
pub fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

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
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Decodes a Firestore `fields` map into plain document fields.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Fields, StoreError> {
    fields
        .iter()
        .map(|(name, value)| -> Result<(String, Value), StoreError> {
            Ok((name.clone(), decode_value(value)?))
        })
        .collect()
}

pub fn decode_value(value: &Value) -> Result<Value, StoreError> {
    let typed = value
        .as_object()
        .and_then(|map| map.iter().next())
        .map(|(name, typed)| (name.as_str(), typed))
        .ok_or_else(|| unexpected(value))?;

    match typed {
        ("nullValue", _) => Ok(Value::Null),
        ("booleanValue", Value::Bool(b)) => Ok(Value::Bool(*b)),
        ("integerValue", Value::String(s)) => s
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| unexpected(value)),
        ("integerValue", Value::Number(n)) => Ok(Value::Number(n.clone())),
        ("doubleValue", Value::Number(n)) => Ok(Value::Number(n.clone())),
        // NaN and the infinities arrive as strings and have no JSON number form.
        ("doubleValue", Value::String(s)) => Ok(s
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        ("stringValue", Value::String(s))
        | ("timestampValue", Value::String(s))
        | ("referenceValue", Value::String(s))
        | ("bytesValue", Value::String(s)) => Ok(Value::String(s.clone())),
        ("geoPointValue", Value::Object(point)) => Ok(json!({
            "latitude": point.get("latitude").cloned().unwrap_or(json!(0.0)),
            "longitude": point.get("longitude").cloned().unwrap_or(json!(0.0)),
        })),
        ("arrayValue", Value::Object(array)) => {
            let values = match array.get("values") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(decode_value)
                    .collect::<Result<Vec<_>, _>>()?,
                _ => Vec::new(),
            };
            Ok(Value::Array(values))
        }
        ("mapValue", Value::Object(map)) => match map.get("fields") {
            Some(Value::Object(fields)) => Ok(Value::Object(decode_fields(fields)?)),
            _ => Ok(Value::Object(Map::new())),
        },
        _ => Err(unexpected(value)),
    }
}

fn unexpected(value: &Value) -> StoreError {
    StoreError::UnexpectedResponse(format!("unrecognised Firestore value {value}"))
}
