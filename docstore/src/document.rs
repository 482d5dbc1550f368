use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{error::StoreError, path::DocPath};

/// Top-level fields of a document, in plain JSON form.
pub type Fields = serde_json::Map<String, Value>;

/// A document read from a [`DocumentStore`](crate::DocumentStore).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocPath,
    pub fields: Fields,
}

impl Document {
    pub fn new(path: DocPath, fields: Fields) -> Self {
        Self { path, fields }
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Deserializes the document fields into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|source| {
            StoreError::Decode {
                path: self.path.to_string(),
                source,
            }
        })
    }

    /// String value of a top-level field, if present and a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Serializes `value` into document fields. `value` must serialize to a JSON object.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(StoreError::Encode(format!(
            "expected an object, got {}",
            kind_of(&other)
        ))),
        Err(e) => Err(StoreError::Encode(e.to_string())),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
