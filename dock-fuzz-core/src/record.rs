//! The serialized envelope of one operation

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One replayable operation as written to a log:
/// `{ "type": int, "params": {..}, "comment": str, "pause": int? }`.
///
/// `params` is opaque here; each operation kind owns its schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    #[serde(rename = "type")]
    pub kind: i64,
    pub params: Map<String, Value>,
    #[serde(default)]
    pub comment: String,
    /// Delay after execution, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause: Option<u64>,
}

/// Why a generic map could not be read as an [`OperationRecord`]
#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    MissingKey(&'static str),
    InvalidType(Value),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::MissingKey(key) => write!(f, "missing key \"{key}\""),
            RecordError::InvalidType(value) => write!(f, "type is not an integer: {value}"),
        }
    }
}

impl std::error::Error for RecordError {}

impl OperationRecord {
    /// Read a record out of a generic map.
    ///
    /// Only `type` and `params` are required. A `params` value that is not an
    /// object reads as an empty map, and a non-integer `pause` is ignored;
    /// callers decide what an empty `params` means.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, RecordError> {
        let kind = map.get("type").ok_or(RecordError::MissingKey("type"))?;
        let params = map.get("params").ok_or(RecordError::MissingKey("params"))?;

        let kind = match kind {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| RecordError::InvalidType(kind.clone()))?;

        let params = params.as_object().cloned().unwrap_or_default();
        let comment = map
            .get("comment")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let pause = map.get("pause").and_then(Value::as_u64);

        Ok(Self {
            kind,
            params,
            comment,
            pause,
        })
    }

    /// Convert into a generic map
    pub fn into_map(self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("type".into(), Value::from(self.kind));
        map.insert("params".into(), Value::Object(self.params));
        map.insert("comment".into(), Value::String(self.comment));
        if let Some(pause) = self.pause {
            map.insert("pause".into(), Value::from(pause));
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_from_map_requires_type_and_params() {
        let err = OperationRecord::from_map(&obj(json!({ "params": {} }))).unwrap_err();
        assert_eq!(err, RecordError::MissingKey("type"));

        let err = OperationRecord::from_map(&obj(json!({ "type": 1 }))).unwrap_err();
        assert_eq!(err, RecordError::MissingKey("params"));
    }

    #[test]
    fn test_from_map_lenient_fields() {
        let record = OperationRecord::from_map(&obj(json!({
            "type": "3",
            "params": "not a map",
            "pause": "soon",
        })))
        .unwrap();

        assert_eq!(record.kind, 3);
        assert!(record.params.is_empty());
        assert_eq!(record.comment, "");
        assert_eq!(record.pause, None);
    }

    #[test]
    fn test_from_map_rejects_non_integer_type() {
        let err = OperationRecord::from_map(&obj(json!({ "type": [1], "params": {} }))).unwrap_err();
        assert!(matches!(err, RecordError::InvalidType(_)));
    }

    #[test]
    fn test_into_map_matches_serde_shape() {
        let record = OperationRecord {
            kind: 1,
            params: obj(json!({ "dockWidgetName": "A" })),
            comment: "Closing A".into(),
            pause: Some(20),
        };

        let via_serde = serde_json::to_value(&record).unwrap();
        let via_map = Value::Object(record.into_map());
        assert_eq!(via_serde, via_map);
        assert_eq!(via_map["type"], json!(1));
        assert_eq!(via_map["pause"], json!(20));
    }
}
