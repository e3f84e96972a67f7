//! Interchange payload and structural validation
//!
//! Payload layout:
//! ```text
//! {
//!   "knowledge": { "concept", "domain", "reference_standard", "diagnostic_criteria" },
//!   "metadata": { ...flattened protocol fields... },
//!   "export_format": "CDC_1.0",
//!   "export_timestamp": "<RFC 3339>"
//! }
//! ```
//!
//! Validation is a shallow key-presence check. Field types are only
//! examined when the knowledge block is reconstructed on import.

use crate::records::{FieldMap, Knowledge, Record};
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

pub const KNOWLEDGE_KEY: &str = "knowledge";
pub const METADATA_KEY: &str = "metadata";
pub const FORMAT_KEY: &str = "export_format";
pub const TIMESTAMP_KEY: &str = "export_timestamp";

/// Top-level keys every payload must carry
pub const REQUIRED_KEYS: [&str; 3] = [KNOWLEDGE_KEY, METADATA_KEY, FORMAT_KEY];

/// Keys the knowledge block must carry
pub const REQUIRED_KNOWLEDGE_KEYS: [&str; 4] =
    ["concept", "domain", "reference_standard", "diagnostic_criteria"];

/// A protocol as produced by export
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangePayload {
    pub knowledge: Knowledge,
    pub metadata: FieldMap,
    pub export_format: String,
    pub export_timestamp: DateTime<Utc>,
}

impl ExchangePayload {
    /// Untyped form, as it would travel between institutions
    pub fn to_value(&self) -> Value {
        let mut map = FieldMap::new();
        map.insert(
            KNOWLEDGE_KEY.to_string(),
            Value::Object(self.knowledge.to_fields()),
        );
        map.insert(METADATA_KEY.to_string(), Value::Object(self.metadata.clone()));
        map.insert(
            FORMAT_KEY.to_string(),
            Value::String(self.export_format.clone()),
        );
        map.insert(
            TIMESTAMP_KEY.to_string(),
            Value::String(self.export_timestamp.to_rfc3339()),
        );
        Value::Object(map)
    }
}

impl From<ExchangePayload> for Value {
    fn from(payload: ExchangePayload) -> Self {
        payload.to_value()
    }
}

/// Why an import was refused
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImportError {
    /// Required keys are absent
    #[error("Malformed payload: missing {}", .missing.join(", "))]
    Malformed { missing: Vec<String> },

    /// Keys are present but the knowledge could not be rebuilt from them
    #[error("Failed to reconstruct protocol: {0}")]
    Reconstruction(String),
}

/// List the required keys absent from a payload.
///
/// Nested knowledge keys are reported as `knowledge.<key>`. A payload that
/// is not an object is missing everything.
pub fn missing_keys(payload: &Value) -> Vec<String> {
    let Some(top) = payload.as_object() else {
        return REQUIRED_KEYS.iter().map(|k| k.to_string()).collect();
    };

    let mut missing: Vec<String> = REQUIRED_KEYS
        .iter()
        .filter(|key| !top.contains_key(**key))
        .map(|key| key.to_string())
        .collect();

    if let Some(knowledge) = top.get(KNOWLEDGE_KEY) {
        let block = knowledge.as_object();
        missing.extend(
            REQUIRED_KNOWLEDGE_KEYS
                .iter()
                .filter(|key| !block.map(|b| b.contains_key(**key)).unwrap_or(false))
                .map(|key| format!("{}.{}", KNOWLEDGE_KEY, key)),
        );
    }

    missing
}

/// Check that a payload has the shape required for import
pub fn verify_structure(payload: &Value) -> bool {
    missing_keys(payload).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> Value {
        json!({
            "knowledge": {
                "concept": "COVID-19 Treatment Protocol v2.3",
                "domain": "@Medicine@InfectiousDiseases",
                "reference_standard": "2.3",
                "diagnostic_criteria": ["5-day course with monitoring"]
            },
            "metadata": { "source": "Harvard Medical School Clinical Trial #12345" },
            "export_format": "CDC_1.0",
            "export_timestamp": "2024-10-15T09:30:00+00:00"
        })
    }

    #[test]
    fn test_valid_payload() {
        assert!(verify_structure(&valid_payload()));
        assert!(missing_keys(&valid_payload()).is_empty());
    }

    #[test]
    fn test_each_missing_top_level_key() {
        for key in REQUIRED_KEYS {
            let mut payload = valid_payload();
            payload.as_object_mut().unwrap().remove(key);
            assert!(!verify_structure(&payload), "payload without '{}' accepted", key);
            assert!(missing_keys(&payload).contains(&key.to_string()));
        }
    }

    #[test]
    fn test_each_missing_knowledge_key() {
        for key in REQUIRED_KNOWLEDGE_KEYS {
            let mut payload = valid_payload();
            payload["knowledge"].as_object_mut().unwrap().remove(key);
            assert!(!verify_structure(&payload), "knowledge without '{}' accepted", key);
            assert_eq!(missing_keys(&payload), vec![format!("knowledge.{}", key)]);
        }
    }

    #[test]
    fn test_timestamp_not_required() {
        let mut payload = valid_payload();
        payload.as_object_mut().unwrap().remove("export_timestamp");
        assert!(verify_structure(&payload));
    }

    #[test]
    fn test_non_object_payload() {
        assert!(!verify_structure(&Value::Null));
        assert!(!verify_structure(&json!(["knowledge", "metadata"])));
        assert_eq!(missing_keys(&json!("CDC_1.0")).len(), 3);
    }

    #[test]
    fn test_non_object_knowledge_block() {
        let mut payload = valid_payload();
        payload["knowledge"] = json!("COVID-19");
        assert!(!verify_structure(&payload));
        assert_eq!(missing_keys(&payload).len(), 4);
    }

    #[test]
    fn test_shallow_check_ignores_types() {
        let mut payload = valid_payload();
        payload["knowledge"]["diagnostic_criteria"] = json!(42);
        payload["metadata"] = Value::Null;
        assert!(verify_structure(&payload));
    }

    #[test]
    fn test_to_value_shape() {
        let payload = ExchangePayload {
            knowledge: Knowledge {
                concept: "Migraine without aura".to_string(),
                domain: "@Medicine@Neurology".to_string(),
                reference_standard: "ICHD-3".to_string(),
                diagnostic_criteria: vec!["Headache attacks lasting 4-72 hours".to_string()],
            },
            metadata: FieldMap::new(),
            export_format: "CDC_1.0".to_string(),
            export_timestamp: Utc::now(),
        };
        let value: Value = payload.into();
        assert!(verify_structure(&value));
        assert_eq!(value["export_format"], "CDC_1.0");
        assert!(value["export_timestamp"].is_string());
    }

    #[test]
    fn test_import_error_display() {
        let err = ImportError::Malformed {
            missing: vec!["metadata".to_string(), "knowledge.domain".to_string()],
        };
        assert_eq!(err.to_string(), "Malformed payload: missing metadata, knowledge.domain");
    }
}
