//! CDC record wire types
//!
//! Field names are snake_case on the wire; optional fields serialize as
//! `null` so that every record carries the full key set.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Generic key-value view of a record
pub type FieldMap = serde_json::Map<String, serde_json::Value>;

/// Conversion of a record into its flattened key-value form
pub trait Record: Serialize {
    /// Flatten the record into a field map.
    ///
    /// Records are plain structs of strings, numbers and lists, so a
    /// failed conversion yields an empty map rather than an error.
    fn to_fields(&self) -> FieldMap {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => FieldMap::new(),
        }
    }
}

/// One parsed clinical statement about a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub patient_id: String,
    pub concept: String,
    pub relation: String,
    pub value: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub verified: Option<bool>,
    /// Written as RFC 3339; ISO-8601 without an offset is read as UTC
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl Observation {
    /// Create an observation stamped with the current time
    pub fn new(
        patient_id: impl Into<String>,
        concept: impl Into<String>,
        relation: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            concept: concept.into(),
            relation: relation.into(),
            value: value.into(),
            confidence: None,
            verified: None,
            timestamp: Utc::now(),
        }
    }
}

/// A canonical unit of clinical knowledge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Knowledge {
    pub concept: String,
    /// Hierarchical domain, e.g. `@Medicine@Neurology`
    pub domain: String,
    /// Guideline or standard the criteria come from, e.g. `DSM-5`
    pub reference_standard: String,
    pub diagnostic_criteria: Vec<String>,
}

/// An audit-trail entry recording an action taken with a concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub patient_id: String,
    pub concept: String,
    pub action: String,
    pub value: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub verified: Option<bool>,
}

impl Process {
    pub fn new(
        patient_id: impl Into<String>,
        concept: impl Into<String>,
        action: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            concept: concept.into(),
            action: action.into(),
            value: value.into(),
            confidence: None,
            verified: None,
        }
    }

    /// Attach a confidence in `0.0..=1.0`.
    ///
    /// Out-of-range or NaN values are dropped and leave the confidence unset.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = checked_confidence(confidence);
        self
    }

    pub fn verified(mut self) -> Self {
        self.verified = Some(true);
        self
    }
}

/// Institution-authored protocol metadata wrapping a knowledge unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentProtocol {
    pub name: String,
    pub domain: String,
    pub version: String,
    pub update_date: String,
    pub criteria: Vec<String>,
    /// Originating body, reported as provenance on import
    pub source: String,
}

impl TreatmentProtocol {
    /// The knowledge unit this protocol publishes
    pub fn to_knowledge(&self) -> Knowledge {
        Knowledge {
            concept: self.name.clone(),
            domain: self.domain.clone(),
            reference_standard: self.version.clone(),
            diagnostic_criteria: self.criteria.clone(),
        }
    }
}

impl Record for Observation {}
impl Record for Knowledge {}
impl Record for Process {}
impl Record for TreatmentProtocol {}

fn checked_confidence(confidence: f64) -> Option<f64> {
    if (0.0..=1.0).contains(&confidence) {
        Some(confidence)
    } else {
        tracing::warn!(confidence, "Discarding confidence outside 0..=1");
        None
    }
}

/// Accept RFC 3339, or a naive ISO-8601 date-time taken as UTC
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
}

/// Build a coded relation string such as `r-Symptom@Medicine@Neurology`
pub fn relation_code(action: &str, domain: &str) -> String {
    format!("r-{}{}", action, domain)
}
