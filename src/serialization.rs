//! JSON serialization of CDC record collections
//!
//! Bundle layout:
//! ```text
//! {
//!   "observations": [ ... ],
//!   "knowledge": [ ... ],
//!   "process": [ ... ],
//!   "serialization_format": "CDC_JSON_1.0",
//!   "timestamp": "<RFC 3339>"
//! }
//! ```
//!
//! Missing collections read back as empty. A bundle carrying a different
//! format tag is refused. One with no tag at all is accepted with a warning:
//! writers before the tag was introduced emit the same layout without it,
//! and each record still has to decode field-for-field.
//!
//! Record timestamps are written as RFC 3339; offset-less ISO-8601
//! timestamps are read as UTC.

use crate::config::SerializationConfig;
use crate::error::{Error, Result};
use crate::records::{Knowledge, Observation, Process};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record collections recovered from a bundle
pub type RecordSet = (Vec<Observation>, Vec<Knowledge>, Vec<Process>);

#[derive(Serialize)]
struct BundleOut<'a> {
    observations: &'a [Observation],
    knowledge: &'a [Knowledge],
    process: &'a [Process],
    serialization_format: &'a str,
    timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
struct BundleIn {
    #[serde(default)]
    serialization_format: Option<String>,
    #[serde(default)]
    observations: Option<serde_json::Value>,
    #[serde(default)]
    knowledge: Option<serde_json::Value>,
    #[serde(default)]
    process: Option<serde_json::Value>,
}

/// Serializer for CDC record bundles
pub struct CdcSerializer {
    format: String,
}

impl CdcSerializer {
    pub fn new(config: &SerializationConfig) -> Self {
        Self {
            format: config.format.clone(),
        }
    }

    /// Format tag written to and expected in bundles
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Serialize record collections as indented JSON
    pub fn to_json(
        &self,
        observations: &[Observation],
        knowledge: &[Knowledge],
        processes: &[Process],
    ) -> Result<String> {
        let bundle = BundleOut {
            observations,
            knowledge,
            process: processes,
            serialization_format: &self.format,
            timestamp: Utc::now(),
        };
        Ok(serde_json::to_string_pretty(&bundle)?)
    }

    /// Deserialize record collections, checking the format tag first
    pub fn from_json(&self, json: &str) -> Result<RecordSet> {
        let bundle: BundleIn = serde_json::from_str(json)?;

        match bundle.serialization_format.as_deref() {
            Some(tag) if tag == self.format => {}
            Some(tag) => {
                return Err(Error::Format {
                    expected: self.format.clone(),
                    found: tag.to_string(),
                })
            }
            None => tracing::warn!(
                expected = %self.format,
                "Bundle has no serialization format tag, reading anyway"
            ),
        }

        let observations = decode_section(bundle.observations)?;
        let knowledge = decode_section(bundle.knowledge)?;
        let processes = decode_section(bundle.process)?;

        tracing::debug!(
            observations = observations.len(),
            knowledge = knowledge.len(),
            processes = processes.len(),
            "Deserialized CDC bundle"
        );
        Ok((observations, knowledge, processes))
    }
}

impl Default for CdcSerializer {
    fn default() -> Self {
        Self::new(&SerializationConfig::default())
    }
}

/// Decode one collection; absent or `null` sections are empty
fn decode_section<T>(section: Option<serde_json::Value>) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
{
    match section {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(value) => Ok(serde_json::from_value(value)?),
    }
}
