//! Per-institution knowledge registry
//!
//! Each institution owns two maps: protocols it authored (`local`) and
//! protocols it imported from elsewhere (`shared`). Registries never share
//! storage, so two institutions in one process stay fully isolated.

use super::payload::{
    missing_keys, ExchangePayload, ImportError, KNOWLEDGE_KEY, METADATA_KEY,
};
use crate::config::ExchangeConfig;
use crate::records::{relation_code, FieldMap, Knowledge, Process, Record, TreatmentProtocol};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// Confidence recorded on a protocol initiation step
const INITIATION_CONFIDENCE: f64 = 0.95;

/// Where an imported protocol came from
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    pub imported_from: String,
    pub import_date: DateTime<Utc>,
}

/// A stored protocol with its metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolEntry {
    pub knowledge: Knowledge,
    pub metadata: FieldMap,
    /// Set only for imported protocols
    pub provenance: Option<Provenance>,
}

/// Summary of a successful import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReceipt {
    pub concept: String,
    pub imported_from: String,
}

/// Knowledge registry owned by one institution
pub struct InstitutionRegistry {
    name: String,
    config: ExchangeConfig,
    local_knowledge: HashMap<String, ProtocolEntry>,
    shared_protocols: HashMap<String, ProtocolEntry>,
}

impl InstitutionRegistry {
    /// Create an empty registry for the named institution
    pub fn new(name: impl Into<String>, config: ExchangeConfig) -> Self {
        Self {
            name: name.into(),
            config,
            local_knowledge: HashMap::new(),
            shared_protocols: HashMap::new(),
        }
    }

    pub fn institution_name(&self) -> &str {
        &self.name
    }

    // =========================================================================
    // Authoring and export
    // =========================================================================

    /// Author a protocol locally, returning the knowledge it publishes
    pub fn create_protocol(&mut self, protocol: TreatmentProtocol) -> Knowledge {
        let knowledge = protocol.to_knowledge();
        tracing::info!(
            institution = %self.name,
            protocol = %protocol.name,
            criteria = knowledge.diagnostic_criteria.len(),
            "Created treatment protocol"
        );

        self.local_knowledge.insert(
            protocol.name.clone(),
            ProtocolEntry {
                knowledge: knowledge.clone(),
                metadata: protocol.to_fields(),
                provenance: None,
            },
        );
        knowledge
    }

    /// Export a locally authored protocol; `None` if it does not exist
    pub fn export_protocol(&self, protocol_name: &str) -> Option<ExchangePayload> {
        let entry = self.local_knowledge.get(protocol_name)?;
        tracing::info!(institution = %self.name, protocol = protocol_name, "Exported protocol");

        Some(ExchangePayload {
            knowledge: entry.knowledge.clone(),
            metadata: entry.metadata.clone(),
            export_format: self.config.export_format.clone(),
            export_timestamp: Utc::now(),
        })
    }

    // =========================================================================
    // Import
    // =========================================================================

    /// Import a protocol payload from another institution.
    ///
    /// The payload is validated before anything is stored. On any error the
    /// registry is left untouched. Importing a concept that is already
    /// shared replaces the earlier entry.
    pub fn import_protocol(&mut self, payload: &Value) -> Result<ImportReceipt, ImportError> {
        let missing = missing_keys(payload);
        if !missing.is_empty() {
            let err = ImportError::Malformed { missing };
            tracing::warn!(institution = %self.name, "Rejected protocol import: {}", err);
            return Err(err);
        }

        let (knowledge, metadata) = reconstruct(payload).map_err(|err| {
            tracing::warn!(institution = %self.name, "Failed to import protocol: {}", err);
            err
        })?;

        let imported_from = metadata
            .get("source")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.config.unknown_source.clone());

        let concept = knowledge.concept.clone();
        self.shared_protocols.insert(
            concept.clone(),
            ProtocolEntry {
                knowledge,
                metadata,
                provenance: Some(Provenance {
                    imported_from: imported_from.clone(),
                    import_date: Utc::now(),
                }),
            },
        );

        tracing::info!(
            institution = %self.name,
            protocol = %concept,
            source = %imported_from,
            "Successfully imported protocol"
        );

        Ok(ImportReceipt {
            concept,
            imported_from,
        })
    }

    /// Import a payload, reporting only whether it was accepted
    pub fn import_succeeded(&mut self, payload: &Value) -> bool {
        self.import_protocol(payload).is_ok()
    }

    // =========================================================================
    // Application
    // =========================================================================

    /// Apply a shared protocol to a patient.
    ///
    /// Produces an initiation step followed by one criterion check per
    /// diagnostic criterion, in criteria order. Unknown protocols yield an
    /// empty trail.
    pub fn apply_protocol(&self, patient_id: &str, protocol_name: &str) -> Vec<Process> {
        let Some(entry) = self.shared_protocols.get(protocol_name) else {
            tracing::info!(
                institution = %self.name,
                protocol = protocol_name,
                "Protocol not found"
            );
            return Vec::new();
        };

        let domain = &entry.knowledge.domain;
        let mut processes = Vec::with_capacity(entry.knowledge.diagnostic_criteria.len() + 1);

        processes.push(
            Process::new(
                patient_id,
                protocol_name,
                relation_code("TreatmentInitiation", domain),
                format!("Applied protocol {}", protocol_name),
            )
            .with_confidence(INITIATION_CONFIDENCE)
            .verified(),
        );

        for (i, criterion) in entry.knowledge.diagnostic_criteria.iter().enumerate() {
            processes.push(
                Process::new(
                    patient_id,
                    protocol_name,
                    relation_code("CriterionCheck", domain),
                    format!("Criterion {}: {}", i + 1, criterion),
                )
                .verified(),
            );
        }

        tracing::info!(
            institution = %self.name,
            protocol = protocol_name,
            patient_id,
            steps = processes.len(),
            "Applied protocol"
        );
        processes
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn local_protocol(&self, name: &str) -> Option<&ProtocolEntry> {
        self.local_knowledge.get(name)
    }

    pub fn shared_protocol(&self, name: &str) -> Option<&ProtocolEntry> {
        self.shared_protocols.get(name)
    }

    /// Names of imported protocols, sorted
    pub fn shared_protocol_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.shared_protocols.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Rebuild knowledge and metadata from a structurally valid payload
fn reconstruct(payload: &Value) -> Result<(Knowledge, FieldMap), ImportError> {
    let knowledge_block = payload
        .get(KNOWLEDGE_KEY)
        .ok_or_else(|| ImportError::Reconstruction("missing knowledge block".to_string()))?;
    let knowledge: Knowledge = serde_json::from_value(knowledge_block.clone())
        .map_err(|e| ImportError::Reconstruction(e.to_string()))?;

    let metadata = match payload.get(METADATA_KEY) {
        Some(Value::Object(map)) => map.clone(),
        Some(other) => {
            return Err(ImportError::Reconstruction(format!(
                "metadata must be an object, got {}",
                json_type(other)
            )))
        }
        None => FieldMap::new(),
    };

    Ok((knowledge, metadata))
}

fn json_type(value: &Value) -> &'static str {
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
    use super::*;
    use serde_json::json;

    const COVID: &str = "COVID-19 Treatment Protocol v2.3";

    fn covid_protocol() -> TreatmentProtocol {
        TreatmentProtocol {
            name: COVID.to_string(),
            domain: "@Medicine@InfectiousDiseases".to_string(),
            version: "2.3".to_string(),
            update_date: "2024-10-15".to_string(),
            criteria: vec![
                "New antiviral shows 40% better outcomes".to_string(),
                "Recommended for high-risk patients >65 years".to_string(),
                "5-day course with monitoring".to_string(),
            ],
            source: "Harvard Medical School Clinical Trial #12345".to_string(),
        }
    }

    fn registry(name: &str) -> InstitutionRegistry {
        InstitutionRegistry::new(name, ExchangeConfig::default())
    }

    fn boston_with_covid() -> InstitutionRegistry {
        let mut boston = registry("Boston General Hospital");
        boston.create_protocol(covid_protocol());
        boston
    }

    #[test]
    fn test_create_protocol() {
        let boston = boston_with_covid();
        let entry = boston.local_protocol(COVID).unwrap();
        assert_eq!(entry.knowledge.reference_standard, "2.3");
        assert_eq!(entry.metadata.get("update_date"), Some(&json!("2024-10-15")));
        assert!(entry.provenance.is_none());
        assert!(boston.shared_protocol(COVID).is_none());
    }

    #[test]
    fn test_export_payload() {
        let boston = boston_with_covid();
        let payload = boston.export_protocol(COVID).unwrap();
        assert_eq!(payload.export_format, "CDC_1.0");
        assert_eq!(payload.knowledge, covid_protocol().to_knowledge());
        assert_eq!(payload.metadata, covid_protocol().to_fields());
    }

    #[test]
    fn test_export_unknown_protocol() {
        let boston = boston_with_covid();
        assert!(boston.export_protocol("Sepsis Bundle v1").is_none());
    }

    #[test]
    fn test_import_roundtrip_preserves_knowledge() {
        let boston = boston_with_covid();
        let mut shanghai = registry("Shanghai Medical Center");

        let payload = boston.export_protocol(COVID).unwrap().to_value();
        let receipt = shanghai.import_protocol(&payload).unwrap();

        assert_eq!(receipt.concept, COVID);
        assert_eq!(receipt.imported_from, "Harvard Medical School Clinical Trial #12345");

        let entry = shanghai.shared_protocol(COVID).unwrap();
        assert_eq!(entry.knowledge, boston.local_protocol(COVID).unwrap().knowledge);
        let provenance = entry.provenance.as_ref().unwrap();
        assert_eq!(provenance.imported_from, "Harvard Medical School Clinical Trial #12345");
    }

    #[test]
    fn test_end_to_end_apply() {
        let boston = boston_with_covid();
        let mut shanghai = registry("Shanghai Medical Center");
        let payload = boston.export_protocol(COVID).unwrap().to_value();
        assert!(shanghai.import_succeeded(&payload));

        let processes = shanghai.apply_protocol("P002", COVID);
        assert_eq!(processes.len(), 4);

        assert_eq!(processes[0].action, "r-TreatmentInitiation@Medicine@InfectiousDiseases");
        assert_eq!(processes[0].value, format!("Applied protocol {}", COVID));
        assert_eq!(processes[0].confidence, Some(0.95));
        assert_eq!(processes[0].verified, Some(true));

        let values: Vec<&str> = processes[1..].iter().map(|p| p.value.as_str()).collect();
        assert_eq!(
            values,
            vec![
                "Criterion 1: New antiviral shows 40% better outcomes",
                "Criterion 2: Recommended for high-risk patients >65 years",
                "Criterion 3: 5-day course with monitoring",
            ]
        );
        for process in &processes[1..] {
            assert_eq!(process.action, "r-CriterionCheck@Medicine@InfectiousDiseases");
            assert_eq!(process.patient_id, "P002");
            assert_eq!(process.concept, COVID);
            assert!(process.confidence.is_none());
            assert_eq!(process.verified, Some(true));
        }
    }

    #[test]
    fn test_apply_unknown_protocol() {
        let shanghai = registry("Shanghai Medical Center");
        assert!(shanghai.apply_protocol("P002", COVID).is_empty());
    }

    #[test]
    fn test_apply_requires_import() {
        let boston = boston_with_covid();
        assert!(boston.apply_protocol("P001", COVID).is_empty());
    }

    #[test]
    fn test_import_missing_key_leaves_registry_untouched() {
        let boston = boston_with_covid();
        let mut shanghai = registry("Shanghai Medical Center");
        let mut payload = boston.export_protocol(COVID).unwrap().to_value();
        payload.as_object_mut().unwrap().remove("export_format");

        let err = shanghai.import_protocol(&payload).unwrap_err();
        assert_eq!(
            err,
            ImportError::Malformed {
                missing: vec!["export_format".to_string()]
            }
        );
        assert!(shanghai.shared_protocol_names().is_empty());
    }

    #[test]
    fn test_import_bad_types_is_reconstruction_error() {
        let mut shanghai = registry("Shanghai Medical Center");
        let payload = json!({
            "knowledge": {
                "concept": "Sepsis Bundle",
                "domain": "@Medicine@CriticalCare",
                "reference_standard": "SSC 2021",
                "diagnostic_criteria": "lactate > 2"
            },
            "metadata": {},
            "export_format": "CDC_1.0"
        });

        let err = shanghai.import_protocol(&payload).unwrap_err();
        assert!(matches!(err, ImportError::Reconstruction(_)));
        assert!(!shanghai.import_succeeded(&payload));
        assert!(shanghai.shared_protocol("Sepsis Bundle").is_none());
    }

    #[test]
    fn test_import_non_object_metadata() {
        let mut shanghai = registry("Shanghai Medical Center");
        let mut payload = boston_with_covid().export_protocol(COVID).unwrap().to_value();
        payload["metadata"] = json!("Harvard");
        assert!(matches!(
            shanghai.import_protocol(&payload),
            Err(ImportError::Reconstruction(_))
        ));
    }

    #[test]
    fn test_import_without_source_uses_sentinel() {
        let mut shanghai = registry("Shanghai Medical Center");
        let payload = json!({
            "knowledge": {
                "concept": "Stroke Pathway",
                "domain": "@Medicine@Neurology",
                "reference_standard": "AHA 2019",
                "diagnostic_criteria": []
            },
            "metadata": { "version": "2019" },
            "export_format": "CDC_1.0"
        });

        let receipt = shanghai.import_protocol(&payload).unwrap();
        assert_eq!(receipt.imported_from, "Unknown");

        let processes = shanghai.apply_protocol("P010", "Stroke Pathway");
        assert_eq!(processes.len(), 1);
        assert_eq!(processes[0].action, "r-TreatmentInitiation@Medicine@Neurology");
    }

    #[test]
    fn test_reimport_replaces_entry() {
        let mut boston = boston_with_covid();
        let mut shanghai = registry("Shanghai Medical Center");
        shanghai
            .import_protocol(&boston.export_protocol(COVID).unwrap().to_value())
            .unwrap();

        let mut revised = covid_protocol();
        revised.criteria.truncate(1);
        boston.create_protocol(revised);
        shanghai
            .import_protocol(&boston.export_protocol(COVID).unwrap().to_value())
            .unwrap();

        assert_eq!(shanghai.shared_protocol_names(), vec![COVID]);
        assert_eq!(shanghai.apply_protocol("P002", COVID).len(), 2);
    }

    #[test]
    fn test_registries_are_isolated() {
        let boston = boston_with_covid();
        let mut shanghai = registry("Shanghai Medical Center");
        let lyon = registry("Hospices Civils de Lyon");

        shanghai
            .import_protocol(&boston.export_protocol(COVID).unwrap().to_value())
            .unwrap();

        assert!(lyon.shared_protocol(COVID).is_none());
        assert!(lyon.local_protocol(COVID).is_none());
        assert!(boston.shared_protocol(COVID).is_none());
        assert!(shanghai.local_protocol(COVID).is_none());
        assert_eq!(shanghai.institution_name(), "Shanghai Medical Center");
    }
}
