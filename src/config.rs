//! CDC Protocol configuration management

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main CDC Protocol configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CdcConfig {
    /// Institution identity
    #[serde(default)]
    pub institution: InstitutionConfig,

    /// Protocol exchange configuration
    #[serde(default)]
    pub exchange: ExchangeConfig,

    /// Record serialization configuration
    #[serde(default)]
    pub serialization: SerializationConfig,

    /// Symptom matching and scoring configuration
    #[serde(default)]
    pub screening: ScreeningConfig,
}

impl CdcConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Default config file location (`<config dir>/cdc/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|dir| dir.join("cdc").join("config.toml"))
    }
}

/// Institution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionConfig {
    /// Display name of the local institution
    pub name: String,
}

impl Default for InstitutionConfig {
    fn default() -> Self {
        Self {
            name: "Local Institution".to_string(),
        }
    }
}

/// Protocol exchange configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Format tag stamped on exported payloads
    pub export_format: String,

    /// Provenance recorded when imported metadata has no `source`
    pub unknown_source: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            export_format: "CDC_1.0".to_string(),
            unknown_source: "Unknown".to_string(),
        }
    }
}

/// Record bundle serialization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializationConfig {
    /// Format tag written to and expected in serialized bundles
    pub format: String,
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self {
            format: "CDC_JSON_1.0".to_string(),
        }
    }
}

/// Screening configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningConfig {
    /// Trigger phrases for depression symptoms
    pub depression_rules: Vec<SymptomRule>,

    /// Trigger phrases for headache symptoms
    pub headache_rules: Vec<SymptomRule>,

    /// PHQ-9 item scoring heuristics
    pub scoring: ScoringConfig,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            depression_rules: default_depression_rules(),
            headache_rules: default_headache_rules(),
            scoring: ScoringConfig::default(),
        }
    }
}

/// A trigger phrase mapped to the observation it produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomRule {
    /// Phrase searched for (case-insensitive substring)
    pub trigger: String,

    /// Concept recorded on a match
    pub concept: String,

    /// Coded relation recorded on a match
    pub relation: String,
}

impl SymptomRule {
    pub fn new(trigger: &str, concept: &str, relation: &str) -> Self {
        Self {
            trigger: trigger.to_string(),
            concept: concept.to_string(),
            relation: relation.to_string(),
        }
    }
}

/// PHQ-9 scoring heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Observations whose concept contains this are scored
    pub scored_concept: String,

    /// Frequency language that earns the "nearly every day" score
    pub high_frequency_markers: Vec<String>,

    /// Points for an item matching a high-frequency marker
    pub high_frequency_points: u32,

    /// Points for any other scored item
    pub default_points: u32,

    /// Constant added for symptom categories the parser does not model
    pub unmodeled_offset: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            scored_concept: "Anhedonia".to_string(),
            high_frequency_markers: vec!["every day".to_string(), "anymore".to_string()],
            high_frequency_points: 3,
            default_points: 2,
            unmodeled_offset: 12,
        }
    }
}

const PSYCHOLOGY_SYMPTOM: &str = "r-Symptom@Psychology@ClinicalPsychology";
const NEUROLOGY_SYMPTOM: &str = "r-Symptom@Medicine@Neurology";

/// Default depression trigger phrases
pub fn default_depression_rules() -> Vec<SymptomRule> {
    vec![
        SymptomRule::new("dont want to do things", "Anhedonia", PSYCHOLOGY_SYMPTOM),
        SymptomRule::new("lost interest", "Anhedonia", PSYCHOLOGY_SYMPTOM),
        SymptomRule::new("enjoyed anymore", "Anhedonia", PSYCHOLOGY_SYMPTOM),
        SymptomRule::new("feel hopeless", "Depressed Mood", PSYCHOLOGY_SYMPTOM),
        SymptomRule::new("feel down", "Depressed Mood", PSYCHOLOGY_SYMPTOM),
    ]
}

/// Default headache trigger phrases
pub fn default_headache_rules() -> Vec<SymptomRule> {
    vec![
        SymptomRule::new("headache", "Headache", NEUROLOGY_SYMPTOM),
        SymptomRule::new("throbbing", "Pulsating Pain", NEUROLOGY_SYMPTOM),
        SymptomRule::new("one side", "Unilateral Pain", NEUROLOGY_SYMPTOM),
        SymptomRule::new("nausea", "Nausea", NEUROLOGY_SYMPTOM),
        SymptomRule::new("light hurts", "Photophobia", NEUROLOGY_SYMPTOM),
        SymptomRule::new("sensitive to light", "Photophobia", NEUROLOGY_SYMPTOM),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CdcConfig::default();
        assert_eq!(config.exchange.export_format, "CDC_1.0");
        assert_eq!(config.exchange.unknown_source, "Unknown");
        assert_eq!(config.serialization.format, "CDC_JSON_1.0");
        assert_eq!(config.screening.scoring.unmodeled_offset, 12);
    }

    #[test]
    fn test_depression_rules() {
        let rules = default_depression_rules();
        assert_eq!(rules.len(), 5);
        assert!(rules.iter().any(|r| r.trigger == "lost interest"));
        assert!(rules.iter().all(|r| r.relation == PSYCHOLOGY_SYMPTOM));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CdcConfig::from_toml(
            r#"
            [institution]
            name = "Shanghai Medical Center"
            "#,
        )
        .unwrap();
        assert_eq!(config.institution.name, "Shanghai Medical Center");
        assert_eq!(config.exchange.export_format, "CDC_1.0");
        assert_eq!(config.screening.depression_rules.len(), 5);
    }

    #[test]
    fn test_custom_rules_from_toml() {
        let config = CdcConfig::from_toml(
            r#"
            [screening]
            headache_rules = []

            [[screening.depression_rules]]
            trigger = "no energy"
            concept = "Fatigue"
            relation = "r-Symptom@Psychology@ClinicalPsychology"

            [screening.scoring]
            scored_concept = "Fatigue"
            high_frequency_markers = ["always"]
            high_frequency_points = 3
            default_points = 1
            unmodeled_offset = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.screening.depression_rules.len(), 1);
        assert_eq!(config.screening.depression_rules[0].concept, "Fatigue");
        assert!(config.screening.headache_rules.is_empty());
        assert_eq!(config.screening.scoring.default_points, 1);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[exchange]").unwrap();
        writeln!(file, "export_format = \"CDC_1.1\"").unwrap();
        writeln!(file, "unknown_source = \"Unattributed\"").unwrap();

        let config = CdcConfig::from_file(file.path()).unwrap();
        assert_eq!(config.exchange.export_format, "CDC_1.1");
        assert_eq!(config.exchange.unknown_source, "Unattributed");
    }

    #[test]
    fn test_from_file_missing() {
        let result = CdcConfig::from_file(Path::new("/nonexistent/cdc/config.toml"));
        assert!(matches!(result, Err(crate::Error::Io(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let result = CdcConfig::from_toml("[institution\nname = 1");
        assert!(matches!(result, Err(crate::Error::TomlParse(_))));
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let config = CdcConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = CdcConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.screening.depression_rules, config.screening.depression_rules);
    }
}
