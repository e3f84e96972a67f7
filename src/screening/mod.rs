//! Screening module — heuristic symptom parsing and severity scoring
//!
//! Trigger-phrase matching turns patient utterances into observations,
//! which the PHQ-9 scorer folds into a severity band with recommendations.

pub mod catalog;
pub mod matcher;
pub mod scorer;

pub use catalog::KnowledgeCatalog;
pub use matcher::SymptomMatcher;
pub use scorer::{assessment_processes, Assessment, ItemScore, Severity, SeverityScorer};
