//! Built-in clinical knowledge
//!
//! A small fixed table of canonical knowledge units keyed by concept and
//! reference standard.

use crate::records::Knowledge;

struct CatalogEntry {
    concept: &'static str,
    domain: &'static str,
    reference_standard: &'static str,
    criteria: &'static [&'static str],
}

const ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        concept: "Major Depressive Episode",
        domain: "@Psychology@ClinicalPsychology",
        reference_standard: "DSM-5",
        criteria: &[
            "Depressed mood OR anhedonia (at least one required)",
            "Present most of the day, nearly every day",
            "For at least 2 weeks",
            "Plus 4 additional symptoms from list",
        ],
    },
    CatalogEntry {
        concept: "Migraine without aura",
        domain: "@Medicine@Neurology",
        reference_standard: "ICHD-3",
        criteria: &[
            "At least 5 attacks fulfilling the remaining criteria",
            "Headache attacks lasting 4-72 hours",
            "At least two of: unilateral location, pulsating quality, moderate or severe \
             intensity, aggravation by routine physical activity",
            "At least one of: nausea and/or vomiting, photophobia and phonophobia",
            "Not better accounted for by another ICHD-3 diagnosis",
        ],
    },
];

/// Lookup over the built-in knowledge table
#[derive(Debug, Default, Clone, Copy)]
pub struct KnowledgeCatalog;

impl KnowledgeCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Load a knowledge unit by concept and reference standard
    pub fn load(&self, concept: &str, reference_standard: &str) -> Option<Knowledge> {
        ENTRIES
            .iter()
            .find(|e| e.concept == concept && e.reference_standard == reference_standard)
            .map(|e| Knowledge {
                concept: e.concept.to_string(),
                domain: e.domain.to_string(),
                reference_standard: e.reference_standard.to_string(),
                diagnostic_criteria: e.criteria.iter().map(|c| c.to_string()).collect(),
            })
    }

    /// DSM-5 criteria for a major depressive episode
    pub fn depression(&self) -> Option<Knowledge> {
        self.load("Major Depressive Episode", "DSM-5")
    }

    /// ICHD-3 criteria for migraine without aura
    pub fn migraine(&self) -> Option<Knowledge> {
        self.load("Migraine without aura", "ICHD-3")
    }
}
