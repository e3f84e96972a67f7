//! Trigger-phrase symptom matcher
//!
//! A stand-in for a real language model: every configured trigger phrase
//! found in an utterance yields one observation. Overlapping hits are kept,
//! so one utterance can produce several records for the same concept.

use crate::config::SymptomRule;
use crate::error::{Error, Result};
use crate::records::Observation;
use regex::{Regex, RegexBuilder};

/// Matcher that turns utterances into observations
pub struct SymptomMatcher {
    rules: Vec<CompiledRule>,
}

struct CompiledRule {
    trigger: String,
    pattern: Regex,
    concept: String,
    relation: String,
}

impl SymptomMatcher {
    /// Create a matcher from an ordered rule list
    pub fn new(rules: Vec<SymptomRule>) -> Result<Self> {
        let compiled_rules = rules
            .into_iter()
            .map(|rule| {
                if rule.trigger.trim().is_empty() {
                    return Err(Error::Config(format!(
                        "Empty trigger phrase for concept '{}'",
                        rule.concept
                    )));
                }

                let pattern = RegexBuilder::new(&regex::escape(&rule.trigger))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        Error::Config(format!(
                            "Invalid trigger phrase '{}': {}",
                            rule.trigger, e
                        ))
                    })?;

                Ok(CompiledRule {
                    trigger: rule.trigger,
                    pattern,
                    concept: rule.concept,
                    relation: rule.relation,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules: compiled_rules,
        })
    }

    /// Parse an utterance into one observation per matching rule, in rule order
    pub fn parse(&self, patient_id: &str, utterance: &str) -> Vec<Observation> {
        self.rules
            .iter()
            .filter(|rule| rule.pattern.is_match(utterance))
            .map(|rule| {
                tracing::debug!(
                    patient_id,
                    trigger = %rule.trigger,
                    concept = %rule.concept,
                    "Symptom trigger matched"
                );
                Observation::new(
                    patient_id,
                    &rule.concept,
                    &rule.relation,
                    format!("Reported: {}", utterance),
                )
            })
            .collect()
    }

    /// Number of configured rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
