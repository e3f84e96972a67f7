//! Records module — the CDC Protocol record triad
//!
//! Observations capture what was said about a patient, knowledge units
//! capture canonical clinical concepts, and processes form the audit trail
//! of actions taken with those concepts.

pub mod types;

pub use types::{
    relation_code, FieldMap, Knowledge, Observation, Process, Record, TreatmentProtocol,
};
