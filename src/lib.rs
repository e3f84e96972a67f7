//! CDC Protocol - auditable clinical records
//!
//! The CDC Protocol represents clinical reasoning as three kinds of record:
//! observations about a patient, canonical knowledge with its diagnostic
//! criteria, and processes that form an audit trail of actions taken.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐        ┌──────────────────────────┐
//! │   Institution A          │        │   Institution B          │
//! │  ┌────────────────────┐  │ export │  ┌────────────────────┐  │
//! │  │ local_knowledge    │──┼────────┼─▶│ verify_structure   │  │
//! │  └────────────────────┘  │payload │  └─────────┬──────────┘  │
//! │                          │        │  ┌─────────▼──────────┐  │
//! │                          │        │  │ shared_protocols   │  │
//! │                          │        │  └─────────┬──────────┘  │
//! │                          │        │     apply  ▼ Process[]   │
//! └──────────────────────────┘        └──────────────────────────┘
//!
//!   utterance ─▶ SymptomMatcher ─▶ Observation[] ─▶ SeverityScorer ─▶ Assessment
//! ```
//!
//! ## Modules
//!
//! - [`records`]: Observation, Knowledge, Process and TreatmentProtocol
//! - [`exchange`]: per-institution registries, export/import and protocol application
//! - [`screening`]: trigger-phrase symptom parsing, PHQ-9 scoring, knowledge catalog
//! - [`serialization`]: JSON bundles of record collections
//! - [`scenarios`]: end-to-end walkthroughs
//! - [`config`]: Configuration management

pub mod config;
pub mod error;
pub mod exchange;
pub mod records;
pub mod scenarios;
pub mod screening;
pub mod serialization;

pub use config::CdcConfig;
pub use error::{Error, Result};
