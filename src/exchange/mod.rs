//! Exchange module — cross-institution protocol sharing
//!
//! Institutions author treatment protocols locally, export them as
//! interchange payloads, and import payloads from peers after a structural
//! check. Imported protocols can then be applied to patients, producing an
//! audit trail of process records.

pub mod payload;
pub mod registry;

pub use payload::{missing_keys, verify_structure, ExchangePayload, ImportError};
pub use registry::{ImportReceipt, InstitutionRegistry, ProtocolEntry, Provenance};
