//! ontolearn-common: Shared types and errors used across all Ontolearn crates.

pub mod error;
pub mod concept;

// Re-export commonly used types
pub use concept::{concept_id, ConceptKind};
pub use error::{OntologyError, Result};
