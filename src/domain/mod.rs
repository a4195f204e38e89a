//! Domain types for the classification pipeline.
//!
//! * [`diagnosis`] - Diagnosis labels and raw-score interpretation

pub mod diagnosis;

pub use diagnosis::{interpret, Diagnosis, DiagnosisResult};
