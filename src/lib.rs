//! # derma-infer
//!
//! Inference core for a binary skin-lesion image classifier backed by ONNX
//! Runtime. The crate takes raw encoded image bytes (JPEG or PNG), normalizes
//! them into the tensor the model expects, runs the forward pass, and maps
//! the raw score onto a benign/malignant diagnosis with a confidence
//! percentage.
//!
//! The surrounding service (HTTP routing, multipart parsing, health-check
//! endpoints) is out of scope; this crate exposes the four calls that layer
//! needs: load, process, readiness, release.
//!
//! ## Components
//!
//! - **Image Normalizer**: decode, stretch-resize, scale to `[0, 1]`
//! - **ONNX Model**: loaded once, shared read-only, pooled sessions
//! - **Result Interpreter**: raw score to `Diagnosis` + confidence
//! - **Pipeline**: composes the above, owns the model lifecycle
//!
//! ## Modules
//!
//! * [`core`] - Error handling, configuration, and the ONNX model handle
//! * [`domain`] - Diagnosis labels and score interpretation
//! * [`pipeline`] - The request-scoped classification pipeline
//! * [`processors`] - Image decoding and tensor normalization
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use derma_infer::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = ClassifierPipelineBuilder::new()
//!     .model_path("models/skin_lesion.onnx")
//!     .model_name("skin_lesion_classifier")
//!     .build()?;
//!
//! let bytes = std::fs::read("lesion.jpg")?;
//! let result = pipeline.process(&bytes)?;
//! println!("{}: {:.2}%", result.label, result.confidence);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod domain;
pub mod pipeline;
pub mod processors;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use derma_infer::prelude::*;
/// ```
///
/// Included items cover the hosting boundary's needs: the pipeline and its
/// builder, the diagnosis types, and the error/result types. For advanced
/// customization (session tuning, direct normalizer access), import from the
/// respective modules.
pub mod prelude {
    pub use crate::core::{ClassifierConfig, ClassifierError, ClassifierResult};
    pub use crate::domain::{Diagnosis, DiagnosisResult};
    pub use crate::pipeline::{ClassifierPipeline, ClassifierPipelineBuilder};
}
