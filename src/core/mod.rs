//! The core module of the classification pipeline.
//!
//! This module contains the fundamental components of the pipeline, including:
//! - Configuration management
//! - Error handling
//! - ONNX Runtime model handle and inference
//!
//! It also provides re-exports of commonly used types for convenience.

pub mod config;
pub mod errors;
pub mod model;

pub use config::{ClassifierConfig, ConfigError, OrtGraphOptimizationLevel, OrtSessionConfig};
pub use errors::{ClassifierError, ClassifierResult};
pub use model::OnnxModel;

/// A 4D tensor in NHWC layout, the model's input calling convention.
///
/// The leading axis is the batch dimension; the pipeline always submits a
/// batch of exactly one image.
pub type Tensor4D = ndarray::Array4<f32>;
