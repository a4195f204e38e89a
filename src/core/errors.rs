//! Error types for the classification pipeline.
//!
//! This module defines the error taxonomy of the pipeline: client-input
//! faults (undecodable images), internal contract violations (tensor shape
//! mismatches), model lifecycle failures (load errors, calls against an
//! unloaded model), and wrapped errors from the ONNX Runtime and tensor
//! layers. It also provides utility functions for creating these errors
//! with appropriate context.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// A convenience result type used throughout the pipeline.
pub type ClassifierResult<T> = Result<T, ClassifierError>;

/// Enum representing the errors that can occur in the classification pipeline.
///
/// The hosting boundary translates each variant into a user-visible status;
/// [`ClassifierError::kind`] provides a stable code for that mapping so the
/// boundary never needs to inspect internal diagnostic detail.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// The submitted bytes are not a valid or supported image container.
    ///
    /// This is a per-request client-input fault; the pipeline stays healthy.
    #[error("image decode")]
    Decode(#[source] image::ImageError),

    /// The normalizer's output does not match the model's declared input
    /// shape.
    ///
    /// The normalizer guarantees the shape, so this indicates a programming
    /// defect rather than a recoverable per-request condition. It is logged
    /// distinctly from client-input faults.
    #[error("input tensor shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// The shape the model declares.
        expected: Vec<usize>,
        /// The shape that was actually submitted.
        actual: Vec<usize>,
    },

    /// The model is not loaded: either load never succeeded or the handle
    /// was released.
    ///
    /// Recoverable only by a process restart; every `process` call fails
    /// fast with this until then.
    #[error("model is not loaded")]
    ModelUnavailable,

    /// The one-time model load failed (missing or corrupt files,
    /// incompatible format).
    #[error("model load failed for '{path}': {context}")]
    ModelLoad {
        /// The path of the model that failed to load.
        path: PathBuf,
        /// Additional context about the failure.
        context: String,
        /// The underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error occurred during the forward pass.
    #[error("inference failed for model '{model}': {context}")]
    Inference {
        /// The name of the model that failed.
        model: String,
        /// Additional context about the failure.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error from the ONNX Runtime session.
    #[error(transparent)]
    Session(#[from] ort::Error),

    /// Error from tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),

    /// Error from configuration validation.
    #[error(transparent)]
    Config(#[from] crate::core::config::ConfigError),

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),
}

impl ClassifierError {
    /// Creates a ClassifierError for a failed model load.
    ///
    /// # Arguments
    ///
    /// * `path` - The path of the model file.
    /// * `context` - Additional context about the failure.
    /// * `source` - The underlying error, if any.
    ///
    /// # Returns
    ///
    /// A ClassifierError instance.
    pub fn model_load_error(
        path: impl AsRef<Path>,
        context: &str,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
    ) -> Self {
        Self::ModelLoad {
            path: path.as_ref().to_path_buf(),
            context: context.to_string(),
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }

    /// Creates a ClassifierError for a failed inference call.
    ///
    /// # Arguments
    ///
    /// * `model` - The name of the model that failed.
    /// * `context` - Additional context about the failure.
    /// * `source` - The underlying error that caused this error.
    ///
    /// # Returns
    ///
    /// A ClassifierError instance.
    pub fn inference_error(
        model: &str,
        context: &str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model: model.to_string(),
            context: context.to_string(),
            source: Box::new(source),
        }
    }

    /// Creates a ClassifierError for a tensor shape contract violation.
    ///
    /// # Arguments
    ///
    /// * `expected` - The shape the model declares.
    /// * `actual` - The shape that was actually submitted.
    ///
    /// # Returns
    ///
    /// A ClassifierError instance.
    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Returns a stable error code for the hosting boundary.
    ///
    /// The boundary maps these codes onto response statuses without ever
    /// exposing internal diagnostic detail to the end caller.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode_error",
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::ModelUnavailable => "model_unavailable",
            Self::ModelLoad { .. } => "load_error",
            Self::Inference { .. } => "inference_error",
            Self::Session(_) => "session_error",
            Self::Tensor(_) => "tensor_error",
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
        }
    }

    /// Returns true if the error is a per-request client-input fault.
    ///
    /// Client faults leave the pipeline healthy; everything else indicates
    /// a defect or a degraded process.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// Implementation of From<image::ImageError> for ClassifierError.
///
/// This allows image::ImageError to be automatically converted to
/// ClassifierError.
impl From<image::ImageError> for ClassifierError {
    fn from(error: image::ImageError) -> Self {
        Self::Decode(error)
    }
}

/// A simple error type for wrapping plain messages as error sources.
#[derive(Debug)]
pub struct SimpleError {
    message: String,
}

impl SimpleError {
    /// Creates a new SimpleError with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimpleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SimpleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes_are_stable() {
        assert_eq!(ClassifierError::ModelUnavailable.kind(), "model_unavailable");
        assert_eq!(
            ClassifierError::shape_mismatch(&[1, 224, 224, 3], &[1, 128, 128, 3]).kind(),
            "shape_mismatch"
        );
        let load = ClassifierError::model_load_error(
            "missing.onnx",
            "file not found",
            None::<std::io::Error>,
        );
        assert_eq!(load.kind(), "load_error");
    }

    #[test]
    fn decode_is_the_only_client_fault() {
        let decode: ClassifierError = image::ImageError::Unsupported(
            image::error::UnsupportedError::from_format_and_kind(
                image::error::ImageFormatHint::Unknown,
                image::error::UnsupportedErrorKind::GenericFeature("test".to_string()),
            ),
        )
        .into();
        assert!(decode.is_client_fault());
        assert!(!ClassifierError::ModelUnavailable.is_client_fault());
        assert!(!ClassifierError::shape_mismatch(&[1], &[2]).is_client_fault());
    }

    #[test]
    fn shape_mismatch_reports_both_shapes() {
        let err = ClassifierError::shape_mismatch(&[1, 224, 224, 3], &[1, 64, 64, 3]);
        let message = err.to_string();
        assert!(message.contains("[1, 224, 224, 3]"));
        assert!(message.contains("[1, 64, 64, 3]"));
    }
}
