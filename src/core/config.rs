//! Configuration for the classification pipeline.
//!
//! This module provides the configuration structure consumed by the pipeline
//! builder, including the model location, the input shape the model was
//! trained with, and optional ONNX Runtime session tuning.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error indicating that a model path does not exist.
    #[error("model path does not exist: {path}")]
    ModelPathNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// Error indicating that the session pool size is invalid (must be
    /// greater than 0).
    #[error("session pool size must be greater than 0")]
    InvalidPoolSize,

    /// Error indicating that a configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// A message describing the problem.
        message: String,
    },
}

/// Graph optimization level for the ONNX Runtime session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrtGraphOptimizationLevel {
    /// Disable all graph optimizations.
    DisableAll,
    /// Basic optimizations (constant folding, redundant node elimination).
    Level1,
    /// Extended optimizations (node fusions).
    Level2,
    /// Layout optimizations, the highest level.
    Level3,
}

/// ONNX Runtime session tuning options.
///
/// All fields are optional; unset fields keep the runtime's defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrtSessionConfig {
    /// Number of threads used to parallelize execution within nodes.
    pub intra_threads: Option<usize>,
    /// Number of threads used to parallelize execution across nodes.
    pub inter_threads: Option<usize>,
    /// Whether to execute independent graph nodes in parallel.
    pub parallel_execution: Option<bool>,
    /// Graph optimization level.
    pub optimization_level: Option<OrtGraphOptimizationLevel>,
}

impl OrtSessionConfig {
    /// Creates a new OrtSessionConfig with all options unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of intra-op threads.
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    /// Sets the number of inter-op threads.
    pub fn with_inter_threads(mut self, threads: usize) -> Self {
        self.inter_threads = Some(threads);
        self
    }

    /// Enables or disables parallel execution.
    pub fn with_parallel_execution(mut self, parallel: bool) -> Self {
        self.parallel_execution = Some(parallel);
        self
    }

    /// Sets the graph optimization level.
    pub fn with_optimization_level(mut self, level: OrtGraphOptimizationLevel) -> Self {
        self.optimization_level = Some(level);
        self
    }
}

/// Configuration for the skin-lesion classifier pipeline.
///
/// The defaults mirror the model's training configuration: a 224x224 RGB
/// input. Changing `input_shape` is only meaningful when swapping in a model
/// trained with a different resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Path to the serialized ONNX model.
    pub model_path: PathBuf,
    /// Model name used in logs and error context (optional; defaults to the
    /// file stem of `model_path`).
    pub model_name: Option<String>,
    /// Input shape for the model as (width, height).
    pub input_shape: (u32, u32),
    /// Number of pooled ONNX Runtime sessions for concurrent requests.
    pub session_pool_size: usize,
    /// Optional ONNX Runtime session tuning.
    pub ort_session: Option<OrtSessionConfig>,
}

/// The input resolution the reference model was trained with.
pub(crate) const DEFAULT_INPUT_SHAPE: (u32, u32) = (224, 224);

impl ClassifierConfig {
    /// Creates a new configuration for the given model path with default
    /// settings.
    ///
    /// # Arguments
    ///
    /// * `model_path` - Path to the ONNX model file.
    ///
    /// # Returns
    ///
    /// A new `ClassifierConfig` with default input shape and a single
    /// pooled session.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            model_name: None,
            input_shape: DEFAULT_INPUT_SHAPE,
            session_pool_size: 1,
            ort_session: None,
        }
    }

    /// Resolves the model name, falling back to the file stem of the model
    /// path.
    pub fn resolved_model_name(&self) -> String {
        self.model_name.clone().unwrap_or_else(|| {
            self.model_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown_model")
                .to_string()
        })
    }

    /// Validates the configuration.
    ///
    /// Checks that the model path exists and is a file, that the input
    /// dimensions are non-zero, and that the session pool holds at least
    /// one session.
    ///
    /// # Returns
    ///
    /// Ok if the configuration is valid, or a ConfigError if validation
    /// fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_model_path(&self.model_path)?;

        let (width, height) = self.input_shape;
        if width == 0 || height == 0 {
            return Err(ConfigError::InvalidConfig {
                message: format!("input shape dimensions must be non-zero, got {width}x{height}"),
            });
        }

        if self.session_pool_size == 0 {
            return Err(ConfigError::InvalidPoolSize);
        }

        Ok(())
    }

    /// Validates a model path.
    ///
    /// This method checks that the model path exists and is a file.
    fn validate_model_path(&self, path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ModelPathNotFound {
                path: path.to_path_buf(),
            });
        }

        if !path.is_file() {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "model path must be a file, not a directory: {}",
                    path.display()
                ),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_path_fails_validation() {
        let config = ClassifierConfig::new("does/not/exist.onnx");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ModelPathNotFound { .. })
        ));
    }

    #[test]
    fn zero_pool_size_fails_validation() {
        let mut config = ClassifierConfig::new("does/not/exist.onnx");
        config.session_pool_size = 0;
        // Pool size is checked after the path, so point at a real file.
        config.model_path = PathBuf::from(file!());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPoolSize)
        ));
    }

    #[test]
    fn zero_input_dimension_fails_validation() {
        let mut config = ClassifierConfig::new(file!());
        config.input_shape = (0, 224);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn model_name_falls_back_to_file_stem() {
        let config = ClassifierConfig::new("models/skin_lesion.onnx");
        assert_eq!(config.resolved_model_name(), "skin_lesion");

        let mut named = config.clone();
        named.model_name = Some("melanoma_v2".to_string());
        assert_eq!(named.resolved_model_name(), "melanoma_v2");
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut config = ClassifierConfig::new("models/skin_lesion.onnx");
        config.session_pool_size = 4;
        config.ort_session = Some(
            OrtSessionConfig::new()
                .with_intra_threads(2)
                .with_optimization_level(OrtGraphOptimizationLevel::Level3),
        );

        let json = serde_json::to_string(&config).unwrap();
        let parsed: ClassifierConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.model_path, config.model_path);
        assert_eq!(parsed.input_shape, (224, 224));
        assert_eq!(parsed.session_pool_size, 4);
        assert_eq!(
            parsed.ort_session.as_ref().unwrap().optimization_level,
            Some(OrtGraphOptimizationLevel::Level3)
        );
    }
}
