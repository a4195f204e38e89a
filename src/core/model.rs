//! ONNX Runtime model handle for the classification pipeline.
//!
//! This module owns the loaded inference graph: a pool of ONNX Runtime
//! sessions created once from the serialized model file and shared read-only
//! for the lifetime of the process. It exposes a single blocking forward
//! call that takes the normalized input tensor and returns the model's
//! scalar output.

use crate::core::config::{ClassifierConfig, OrtGraphOptimizationLevel, OrtSessionConfig};
use crate::core::errors::{ClassifierError, SimpleError};
use crate::core::Tensor4D;
use ort::{
    session::{builder::SessionBuilder, Session},
    value::TensorRef,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Input tensor names probed when the model does not use the conventional
/// default.
const COMMON_INPUT_NAMES: [&str; 5] = ["x", "input", "images", "data", "image"];

/// A loaded ONNX model with a fixed input shape and a single scalar output.
///
/// Holds a pool of sessions so concurrent `process` calls do not serialize
/// on a single session lock; requests pick a session round-robin. The handle
/// itself is immutable after construction and safe to share across threads.
#[derive(Debug)]
pub struct OnnxModel {
    /// Pool of ONNX Runtime sessions for concurrent predictions.
    sessions: Vec<Mutex<Session>>,
    /// Next index for round-robin session selection.
    next_idx: AtomicUsize,
    /// The name of the input tensor.
    input_name: String,
    /// The input shape the model declares, as (width, height).
    input_shape: (u32, u32),
    /// The path to the model file for error context.
    model_path: PathBuf,
    /// The model name for error context.
    model_name: String,
}

impl OnnxModel {
    /// Loads the model from the path in the configuration.
    ///
    /// Creates `session_pool_size` sessions from the same model file,
    /// applying any ONNX Runtime tuning from the configuration, and
    /// auto-detects the input tensor name from the first session.
    ///
    /// # Arguments
    ///
    /// * `config` - The validated pipeline configuration.
    ///
    /// # Returns
    ///
    /// A Result containing the loaded OnnxModel or a ClassifierError if any
    /// session fails to build.
    pub fn load(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let path = config.model_path.as_path();
        let pool_size = config.session_pool_size.max(1);
        let mut sessions = Vec::with_capacity(pool_size);

        for _ in 0..pool_size {
            let builder = Session::builder()?;
            let builder = if let Some(cfg) = &config.ort_session {
                Self::apply_ort_config(builder, cfg)?
            } else {
                builder
            };
            let session = builder.commit_from_file(path).map_err(|e| {
                ClassifierError::model_load_error(
                    path,
                    "failed to create ONNX session; verify the model file and execution provider",
                    Some(e),
                )
            })?;
            sessions.push(Mutex::new(session));
        }

        let input_name = {
            let session = sessions[0].lock().map_err(|_| {
                ClassifierError::model_load_error(
                    path,
                    "session lock poisoned during input name detection",
                    None::<std::io::Error>,
                )
            })?;
            let available: Vec<String> =
                session.inputs.iter().map(|i| i.name.clone()).collect();
            COMMON_INPUT_NAMES
                .iter()
                .find(|&name| available.iter().any(|input| input == *name))
                .map(|s| s.to_string())
                .or_else(|| available.first().cloned())
                .unwrap_or_else(|| "x".to_string())
        };

        Ok(OnnxModel {
            sessions,
            next_idx: AtomicUsize::new(0),
            input_name,
            input_shape: config.input_shape,
            model_path: path.to_path_buf(),
            model_name: config.resolved_model_name(),
        })
    }

    fn apply_ort_config(
        mut builder: SessionBuilder,
        cfg: &OrtSessionConfig,
    ) -> Result<SessionBuilder, ort::Error> {
        if let Some(intra) = cfg.intra_threads {
            builder = builder.with_intra_threads(intra)?;
        }
        if let Some(inter) = cfg.inter_threads {
            builder = builder.with_inter_threads(inter)?;
        }
        if let Some(par) = cfg.parallel_execution {
            builder = builder.with_parallel_execution(par)?;
        }
        if let Some(level) = cfg.optimization_level {
            use ort::session::builder::GraphOptimizationLevel as GOL;
            let mapped = match level {
                OrtGraphOptimizationLevel::DisableAll => GOL::Disable,
                OrtGraphOptimizationLevel::Level1 => GOL::Level1,
                OrtGraphOptimizationLevel::Level2 => GOL::Level2,
                OrtGraphOptimizationLevel::Level3 => GOL::Level3,
            };
            builder = builder.with_optimization_level(mapped)?;
        }
        Ok(builder)
    }

    /// Gets the path to the model file.
    pub fn model_path(&self) -> &std::path::Path {
        &self.model_path
    }

    /// Gets the name of the model.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Gets the input shape the model declares, as (width, height).
    pub fn input_shape(&self) -> (u32, u32) {
        self.input_shape
    }

    /// Runs the forward pass and returns the model's single scalar output.
    ///
    /// The call is blocking from the caller's perspective; the runtime may
    /// parallelize internally. Intermediate tensors are dropped before the
    /// call returns, so repeated calls do not accumulate memory.
    ///
    /// # Arguments
    ///
    /// * `x` - The normalized input tensor, shape (1, H, W, 3).
    ///
    /// # Returns
    ///
    /// A Result containing the raw score or a ClassifierError.
    ///
    /// # Errors
    ///
    /// Returns `ShapeMismatch` if the tensor does not match the declared
    /// input shape; this indicates a defect upstream, not bad user input.
    pub fn infer_scalar(&self, x: &Tensor4D) -> Result<f32, ClassifierError> {
        let (width, height) = self.input_shape;
        let expected = [1, height as usize, width as usize, 3];
        let actual = x.shape();
        if actual != expected {
            return Err(ClassifierError::shape_mismatch(&expected, actual));
        }

        let input_tensor = TensorRef::from_array_view(x.view()).map_err(|e| {
            ClassifierError::inference_error(
                &self.model_name,
                &format!("failed to convert input tensor with shape {actual:?}"),
                e,
            )
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        // Round-robin select a session
        let idx = self.next_idx.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        let mut session_guard = self.sessions[idx].lock().map_err(|_| {
            ClassifierError::inference_error(
                &self.model_name,
                &format!(
                    "failed to acquire session lock for session {}/{}",
                    idx,
                    self.sessions.len()
                ),
                SimpleError::new("session lock acquisition failed"),
            )
        })?;

        let output_name = session_guard
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| {
                ClassifierError::inference_error(
                    &self.model_name,
                    "no outputs available in session; model may be invalid or corrupted",
                    SimpleError::new("empty output set"),
                )
            })?;

        let outputs = session_guard.run(inputs).map_err(|e| {
            ClassifierError::inference_error(
                &self.model_name,
                &format!("ONNX Runtime inference failed with input '{}'", self.input_name),
                e,
            )
        })?;

        let (output_shape, output_data) = outputs[output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                ClassifierError::inference_error(
                    &self.model_name,
                    &format!("failed to extract output tensor '{output_name}' as f32"),
                    e,
                )
            })?;

        // The model contract is a single sigmoid scalar, usually shaped
        // (1,) or (1, 1).
        if output_data.len() != 1 {
            return Err(ClassifierError::inference_error(
                &self.model_name,
                &format!(
                    "expected a single scalar output, got {} elements with shape {:?}",
                    output_data.len(),
                    output_shape
                ),
                SimpleError::new("unexpected output tensor size"),
            ));
        }

        Ok(output_data[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_fails_for_missing_model_file() {
        // We can't test with an actual ONNX model in unit tests, but the
        // load path must surface a ModelLoad error for a bogus file rather
        // than panic.
        let config = ClassifierConfig::new("dummy_path.onnx");
        let result = OnnxModel::load(&config);
        assert!(result.is_err());
    }

    #[test]
    fn load_respects_session_pool_size_and_ort_config() {
        let mut config = ClassifierConfig::new("dummy_path.onnx");
        config.session_pool_size = 3;
        config.ort_session = Some(OrtSessionConfig::new().with_intra_threads(2));
        // Fails on the missing file, but exercises the pooled-session
        // construction path with tuning applied.
        let result = OnnxModel::load(&config);
        assert!(result.is_err());
    }
}
