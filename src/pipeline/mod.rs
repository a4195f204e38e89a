//! The request-scoped classification pipeline.
//!
//! This module composes the image normalizer, the ONNX model, and the result
//! interpreter into one fail-fast operation per request, and owns the model
//! lifecycle: load once at construction, reuse for every request, release
//! once at orderly shutdown.

use crate::core::{ClassifierConfig, ClassifierError, ClassifierResult, OnnxModel};
use crate::domain::{interpret, DiagnosisResult};
use crate::processors::ImageNormalizer;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// The skin-lesion classification pipeline.
///
/// Thread-safe: concurrent `process` calls share the read-only model handle
/// and carry no other shared state, so no ordering guarantee exists or is
/// needed between them. `release` and `is_ready` synchronize on a cheap
/// read-write lock around the model slot.
#[derive(Debug)]
pub struct ClassifierPipeline {
    /// The loaded model, or None when load failed or the handle was
    /// released.
    model: RwLock<Option<OnnxModel>>,
    /// Normalizer producing the model's input tensor.
    normalizer: ImageNormalizer,
    /// Model name for logs.
    model_name: String,
}

impl ClassifierPipeline {
    /// Builds the pipeline and performs the one-time model load.
    ///
    /// # Arguments
    ///
    /// * `config` - The pipeline configuration; validated before loading.
    ///
    /// # Returns
    ///
    /// A ready pipeline, or a ClassifierError if validation or the load
    /// fails. A caller that must keep the process alive on load failure
    /// can fall back to [`ClassifierPipeline::degraded`].
    pub fn new(config: ClassifierConfig) -> ClassifierResult<Self> {
        config.validate()?;

        let (width, height) = config.input_shape;
        let normalizer = ImageNormalizer::new(width, height)?;
        let model_name = config.resolved_model_name();

        let model = OnnxModel::load(&config).inspect_err(|e| {
            error!(
                model = %model_name,
                path = %config.model_path.display(),
                error = %e,
                "model load failed; pipeline will not become ready"
            );
        })?;

        info!(
            model = %model_name,
            path = %config.model_path.display(),
            input_shape = ?config.input_shape,
            sessions = config.session_pool_size,
            "model loaded, pipeline ready"
        );

        Ok(Self {
            model: RwLock::new(Some(model)),
            normalizer,
            model_name,
        })
    }

    /// Builds a permanently not-ready pipeline.
    ///
    /// Used by the hosting bootstrap when the one-time load fails: the
    /// process keeps running in a degraded state so health checks can
    /// report it, and every `process` call fails fast with
    /// `ModelUnavailable`. There is no automatic retry; only a restart
    /// resolves the degradation.
    pub fn degraded(config: &ClassifierConfig) -> Self {
        let (width, height) = config.input_shape;
        warn!(
            model = %config.resolved_model_name(),
            "constructing degraded pipeline; all requests will fail until restart"
        );
        // The normalizer is never exercised while the model slot is empty,
        // but keep the struct whole; fall back to the reference shape when
        // the configured one is unusable.
        let normalizer = ImageNormalizer::new(width, height)
            .unwrap_or_else(|_| ImageNormalizer::with_default_shape());
        Self {
            model: RwLock::new(None),
            normalizer,
            model_name: config.resolved_model_name(),
        }
    }

    /// Reports whether the model is loaded and requests can be served.
    ///
    /// Cheap and side-effect free; suitable for health-check endpoints.
    pub fn is_ready(&self) -> bool {
        self.model.read().map(|m| m.is_some()).unwrap_or(false)
    }

    /// Classifies one encoded image.
    ///
    /// Runs the strictly linear normalize → infer → interpret sequence,
    /// short-circuiting on the first failure and propagating its error kind
    /// unchanged. The readiness check comes first so an unavailable model
    /// costs no decode work.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The encoded image (JPEG or PNG), already stripped of any
    ///   transport envelope by the hosting boundary.
    ///
    /// # Returns
    ///
    /// A Result containing the diagnosis or a ClassifierError for the
    /// boundary to translate into a response.
    pub fn process(&self, bytes: &[u8]) -> ClassifierResult<DiagnosisResult> {
        let started = Instant::now();

        let guard = self
            .model
            .read()
            .map_err(|_| ClassifierError::ModelUnavailable)?;
        let model = guard.as_ref().ok_or(ClassifierError::ModelUnavailable)?;

        let tensor = self.normalizer.normalize(bytes).inspect_err(|e| {
            debug!(model = %self.model_name, error = %e, "rejected undecodable image");
        })?;

        let score = model.infer_scalar(&tensor).inspect_err(|e| {
            if matches!(e, ClassifierError::ShapeMismatch { .. }) {
                // Contract violation between normalizer and model, not a
                // client fault.
                error!(model = %self.model_name, error = %e, "input shape contract violated");
            } else {
                error!(model = %self.model_name, error = %e, "inference failed");
            }
        })?;

        if !(0.0..=1.0).contains(&score) {
            warn!(
                model = %self.model_name,
                score,
                "raw score outside [0, 1]; confidence will not be clamped"
            );
        }

        let result = interpret(score);
        debug!(
            model = %self.model_name,
            label = %result.label,
            confidence = result.confidence,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "classification complete"
        );
        Ok(result)
    }

    /// Releases the model's resources.
    ///
    /// Invoked once during orderly shutdown; idempotent, so a second call
    /// is a no-op. After release the pipeline reports not ready and every
    /// `process` call fails with `ModelUnavailable`.
    pub fn release(&self) {
        let Ok(mut guard) = self.model.write() else {
            return;
        };
        match guard.take() {
            Some(model) => {
                info!(model = %self.model_name, path = %model.model_path().display(), "model released");
            }
            None => {
                warn!(model = %self.model_name, "release called but model was already released");
            }
        }
    }
}

/// Builder for the classification pipeline.
///
/// Collects configuration, validates it, and performs the one-time load in
/// `build`.
pub struct ClassifierPipelineBuilder {
    model_path: Option<PathBuf>,
    model_name: Option<String>,
    input_shape: Option<(u32, u32)>,
    session_pool_size: Option<usize>,
    ort_session: Option<crate::core::OrtSessionConfig>,
}

impl ClassifierPipelineBuilder {
    /// Creates a new builder with all options unset.
    pub fn new() -> Self {
        Self {
            model_path: None,
            model_name: None,
            input_shape: None,
            session_pool_size: None,
            ort_session: None,
        }
    }

    /// Sets the path to the ONNX model file.
    pub fn model_path(mut self, model_path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(model_path.into());
        self
    }

    /// Sets the model name used in logs and error context.
    pub fn model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    /// Sets the input shape as (width, height).
    pub fn input_shape(mut self, input_shape: (u32, u32)) -> Self {
        self.input_shape = Some(input_shape);
        self
    }

    /// Sets the session pool size for concurrent requests (minimum 1).
    pub fn session_pool_size(mut self, size: usize) -> Self {
        self.session_pool_size = Some(size);
        self
    }

    /// Sets the ONNX Runtime session tuning options.
    pub fn ort_session(mut self, config: crate::core::OrtSessionConfig) -> Self {
        self.ort_session = Some(config);
        self
    }

    /// Produces the configuration this builder describes without loading
    /// the model.
    ///
    /// Useful for the degraded-construction path, where the bootstrap wants
    /// the same configuration for [`ClassifierPipeline::degraded`] after a
    /// failed `build`.
    pub fn into_config(self) -> ClassifierResult<ClassifierConfig> {
        let model_path = self.model_path.ok_or_else(|| {
            crate::core::ConfigError::InvalidConfig {
                message: "model path is required".to_string(),
            }
        })?;
        let mut config = ClassifierConfig::new(model_path);
        config.model_name = self.model_name;
        if let Some(shape) = self.input_shape {
            config.input_shape = shape;
        }
        if let Some(size) = self.session_pool_size {
            config.session_pool_size = size;
        }
        config.ort_session = self.ort_session;
        Ok(config)
    }

    /// Builds the pipeline, validating the configuration and loading the
    /// model.
    ///
    /// # Returns
    ///
    /// A ready pipeline or a ClassifierError if validation or the load
    /// fails.
    pub fn build(self) -> ClassifierResult<ClassifierPipeline> {
        ClassifierPipeline::new(self.into_config()?)
    }
}

impl Default for ClassifierPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Diagnosis;

    fn degraded_pipeline() -> ClassifierPipeline {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        ClassifierPipeline::degraded(&ClassifierConfig::new("missing/model.onnx"))
    }

    #[test]
    fn build_fails_for_missing_model_path() {
        let result = ClassifierPipelineBuilder::new()
            .model_path("does/not/exist.onnx")
            .build();
        assert!(matches!(result, Err(ClassifierError::Config(_))));
    }

    #[test]
    fn build_requires_a_model_path() {
        let result = ClassifierPipelineBuilder::new().build();
        assert!(matches!(result, Err(ClassifierError::Config(_))));
    }

    #[test]
    fn degraded_pipeline_is_not_ready() {
        assert!(!degraded_pipeline().is_ready());
    }

    #[test]
    fn process_fails_fast_when_not_ready() {
        let pipeline = degraded_pipeline();
        // Garbage bytes would be a Decode error if the normalizer ran;
        // ModelUnavailable proves the readiness check short-circuits first.
        let result = pipeline.process(b"not an image at all");
        assert!(matches!(result, Err(ClassifierError::ModelUnavailable)));
    }

    #[test]
    fn process_stays_unavailable_on_repeated_calls() {
        let pipeline = degraded_pipeline();
        for _ in 0..3 {
            assert!(matches!(
                pipeline.process(&[0u8; 16]),
                Err(ClassifierError::ModelUnavailable)
            ));
        }
    }

    #[test]
    fn release_is_idempotent() {
        let pipeline = degraded_pipeline();
        pipeline.release();
        pipeline.release();
        assert!(!pipeline.is_ready());
    }

    #[test]
    fn builder_collects_full_configuration() {
        let config = ClassifierPipelineBuilder::new()
            .model_path("models/skin_lesion.onnx")
            .model_name("skin_lesion_classifier")
            .input_shape((224, 224))
            .session_pool_size(2)
            .into_config()
            .unwrap();
        assert_eq!(config.resolved_model_name(), "skin_lesion_classifier");
        assert_eq!(config.input_shape, (224, 224));
        assert_eq!(config.session_pool_size, 2);
    }

    #[test]
    fn diagnosis_labels_match_wire_format() {
        assert_eq!(Diagnosis::Benign.as_str(), "benign");
        assert_eq!(Diagnosis::Malignant.as_str(), "malignant");
    }
}
