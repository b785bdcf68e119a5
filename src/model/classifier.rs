//! Classifier wrapper around birdnet-onnx.

use crate::config::InferenceDevice;
use crate::detect::SpeciesScore;
use crate::error::{Error, Result};
use crate::model::SpeciesModel;
use birdnet_onnx::{
    Classifier, ClassifierBuilder, ExecutionProviderInfo, InferenceOptions,
    available_execution_providers,
};
use std::path::Path;
use tracing::{debug, info, warn};

/// ONNX-backed species classifier.
pub struct OnnxClassifier {
    inner: Classifier,
}

impl OnnxClassifier {
    /// Load a classifier from model and labels files.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelUnavailable`] when the model cannot be loaded;
    /// this is fatal for analysis.
    pub fn load(model_path: &Path, labels_path: &Path, device: InferenceDevice) -> Result<Self> {
        let available = available_execution_providers();
        debug!(
            "Available execution providers: {}",
            available
                .iter()
                .map(|p| format!("{p:?}"))
                .collect::<Vec<_>>()
                .join(", ")
        );

        // The full score vector is required downstream: occurrence masking
        // runs after prediction, so any top-k cap here could drop an allowed
        // species ranked below disallowed ones
        let builder = ClassifierBuilder::new()
            .model_path(model_path.to_string_lossy().to_string())
            .labels_path(labels_path.to_string_lossy().to_string())
            .top_k(usize::MAX)
            .min_confidence(0.0);

        // GPU provider priority order (shared by Auto and Gpu modes)
        let gpu_priority = [
            (ExecutionProviderInfo::TensorRt, "TensorRT"),
            (ExecutionProviderInfo::Cuda, "CUDA"),
            (ExecutionProviderInfo::DirectMl, "DirectML"),
            (ExecutionProviderInfo::CoreMl, "CoreML"),
        ];

        let (builder, device_msg) = match device {
            InferenceDevice::Cpu => {
                info!("Requested device: CPU");
                (builder, "CPU")
            }
            InferenceDevice::Auto => {
                if let Some(&(provider, name)) =
                    gpu_priority.iter().find(|(p, _)| available.contains(p))
                {
                    info!("Auto mode: {} available, attempting GPU", name);
                    (add_execution_provider(builder, provider), name)
                } else {
                    info!("Auto mode: No GPU providers available, using CPU");
                    (builder, "Auto (CPU)")
                }
            }
            InferenceDevice::Gpu => {
                if let Some(&(provider, name)) =
                    gpu_priority.iter().find(|(p, _)| available.contains(p))
                {
                    info!("--gpu: Selected {} provider", name);
                    (add_execution_provider(builder, provider), name)
                } else {
                    warn!("--gpu requested but no GPU providers available, using CPU");
                    (builder, "GPU (fallback to CPU)")
                }
            }
        };

        let inner = builder.build().map_err(|e| Error::ModelUnavailable {
            reason: e.to_string(),
        })?;

        info!(
            "Loaded model: {:?}, sample_rate: {}, window: {}s, device: {}",
            inner.config().model_type,
            inner.config().sample_rate,
            inner.config().segment_duration,
            device_msg
        );

        Ok(Self { inner })
    }
}

impl SpeciesModel for OnnxClassifier {
    fn labels(&self) -> &[String] {
        self.inner.labels()
    }

    fn sample_rate(&self) -> u32 {
        self.inner.config().sample_rate
    }

    fn window_secs(&self) -> f32 {
        self.inner.config().segment_duration
    }

    fn input_len(&self) -> usize {
        self.inner.config().sample_count
    }

    fn score_window(&self, samples: &[f32]) -> Result<Vec<SpeciesScore>> {
        let result = self
            .inner
            .predict(samples, &InferenceOptions::default())
            .map_err(|e| Error::Inference {
                reason: e.to_string(),
            })?;

        Ok(result
            .predictions
            .into_iter()
            .map(|p| SpeciesScore {
                label: p.species,
                confidence: p.confidence,
            })
            .collect())
    }
}

/// Add the matching execution provider to the builder.
fn add_execution_provider(
    builder: ClassifierBuilder,
    provider: ExecutionProviderInfo,
) -> ClassifierBuilder {
    use birdnet_onnx::ort_execution_providers::{
        CUDAExecutionProvider, CoreMLExecutionProvider, DirectMLExecutionProvider,
    };

    match provider {
        ExecutionProviderInfo::Cuda => builder.execution_provider(CUDAExecutionProvider::default()),
        // Optimized TensorRT configuration (FP16, engine caching)
        ExecutionProviderInfo::TensorRt => builder.with_tensorrt(),
        ExecutionProviderInfo::DirectMl => {
            builder.execution_provider(DirectMLExecutionProvider::default())
        }
        ExecutionProviderInfo::CoreMl => {
            builder.execution_provider(CoreMLExecutionProvider::default())
        }
        _ => builder,
    }
}
