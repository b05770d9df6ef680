//
// classify.rs
// Modality-Classifier-rs
//
// Wraps the pretrained ONNX classifier behind a scoring trait and maps its scalar output to a label.
//
// Thales Matheus Mendonça Santos - December 2025

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Value;
use tracing::info;

use crate::error::PipelineError;
use crate::models::Modality;
use crate::preprocess::MODEL_INPUT_SIZE;

/// Fixed decision cutoff of the trained artifact: `p > 0.5` means MRI.
pub const CLASSIFICATION_THRESHOLD: f32 = 0.5;

/// Default location of the exported classifier artifact.
pub const DEFAULT_MODEL_PATH: &str = "model/ct_mri_classifier.onnx";

/// Map the model's scalar output to a discrete label.
pub fn label_for_score(score: f32) -> Modality {
    if score > CLASSIFICATION_THRESHOLD {
        Modality::Mri
    } else {
        Modality::Ct
    }
}

/// Seam through which the pipeline invokes the model, so tests can substitute
/// a stub scorer without the artifact on disk.
pub trait ModalityScorer: Send + Sync {
    /// Run the model once on a `[1, 152, 152, 3]` tensor and return its
    /// single scalar output.
    fn score(&self, input: &ndarray::Array4<f32>) -> Result<f32, PipelineError>;
}

/// Pretrained binary classifier loaded from an ONNX artifact.
///
/// Loaded once at startup and shared read-only afterwards. The session sits
/// behind a `Mutex` because `ort::Session::run` requires `&mut self`, so
/// concurrent requests serialize on the inference call itself.
#[derive(Debug)]
pub struct OnnxClassifier {
    session: Mutex<Session>,
}

impl OnnxClassifier {
    /// Load the classifier artifact. Failure here is fatal for the server:
    /// the process cannot answer requests without a model.
    pub fn load(model_path: &Path) -> Result<Self, PipelineError> {
        if !model_path.exists() {
            return Err(PipelineError::ArtifactLoad(format!(
                "model artifact not found at {}",
                model_path.display()
            )));
        }

        let threads = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4)
            .clamp(1, 8);

        let session = Session::builder()
            .map_err(|e| PipelineError::ArtifactLoad(e.to_string()))?
            .with_intra_threads(threads)
            .map_err(|e| PipelineError::ArtifactLoad(e.to_string()))?
            .commit_from_file(model_path)
            .map_err(|e| PipelineError::ArtifactLoad(format!("ONNX load failed: {e}")))?;

        info!(model = %model_path.display(), threads, "classifier artifact loaded");

        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl ModalityScorer for OnnxClassifier {
    fn score(&self, input: &ndarray::Array4<f32>) -> Result<f32, PipelineError> {
        let expected = (1, MODEL_INPUT_SIZE as usize, MODEL_INPUT_SIZE as usize, 3);
        if input.dim() != expected {
            return Err(PipelineError::Inference(format!(
                "model input must have shape {expected:?}, got {:?}",
                input.shape()
            )));
        }

        let shape = input.shape().to_vec();
        let data: Vec<f32> = input.iter().copied().collect();
        let tensor = Value::from_array((shape.as_slice(), data))
            .map_err(|e| PipelineError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| PipelineError::Inference("session lock poisoned".into()))?;
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| PipelineError::Inference(format!("ONNX inference failed: {e}")))?;

        let (_shape, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| PipelineError::Inference(e.to_string()))?;

        scores
            .first()
            .copied()
            .ok_or_else(|| PipelineError::Inference("model produced an empty output".into()))
    }
}
