//! Model Gateway - ONNX Runtime artifact loading
//!
//! The artifact is loaded once at startup. Any failure degrades to
//! `ModelState::Unavailable`; there is no retry and no hot-reload.

use std::path::{Path, PathBuf};

use ndarray::Array4;
use notecheck_types::{Error, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;

use crate::classifier::ScoreModel;

/// A successfully loaded classifier artifact
pub struct LoadedModel {
    // ort needs `&mut Session` to run; the lock is only held for one forward pass
    session: Mutex<Session>,
    path: PathBuf,
}

impl LoadedModel {
    /// Open an ONNX model file
    pub fn open(model_path: &Path) -> Result<Self> {
        if !model_path.exists() {
            return Err(Error::ModelLoad(format!(
                "Model not found: {}",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| Error::ModelLoad(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::ModelLoad(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| Error::ModelLoad(format!("Failed to load model: {}", e)))?;

        Ok(Self {
            session: Mutex::new(session),
            path: model_path.to_path_buf(),
        })
    }
}

impl ScoreModel for LoadedModel {
    fn score(&self, input: Array4<f32>) -> Result<f32> {
        let mut session = self.session.lock();

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| Error::Inference("No output defined".to_string()))?;

        let input_tensor = Value::from_array(input)
            .map_err(|e| Error::Inference(format!("Tensor error: {}", e)))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| Error::Inference(format!("Forward pass failed: {}", e)))?;

        let output = outputs
            .get(&output_name)
            .ok_or_else(|| Error::Inference("No output".to_string()))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::Inference(format!("Extract error: {}", e)))?;

        let score = data
            .first()
            .copied()
            .ok_or_else(|| Error::Inference("Empty output tensor".to_string()))?;
        Ok(score)
    }
}

/// Process-wide model state, fixed after startup
pub enum ModelState {
    Unavailable,
    Loaded(LoadedModel),
}

impl ModelState {
    pub fn is_available(&self) -> bool {
        matches!(self, ModelState::Loaded(_))
    }
}

impl std::fmt::Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelState::Unavailable => write!(f, "Unavailable"),
            ModelState::Loaded(model) => write!(f, "Loaded({})", model.path.display()),
        }
    }
}

/// Owns the model lifecycle
#[derive(Debug)]
pub struct ModelGateway {
    state: ModelState,
}

impl ModelGateway {
    /// Attempt to load the artifact. Never fails: errors are logged and the
    /// gateway reports unavailable.
    pub fn load(model_path: &Path) -> Self {
        log::info!("Loading ONNX model from: {}", model_path.display());
        let state = match LoadedModel::open(model_path) {
            Ok(model) => {
                log::info!("ONNX model loaded successfully");
                ModelState::Loaded(model)
            }
            Err(e) => {
                log::warn!("{}; running in fallback mode", e);
                ModelState::Unavailable
            }
        };
        Self { state }
    }

    pub fn is_available(&self) -> bool {
        self.state.is_available()
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_missing_model_is_unavailable() {
        let dir = tempdir().unwrap();
        let gateway = ModelGateway::load(&dir.path().join("missing.onnx"));
        assert!(!gateway.is_available());
        assert!(matches!(gateway.state(), ModelState::Unavailable));
    }

    #[test]
    fn test_missing_model_reports_load_error() {
        let dir = tempdir().unwrap();
        let result = LoadedModel::open(&dir.path().join("missing.onnx"));
        assert!(matches!(result, Err(Error::ModelLoad(_))));
    }

    #[test]
    fn test_corrupt_model_is_unavailable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.onnx");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"definitely not a protobuf graph").unwrap();
        drop(file);

        let gateway = ModelGateway::load(&path);
        assert!(!gateway.is_available());
    }
}
