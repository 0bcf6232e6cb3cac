//! ONNX Runtime classifier for models exported with an int64 label output
//! (the usual layout of converted scikit-learn classifiers: output 0 is the
//! label, output 1 the probabilities).

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;

use super::{check_len, ClassLabel, Classifier, InferenceError, VECTOR_LEN};

/// `Session::run` needs `&mut self`, the `Classifier` trait hands out `&self`.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    n_features: usize,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        if !path.exists() {
            return Err(InferenceError::ModelLoad(format!(
                "model not found: {}",
                path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e: ort::Error| InferenceError::ModelLoad(e.to_string()))?
            .with_intra_threads(2)
            .map_err(|e: ort::Error| InferenceError::ModelLoad(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e: ort::Error| InferenceError::ModelLoad(format!("ONNX load failed: {e}")))?;

        Ok(Self {
            session: Mutex::new(session),
            n_features: VECTOR_LEN,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &[f32]) -> Result<ClassLabel, InferenceError> {
        use ort::value::TensorRef;

        check_len(features, self.n_features)?;

        let input = ndarray::Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;
        let tensor = TensorRef::from_array_view(&input)
            .map_err(|e| InferenceError::Runtime(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::Runtime("Session lock poisoned".to_string()))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| InferenceError::Runtime(format!("ONNX inference failed: {e}")))?;

        let (_shape, labels) = outputs[0]
            .try_extract_tensor::<i64>()
            .map_err(|e| InferenceError::Runtime(format!("Output extraction: {e}")))?;

        labels
            .first()
            .map(|label| ClassLabel::Int(*label))
            .ok_or_else(|| InferenceError::Runtime("Model returned no label".to_string()))
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}
