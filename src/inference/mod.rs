//! Inference adapter: one pre-trained classifier, loaded at startup and shared
//! read-only between requests.
//!
//! ```text
//! image path ──► preprocess (150×150, luma, /255) ──► Classifier::predict ──► ClassLabel
//! ```
//!
//! Classifiers are selected by file extension:
//! - `*.json`: native tree-ensemble or linear model (`native`)
//! - `*.onnx`: ONNX Runtime session, behind the `onnx` feature

pub mod native;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod preprocess;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use preprocess::{image_to_vector, IMAGE_SIDE, VECTOR_LEN};

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),

    #[error("Feature vector has {actual} values, model expects {expected}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("Inference failed: {0}")]
    Runtime(String),
}

/// A predicted class. Models trained on integer targets produce `Int`,
/// string targets produce `Text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassLabel {
    Int(i64),
    Text(String),
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Anything that maps one feature vector to one class.
///
/// Implementations take `&self` and must be safe to call from many requests
/// at once.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &[f32]) -> Result<ClassLabel, InferenceError>;

    /// Length of the vector `predict` expects.
    fn n_features(&self) -> usize;

    /// Short name for logs.
    fn kind(&self) -> &'static str;
}

/// Fail with `FeatureMismatch` unless `features` has exactly `expected` values.
pub(crate) fn check_len(features: &[f32], expected: usize) -> Result<(), InferenceError> {
    if features.len() == expected {
        Ok(())
    } else {
        Err(InferenceError::FeatureMismatch {
            expected,
            actual: features.len(),
        })
    }
}

/// Shared handle to the loaded classifier.
#[derive(Clone)]
pub struct InferenceAdapter {
    classifier: Arc<dyn Classifier>,
}

impl fmt::Debug for InferenceAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceAdapter")
            .field("kind", &self.classifier.kind())
            .field("n_features", &self.classifier.n_features())
            .finish()
    }
}

impl InferenceAdapter {
    /// Load the classifier at `path`, choosing the loader by extension.
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let classifier: Arc<dyn Classifier> = match ext.as_str() {
            "json" => Arc::new(native::NativeModel::load(path)?),
            #[cfg(feature = "onnx")]
            "onnx" => Arc::new(onnx::OnnxClassifier::load(path)?),
            _ => return Err(InferenceError::UnsupportedFormat(path.display().to_string())),
        };

        if classifier.n_features() != VECTOR_LEN {
            tracing::warn!(
                expected = VECTOR_LEN,
                model = classifier.n_features(),
                "Model input width differs from the image vector; every prediction will fail"
            );
        }
        tracing::info!(
            path = %path.display(),
            kind = classifier.kind(),
            "Classifier loaded"
        );

        Ok(Self { classifier })
    }

    pub fn from_classifier(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    /// Classify an already-preprocessed vector.
    pub fn predict(&self, features: &[f32]) -> Result<ClassLabel, InferenceError> {
        check_len(features, self.classifier.n_features())?;
        self.classifier.predict(features)
    }

    /// Read, preprocess and classify the image at `path`. Blocking.
    pub fn predict_path(&self, path: &Path) -> Result<ClassLabel, InferenceError> {
        let features = image_to_vector(path)?;
        self.predict(&features)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Predicts `1` when the mean intensity is above `cutoff`, else `0`.
    pub struct BrightnessClassifier {
        pub cutoff: f32,
    }

    impl Classifier for BrightnessClassifier {
        fn predict(&self, features: &[f32]) -> Result<ClassLabel, InferenceError> {
            check_len(features, VECTOR_LEN)?;
            let mean = features.iter().sum::<f32>() / features.len() as f32;
            Ok(ClassLabel::Int(i64::from(mean > self.cutoff)))
        }

        fn n_features(&self) -> usize {
            VECTOR_LEN
        }

        fn kind(&self) -> &'static str {
            "brightness"
        }
    }

    pub fn brightness_adapter() -> InferenceAdapter {
        InferenceAdapter::from_classifier(Arc::new(BrightnessClassifier { cutoff: 0.5 }))
    }
}
