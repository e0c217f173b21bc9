use ort::session::Session;
use std::path::Path;
use std::sync::Arc;

use super::error::ClassifierError;
use super::inference::ImageInference;
use super::utils::{argmax, softmax_at};
use crate::models::ModelCharacteristics;

/// Anything that can name the subject of an image file.
///
/// The pipeline only depends on this trait, so the ONNX-backed
/// [`PetClassifier`] can be swapped for a fixed lookup in tests.
pub trait ImageClassifier {
    /// Returns the predicted label for the image at `path`, lowercased.
    fn classify(&self, path: &Path) -> Result<String, ClassifierError>;
}

/// The outcome of classifying a single image
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Human readable ImageNet label, lowercased (e.g. `"walker hound, walker foxhound"`)
    pub label: String,
    /// Index of the winning class in the model output
    pub class_index: usize,
    /// Softmax probability of the winning class
    pub score: f32,
}

/// A thread-safe pet image classifier backed by an ONNX ImageNet model.
///
/// This type is `Send + Sync`: the session and label table are behind `Arc`.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use pet_classifier::{Architecture, PetClassifier};
///
/// let classifier = PetClassifier::builder()
///     .with_architecture(Architecture::Vgg)?
///     .build()?;
///
/// let prediction = classifier.predict("pet_images/Beagle_01141.jpg")?;
/// println!("{} ({:.1}%)", prediction.label, prediction.score * 100.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PetClassifier {
    pub model_path: String,
    pub labels_path: String,
    pub session: Arc<Session>,
    pub class_labels: Arc<Vec<String>>,
    pub model_characteristics: ModelCharacteristics,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<PetClassifier>();
    }
};

impl ImageInference for PetClassifier {
    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }

    fn characteristics(&self) -> Option<&ModelCharacteristics> {
        Some(&self.model_characteristics)
    }
}

impl PetClassifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            labels_path: self.labels_path.clone(),
            num_classes: self.class_labels.len(),
            input_size: self.model_characteristics.input_size,
        }
    }

    /// Classifies the image at `path`.
    ///
    /// # Errors
    /// - `ImageError` if the file cannot be opened or decoded
    /// - `ModelError` if the model cannot be run
    /// - `PredictionError` if the output has no usable score or its arg-max
    ///   falls outside the label table
    pub fn predict(&self, path: impl AsRef<Path>) -> Result<Prediction, ClassifierError> {
        let path = path.as_ref();
        let input = self.load_image(path)?;
        let scores = self.run_scores(input)?;

        let (class_index, _) = argmax(&scores)
            .ok_or_else(|| ClassifierError::PredictionError("Model produced no finite scores".into()))?;
        let label = self.class_labels.get(class_index).ok_or_else(|| {
            ClassifierError::PredictionError(format!(
                "Class index {} outside label table of {} entries",
                class_index,
                self.class_labels.len()
            ))
        })?;

        Ok(Prediction {
            label: label.clone(),
            class_index,
            score: softmax_at(&scores, class_index),
        })
    }
}

impl ImageClassifier for PetClassifier {
    fn classify(&self, path: &Path) -> Result<String, ClassifierError> {
        let prediction = self.predict(path)?;
        log::debug!(
            "{} -> {} (class {}, p={:.3})",
            path.display(),
            prediction.label,
            prediction.class_index,
            prediction.score
        );
        Ok(prediction.label)
    }
}
