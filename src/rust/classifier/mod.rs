mod builder;
#[allow(clippy::module_inception)]
mod classifier;
mod error;
mod inference;
mod utils;

use log::info;
use std::collections::BTreeMap;
use std::path::Path;

pub use builder::{parse_class_labels, ClassifierBuilder};
pub use classifier::{ImageClassifier, PetClassifier, Prediction};
pub use error::ClassifierError;
pub use inference::preprocess;

use crate::labels::{normalize_label, PetLabels};

/// Information about the classifier's current state
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    pub model_path: String,
    pub labels_path: String,
    pub num_classes: usize,
    pub input_size: u32,
}

/// A pet label paired with what the classifier saw in the same image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub pet_label: String,
    pub classifier_label: String,
    pub is_match: bool,
}

/// Classifications keyed by image filename, in filename order.
pub type Classifications = BTreeMap<String, Classification>;

/// Compares a pet label with a classifier label.
///
/// Both sides are normalized first. ImageNet labels often list synonyms
/// (`"walker hound, walker foxhound"`), so the pet label matches if it equals
/// the whole classifier label or any one of its comma-separated terms.
pub fn labels_match(pet_label: &str, classifier_label: &str) -> bool {
    let pet = normalize_label(pet_label);
    if pet.is_empty() {
        return false;
    }
    let predicted = normalize_label(classifier_label);
    predicted == pet || predicted.split(',').map(normalize_label).any(|term| term == pet)
}

/// Classifies every image named in `pet_labels`, reading files from `image_dir`.
///
/// Fails on the first image the classifier cannot handle; a partially
/// classified set is never returned.
pub fn classify_images<C>(
    image_dir: &Path,
    pet_labels: &PetLabels,
    classifier: &C,
) -> Result<Classifications, ClassifierError>
where
    C: ImageClassifier + ?Sized,
{
    let mut classifications = Classifications::new();
    for (i, (filename, pet_label)) in pet_labels.iter().enumerate() {
        let classifier_label = normalize_label(&classifier.classify(&image_dir.join(filename))?);
        let is_match = labels_match(pet_label, &classifier_label);
        info!(
            "[{}/{}] {}: pet='{}' classifier='{}' match={}",
            i + 1,
            pet_labels.len(),
            filename,
            pet_label,
            classifier_label,
            is_match
        );
        classifications.insert(
            filename.clone(),
            Classification {
                pet_label: pet_label.clone(),
                classifier_label,
                is_match,
            },
        );
    }
    Ok(classifications)
}
