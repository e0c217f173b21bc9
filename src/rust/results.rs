use std::collections::BTreeMap;

/// Everything known about one image once it has been classified and
/// checked against the dog list. Read-only after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetImageResult {
    pet_label: String,
    classifier_label: String,
    is_match: bool,
    pet_is_dog: bool,
    classifier_is_dog: bool,
}

/// Per-image results keyed by filename. Iterates in filename order.
pub type PetResults = BTreeMap<String, PetImageResult>;

impl PetImageResult {
    pub fn new(
        pet_label: impl Into<String>,
        classifier_label: impl Into<String>,
        is_match: bool,
        pet_is_dog: bool,
        classifier_is_dog: bool,
    ) -> Self {
        Self {
            pet_label: pet_label.into(),
            classifier_label: classifier_label.into(),
            is_match,
            pet_is_dog,
            classifier_is_dog,
        }
    }

    /// Ground truth taken from the filename
    pub fn pet_label(&self) -> &str {
        &self.pet_label
    }

    /// What the classifier predicted
    pub fn classifier_label(&self) -> &str {
        &self.classifier_label
    }

    pub fn is_match(&self) -> bool {
        self.is_match
    }

    pub fn pet_is_dog(&self) -> bool {
        self.pet_is_dog
    }

    pub fn classifier_is_dog(&self) -> bool {
        self.classifier_is_dog
    }

    /// The classifier got dog vs. not-dog wrong.
    pub fn is_dog_misclassified(&self) -> bool {
        self.pet_is_dog != self.classifier_is_dog
    }

    /// Both sides agree it is a dog but the breed differs.
    pub fn is_breed_misclassified(&self) -> bool {
        self.pet_is_dog && self.classifier_is_dog && !self.is_match
    }
}
