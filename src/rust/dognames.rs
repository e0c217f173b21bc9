//! Dog / not-dog decisions against a reference list of breed names.

use log::info;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::classifier::Classifications;
use crate::labels::normalize_label;
use crate::results::{PetImageResult, PetResults};

#[derive(Debug, thiserror::Error)]
pub enum DogNamesError {
    #[error("Failed to read dog names file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Dog names list is empty")]
    Empty,
}

/// The reference list of labels that denote dogs.
///
/// Lines may hold comma-separated synonyms
/// (`german shepherd, german shepherd dog, german police dog, alsatian`).
/// A label is a dog if it equals a whole line, or if it or any of its own
/// comma-separated terms equals one of the synonyms.
#[derive(Debug, Clone, Default)]
pub struct DogNames {
    entries: HashSet<String>,
    terms: HashSet<String>,
}

impl DogNames {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DogNamesError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| DogNamesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let names = Self::from_lines(text.lines())?;
        info!("Loaded {} dog names from {:?}", names.len(), path);
        Ok(names)
    }

    pub fn from_lines<I, S>(lines: I) -> Result<Self, DogNamesError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names = Self::default();
        for line in lines {
            let entry = normalize_label(line.as_ref());
            if entry.is_empty() {
                continue;
            }
            names.terms.extend(split_terms(&entry));
            names.entries.insert(entry);
        }
        if names.entries.is_empty() {
            return Err(DogNamesError::Empty);
        }
        Ok(names)
    }

    /// Number of distinct lines in the reference list
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_dog(&self, label: &str) -> bool {
        let label = normalize_label(label);
        if label.is_empty() {
            return false;
        }
        self.entries.contains(&label)
            || self.terms.contains(&label)
            || split_terms(&label).any(|term| self.terms.contains(&term))
    }
}

fn split_terms(label: &str) -> impl Iterator<Item = String> + '_ {
    label.split(',').map(normalize_label).filter(|term| !term.is_empty())
}

/// Attaches the two dog flags to every classification.
///
/// This is where each [`PetImageResult`] is created; nothing changes it later.
pub fn adjust_results_for_dogs(classifications: Classifications, dognames: &DogNames) -> PetResults {
    classifications
        .into_iter()
        .map(|(filename, c)| {
            let pet_is_dog = dognames.is_dog(&c.pet_label);
            let classifier_is_dog = dognames.is_dog(&c.classifier_label);
            let result = PetImageResult::new(c.pet_label, c.classifier_label, c.is_match, pet_is_dog, classifier_is_dog);
            (filename, result)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classification;

    fn dognames() -> DogNames {
        DogNames::from_lines([
            "beagle",
            "German shepherd, German shepherd dog, German police dog, alsatian",
            "walker hound, walker foxhound",
            "",
        ])
        .unwrap()
    }

    #[test]
    fn test_is_dog() {
        let names = dognames();
        assert_eq!(names.len(), 3);
        assert!(names.is_dog("beagle"));
        assert!(names.is_dog("Beagle"));
        assert!(names.is_dog("german shepherd dog"));
        assert!(names.is_dog("walker hound, walker foxhound"));
        assert!(names.is_dog("alsatian"));
        assert!(!names.is_dog("tabby, tabby cat"));
        assert!(!names.is_dog("shepherd"));
        assert!(!names.is_dog(""));
    }

    #[test]
    fn test_empty_list_rejected() {
        assert!(matches!(DogNames::from_lines(["", "   "]), Err(DogNamesError::Empty)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dognames.txt");
        fs::write(&path, "beagle\npoodle\n").unwrap();
        let names = DogNames::from_file(&path).unwrap();
        assert!(names.is_dog("poodle"));

        let missing = DogNames::from_file(dir.path().join("nope.txt"));
        assert!(matches!(missing, Err(DogNamesError::Io { .. })));
    }

    #[test]
    fn test_adjust_results_for_dogs() {
        let mut classifications = Classifications::new();
        classifications.insert(
            "Beagle_01.jpg".into(),
            Classification {
                pet_label: "beagle".into(),
                classifier_label: "walker hound, walker foxhound".into(),
                is_match: false,
            },
        );
        classifications.insert(
            "cat_01.jpg".into(),
            Classification {
                pet_label: "cat".into(),
                classifier_label: "beagle".into(),
                is_match: false,
            },
        );

        let results = adjust_results_for_dogs(classifications, &dognames());
        let beagle = &results["Beagle_01.jpg"];
        assert!(beagle.pet_is_dog() && beagle.classifier_is_dog());
        let cat = &results["cat_01.jpg"];
        assert!(!cat.pet_is_dog() && cat.classifier_is_dog());
    }
}
