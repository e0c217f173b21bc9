//! Ground-truth labels inferred from pet image filenames.
//!
//! The dataset convention is `<Label_words>_<number>.<ext>`, for example
//! `Boston_terrier_02259.jpg` or `great_pyrenees_05367.jpg`.

use log::{info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Pet labels keyed by image filename, in filename order.
pub type PetLabels = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum LabelError {
    #[error("Failed to read image directory {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("No images found in {0:?}")]
    NoImages(PathBuf),
    #[error("Could not derive a label from filename '{0}'")]
    EmptyLabel(String),
}

/// Lowercases, turns underscores into spaces and collapses whitespace.
pub fn normalize_label(label: &str) -> String {
    label
        .to_lowercase()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derives the pet label from an image filename.
///
/// Only purely alphabetic `_`-separated words are kept, which drops the
/// numeric suffix together with the extension.
///
/// ```
/// use pet_classifier::labels::pet_label_from_filename;
///
/// assert_eq!(pet_label_from_filename("Boston_terrier_02259.jpg"), "boston terrier");
/// ```
pub fn pet_label_from_filename(filename: &str) -> String {
    filename
        .to_lowercase()
        .split('_')
        .filter(|word| !word.is_empty() && word.chars().all(char::is_alphabetic))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Builds the filename → pet label table for every image in `image_dir`.
///
/// Hidden files and subdirectories are skipped.
pub fn get_pet_labels(image_dir: &Path) -> Result<PetLabels, LabelError> {
    let io_err = |source| LabelError::Io {
        path: image_dir.to_path_buf(),
        source,
    };

    let mut labels = PetLabels::new();
    for entry in fs::read_dir(image_dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if !entry.file_type().map_err(io_err)?.is_file() {
            continue;
        }
        let Some(filename) = entry.file_name().to_str().map(str::to_owned) else {
            warn!("Skipping non UTF-8 filename {:?}", entry.file_name());
            continue;
        };
        if filename.starts_with('.') {
            continue;
        }

        let label = pet_label_from_filename(&filename);
        if label.is_empty() {
            return Err(LabelError::EmptyLabel(filename));
        }
        labels.insert(filename, label);
    }

    if labels.is_empty() {
        return Err(LabelError::NoImages(image_dir.to_path_buf()));
    }
    info!("Derived {} pet labels from {:?}", labels.len(), image_dir);
    Ok(labels)
}
