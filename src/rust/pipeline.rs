use log::info;
use std::path::PathBuf;

use crate::classifier::{classify_images, ClassifierError, ImageClassifier};
use crate::dognames::{adjust_results_for_dogs, DogNames, DogNamesError};
use crate::labels::{get_pet_labels, LabelError};
use crate::results::PetResults;
use crate::stats::{calculate_results_stats, AggregateStats, StatsError};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Labels(#[from] LabelError),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error(transparent)]
    DogNames(#[from] DogNamesError),
    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// Inputs of one classification run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory holding the pet images
    pub image_dir: PathBuf,
    /// Reference list of dog labels, one per line
    pub dogfile: PathBuf,
}

impl RunConfig {
    /// Checks that the image directory holds labelled images and the dog list
    /// loads, without classifying anything. Cheap enough to call before a
    /// model download.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let pet_labels = get_pet_labels(&self.image_dir)?;
        let dognames = DogNames::from_file(&self.dogfile)?;
        info!(
            "Found {} images in {:?} and {} dog names",
            pet_labels.len(),
            self.image_dir,
            dognames.len()
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub results: PetResults,
    pub stats: AggregateStats,
}

/// Labels, classifies and scores every image in `config.image_dir`.
///
/// The dog list is loaded before any image is classified, so a bad dogfile
/// fails fast instead of after a slow classification pass.
pub fn run<C>(config: &RunConfig, classifier: &C) -> Result<RunOutcome, PipelineError>
where
    C: ImageClassifier + ?Sized,
{
    let pet_labels = get_pet_labels(&config.image_dir)?;
    let dognames = DogNames::from_file(&config.dogfile)?;

    info!("Classifying {} images", pet_labels.len());
    let classifications = classify_images(&config.image_dir, &pet_labels, classifier)?;

    let results = adjust_results_for_dogs(classifications, &dognames);
    let dogs = results.values().filter(|r| r.pet_is_dog()).count();
    info!("{} of {} images show dogs", dogs, results.len());

    let stats = calculate_results_stats(&results)?;
    Ok(RunOutcome { results, stats })
}
