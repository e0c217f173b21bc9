//! Classifies pet images with a pretrained ImageNet CNN and measures how well
//! it tells dogs from not-dogs and one dog breed from another.
//!
//! The true label of each image comes from its filename
//! (`Boston_terrier_02259.jpg` → `boston terrier`); a reference list of dog
//! names decides which labels are dogs.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use pet_classifier::{pipeline, report, Architecture, PetClassifier, ReportOptions};
//!
//! let classifier = PetClassifier::builder()
//!     .with_architecture(Architecture::Resnet)?
//!     .build()?;
//!
//! let config = pipeline::RunConfig {
//!     image_dir: "pet_images".into(),
//!     dogfile: "dognames.txt".into(),
//! };
//! let outcome = pipeline::run(&config, &classifier)?;
//! report::print_results(&outcome.results, &outcome.stats, "resnet", ReportOptions::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! Any type implementing [`ImageClassifier`] can stand in for the ONNX model:
//!
//! ```
//! use pet_classifier::{ClassifierError, ImageClassifier};
//! use std::path::Path;
//!
//! struct AlwaysBeagle;
//!
//! impl ImageClassifier for AlwaysBeagle {
//!     fn classify(&self, _path: &Path) -> Result<String, ClassifierError> {
//!         Ok("beagle".to_string())
//!     }
//! }
//! ```

pub mod classifier;
pub mod dognames;
pub mod labels;
pub mod model_manager;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod results;
mod runtime;
pub mod stats;
pub mod store;

pub use classifier::{
    ClassifierBuilder, ClassifierError, ClassifierInfo, ImageClassifier, PetClassifier, Prediction,
};
pub use dognames::DogNames;
pub use model_manager::{ModelError, ModelManager};
pub use models::{Architecture, ModelCharacteristics, ModelInfo, Preprocessing};
pub use report::ReportOptions;
pub use results::{PetImageResult, PetResults};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use stats::{AggregateStats, StatValue, Statistic};

pub fn init_logger() {
    env_logger::init();
}
