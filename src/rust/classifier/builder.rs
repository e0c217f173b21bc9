use image::{DynamicImage, RgbImage};
use log::{error, info};
use ort::session::Session;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::classifier::PetClassifier;
use super::error::ClassifierError;
use super::inference::{preprocess, ImageInference};
use crate::models::{Architecture, ModelCharacteristics};
use crate::runtime::{create_session_builder, RuntimeConfig};
use crate::ModelManager;

/// Parses an ImageNet label table.
///
/// Each non-empty line is one class, in model output order. Lines in the
/// `synset.txt` form (`n02088364 beagle`) lose their WordNet id; plain lines
/// are taken as-is. Labels are lowercased and trimmed.
pub fn parse_class_labels(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once(char::is_whitespace) {
            Some((id, rest)) if is_wordnet_id(id) => rest.trim().to_lowercase(),
            _ => line.to_lowercase(),
        })
        .collect()
}

fn is_wordnet_id(token: &str) -> bool {
    token.len() > 1 && token.starts_with('n') && token[1..].chars().all(|c| c.is_ascii_digit())
}

/// A builder for constructing a PetClassifier with a fluent interface.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    labels_path: Option<String>,
    session: Option<Session>,
    class_labels: Option<Vec<String>>,
    model_characteristics: Option<ModelCharacteristics>,
    models_dir: Option<PathBuf>,
    runtime_config: RuntimeConfig,
}

impl ImageInference for ClassifierBuilder {
    fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    fn characteristics(&self) -> Option<&ModelCharacteristics> {
        self.model_characteristics.as_ref()
    }
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution
    ///
    /// # Example
    /// ```
    /// use pet_classifier::{ClassifierBuilder, RuntimeConfig};
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .with_runtime_config(RuntimeConfig::default());
    /// ```
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Looks up built-in models in `dir` instead of the default cache directory.
    /// Must be called before [`with_architecture`](Self::with_architecture).
    pub fn with_models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = Some(dir.into());
        self
    }

    /// Loads one of the built-in architectures from the model cache.
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - A model is already set
    ///   - The model is not downloaded, or its files no longer match their recorded hashes
    ///   - The model or label file failed to load
    ///   - The model structure is invalid
    pub fn with_architecture(mut self, architecture: Architecture) -> Result<Self, ClassifierError> {
        if self.model_path.is_some() || self.labels_path.is_some() {
            return Err(ClassifierError::BuildError("Model and labels paths already set".to_string()));
        }

        let manager = match &self.models_dir {
            Some(dir) => ModelManager::new(dir),
            None => ModelManager::new_default(),
        }
        .map_err(|e| ClassifierError::BuildError(format!("Failed to create model manager: {}", e)))?;

        if !manager.is_model_downloaded(architecture) {
            return Err(ClassifierError::BuildError(format!(
                "Model '{}' is not downloaded. Please download it first using ModelManager::download_model()",
                architecture
            )));
        }
        let verified = manager
            .verify_model(architecture)
            .map_err(|e| ClassifierError::BuildError(format!("Failed to verify model '{}': {}", architecture, e)))?;
        if !verified {
            return Err(ClassifierError::BuildError(format!(
                "Model '{}' is not verified. Remove it and download it again",
                architecture
            )));
        }

        let model_path = manager.get_model_path(architecture);
        let labels_path = manager.get_labels_path(architecture);
        let characteristics = architecture.characteristics();

        let class_labels = Self::load_labels(&labels_path)?;
        let session = create_session_builder(&self.runtime_config)?.commit_from_file(&model_path)?;
        Self::validate_model(&session)?;
        info!("Model structure validated successfully");
        Self::validate_labels(&class_labels, characteristics.num_classes)?;

        self.model_characteristics = Some(characteristics);
        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.labels_path = Some(labels_path.to_string_lossy().to_string());
        self.class_labels = Some(class_labels);
        self.session = Some(session);
        Ok(self)
    }

    /// Uses a custom ONNX model and label file.
    ///
    /// The number of classes is inferred by running a blank image through the
    /// model, so `characteristics.num_classes` only needs to be a guess.
    ///
    /// # Example
    /// ```no_run
    /// use pet_classifier::{Architecture, ClassifierBuilder};
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .with_custom_model(
    ///         "path/to/squeezenet.onnx",
    ///         "path/to/synset.txt",
    ///         Architecture::Resnet.characteristics(),
    ///     );
    /// ```
    pub fn with_custom_model(
        mut self,
        model_path: &str,
        labels_path: &str,
        characteristics: ModelCharacteristics,
    ) -> Result<Self, ClassifierError> {
        if model_path.is_empty() || labels_path.is_empty() {
            return Err(ClassifierError::BuildError("Model and labels paths cannot be empty".to_string()));
        }
        if self.model_path.is_some() || self.labels_path.is_some() {
            return Err(ClassifierError::BuildError("Model and labels paths already set".to_string()));
        }
        if characteristics.input_size == 0 {
            return Err(ClassifierError::ValidationError("Input size must be positive".into()));
        }

        if !Path::new(model_path).exists() {
            return Err(ClassifierError::BuildError(format!("Model file not found: {}", model_path)));
        }
        if !Path::new(labels_path).exists() {
            return Err(ClassifierError::BuildError(format!("Labels file not found: {}", labels_path)));
        }

        let class_labels = Self::load_labels(Path::new(labels_path))?;
        let session = create_session_builder(&self.runtime_config)?.commit_from_file(model_path)?;
        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        let size = characteristics.input_size;
        let blank = DynamicImage::ImageRgb8(RgbImage::new(size, size));
        let input = preprocess(&blank, &characteristics)?;

        self.session = Some(session);
        let num_classes = self.run_scores(input)?.len();
        info!("Inferred number of classes from model: {}", num_classes);
        Self::validate_labels(&class_labels, num_classes)?;

        self.model_characteristics = Some(ModelCharacteristics {
            num_classes,
            ..characteristics
        });
        self.model_path = Some(model_path.to_string());
        self.labels_path = Some(labels_path.to_string());
        self.class_labels = Some(class_labels);
        Ok(self)
    }

    /// Builds and returns the final PetClassifier instance
    ///
    /// # Returns
    /// * `Result<PetClassifier, ClassifierError>` - The classifier if successful, or an error if
    ///   no model has been set.
    pub fn build(self) -> Result<PetClassifier, ClassifierError> {
        let (Some(model_path), Some(labels_path)) = (self.model_path, self.labels_path) else {
            return Err(ClassifierError::BuildError("Model and labels paths must be set".to_string()));
        };
        let session = self
            .session
            .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?;
        let class_labels = self
            .class_labels
            .ok_or_else(|| ClassifierError::BuildError("No class labels loaded".into()))?;
        let model_characteristics = self
            .model_characteristics
            .ok_or_else(|| ClassifierError::BuildError("Model characteristics not set".to_string()))?;

        Ok(PetClassifier {
            model_path,
            labels_path,
            session: Arc::new(session),
            class_labels: Arc::new(class_labels),
            model_characteristics,
        })
    }

    fn load_labels(path: &Path) -> Result<Vec<String>, ClassifierError> {
        let text = fs::read_to_string(path).map_err(|e| {
            error!("Failed to read labels file {:?}: {}", path, e);
            ClassifierError::LabelsError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let labels = parse_class_labels(&text);
        info!("Loaded {} class labels from {:?}", labels.len(), path);
        Ok(labels)
    }

    fn validate_labels(labels: &[String], num_classes: usize) -> Result<(), ClassifierError> {
        if labels.len() != num_classes {
            return Err(ClassifierError::LabelsError(format!(
                "Label file has {} entries but the model scores {} classes",
                labels.len(),
                num_classes
            )));
        }
        Ok(())
    }

    /// Validates that the model has the expected input/output structure
    ///
    /// # Returns
    /// * `Result<(), ClassifierError>` - Ok if validation passes, or an error if:
    ///   - The model doesn't have an image input tensor
    ///   - The model doesn't have any output tensors
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        if session.inputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 input for the image tensor".to_string(),
            ));
        }
        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for class scores".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_synset_labels() {
        let text = "n01440764 tench, Tinca tinca\nn02088364 beagle\n\n";
        assert_eq!(parse_class_labels(text), vec!["tench, tinca tinca", "beagle"]);
    }

    #[test]
    fn test_parse_plain_labels() {
        let text = "Walker hound, Walker foxhound\n  tabby, tabby cat  \n";
        assert_eq!(
            parse_class_labels(text),
            vec!["walker hound, walker foxhound", "tabby, tabby cat"]
        );
    }

    #[test]
    fn test_build_without_model_fails() {
        let result = ClassifierBuilder::new().build();
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_missing_architecture_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = ClassifierBuilder::new()
            .with_models_dir(dir.path())
            .with_architecture(Architecture::Resnet);
        assert!(matches!(result, Err(ClassifierError::BuildError(msg)) if msg.contains("not downloaded")));
    }

    #[test]
    fn test_unhashed_model_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        let model_path = manager.get_model_path(Architecture::Resnet);
        std::fs::create_dir_all(model_path.parent().unwrap()).unwrap();
        std::fs::write(&model_path, b"onnx").unwrap();
        std::fs::write(manager.get_labels_path(Architecture::Resnet), "beagle\n").unwrap();

        let result = ClassifierBuilder::new()
            .with_models_dir(dir.path())
            .with_architecture(Architecture::Resnet);
        assert!(matches!(result, Err(ClassifierError::BuildError(msg)) if msg.contains("not downloaded")));
    }

    #[test]
    fn test_tampered_model_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        let model_path = manager.get_model_path(Architecture::Resnet);
        let labels_path = manager.get_labels_path(Architecture::Resnet);
        std::fs::create_dir_all(model_path.parent().unwrap()).unwrap();
        std::fs::write(&model_path, b"onnx").unwrap();
        std::fs::write(&labels_path, "beagle\n").unwrap();
        manager.record_hash(&model_path).unwrap();
        manager.record_hash(&labels_path).unwrap();
        std::fs::write(&model_path, b"replaced").unwrap();

        let result = ClassifierBuilder::new()
            .with_models_dir(dir.path())
            .with_architecture(Architecture::Resnet);
        assert!(matches!(result, Err(ClassifierError::BuildError(msg)) if msg.contains("not verified")));
    }

    #[test]
    fn test_custom_model_paths_validated() {
        let characteristics = Architecture::Resnet.characteristics();
        assert!(ClassifierBuilder::new()
            .with_custom_model("", "labels.txt", characteristics.clone())
            .is_err());
        assert!(ClassifierBuilder::new()
            .with_custom_model("/nonexistent/model.onnx", "/nonexistent/labels.txt", characteristics)
            .is_err());
    }

    #[test]
    fn test_label_count_must_match_model() {
        let labels = vec!["a".to_string(), "b".to_string()];
        assert!(ClassifierBuilder::validate_labels(&labels, 2).is_ok());
        assert!(matches!(
            ClassifierBuilder::validate_labels(&labels, 1000),
            Err(ClassifierError::LabelsError(_))
        ));
    }
}
