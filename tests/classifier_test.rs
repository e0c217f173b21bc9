use pet_classifier::classifier::{labels_match, parse_class_labels};
use pet_classifier::{Architecture, ClassifierError, ModelManager, PetClassifier, RuntimeConfig};

#[test]
fn test_undownloaded_model_is_a_build_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = PetClassifier::builder()
        .with_runtime_config(RuntimeConfig::default())
        .with_models_dir(dir.path())
        .with_architecture(Architecture::Alexnet);
    assert!(matches!(result, Err(ClassifierError::BuildError(_))));
}

#[test]
fn test_custom_model_requires_existing_files() {
    let dir = tempfile::tempdir().unwrap();
    let labels = dir.path().join("labels.txt");
    std::fs::write(&labels, "n02088364 beagle\n").unwrap();

    let result = PetClassifier::builder().with_custom_model(
        dir.path().join("missing.onnx").to_str().unwrap(),
        labels.to_str().unwrap(),
        Architecture::Vgg.characteristics(),
    );
    assert!(matches!(result, Err(ClassifierError::BuildError(msg)) if msg.contains("Model file not found")));
}

#[test]
fn test_imagenet_labels_match_pet_labels() {
    let labels = parse_class_labels("n02089867 Walker hound, Walker foxhound\nn02123045 tabby, tabby cat\n");
    assert!(labels_match("walker hound", &labels[0]));
    assert!(!labels_match("cat", &labels[1]));
    assert!(labels_match("tabby cat", &labels[1]));
}

#[tokio::test]
#[ignore = "downloads the ResNet model"]
async fn test_classify_generated_image() -> Result<(), Box<dyn std::error::Error>> {
    let cache = tempfile::tempdir()?;
    let manager = ModelManager::new(cache.path())?;
    manager.ensure_model_downloaded(Architecture::Resnet).await?;

    let classifier = PetClassifier::builder()
        .with_models_dir(cache.path())
        .with_architecture(Architecture::Resnet)?
        .build()?;

    let images = tempfile::tempdir()?;
    let path = images.path().join("noise.png");
    image::RgbImage::from_fn(320, 240, |x, y| image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])).save(&path)?;

    let prediction = classifier.predict(&path)?;
    assert!(prediction.class_index < 1000);
    assert!(!prediction.label.is_empty());
    assert_eq!(prediction.label, prediction.label.to_lowercase());
    Ok(())
}
