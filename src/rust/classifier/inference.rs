use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;
use std::collections::HashMap;
use std::path::Path;

use super::error::ClassifierError;
use crate::models::{ModelCharacteristics, Preprocessing};

/// Turns an image into the `[1, 3, size, size]` tensor an ImageNet CNN expects.
///
/// The shorter side is scaled to `size * 256 / 224` (256 for the usual 224
/// input), then the centre `size x size` square is cropped out. Channel order
/// and value scaling follow `characteristics.preprocessing`.
pub fn preprocess(image: &DynamicImage, characteristics: &ModelCharacteristics) -> Result<Array4<f32>, ClassifierError> {
    let size = characteristics.input_size;
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ClassifierError::ImageError("Image has zero width or height".into()));
    }

    let short_side = (size * 256 / 224).max(size);
    let (resized_w, resized_h) = if width <= height {
        let h = (height as u64 * short_side as u64 / width as u64) as u32;
        (short_side, h.max(size))
    } else {
        let w = (width as u64 * short_side as u64 / height as u64) as u32;
        (w.max(size), short_side)
    };

    let resized = image.resize_exact(resized_w, resized_h, FilterType::Triangle);
    let left = (resized_w - size) / 2;
    let top = (resized_h - size) / 2;
    let rgb = resized.crop_imm(left, top, size, size).to_rgb8();

    let side = size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, side, side));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        match characteristics.preprocessing {
            Preprocessing::ImageNetNormalized { mean, std } => {
                for c in 0..3 {
                    tensor[[0, c, y, x]] = (pixel[c] as f32 / 255.0 - mean[c]) / std[c];
                }
            }
            Preprocessing::CaffeBgr { mean } => {
                for c in 0..3 {
                    // output channel c reads the reversed RGB channel
                    tensor[[0, c, y, x]] = pixel[2 - c] as f32 - mean[c];
                }
            }
        }
    }

    Ok(tensor)
}

/// Runs an ONNX image classification model on preprocessed images.
///
/// The model is expected to:
/// - Accept one float input of shape `[1, 3, H, W]`
/// - Produce one output holding `num_classes` scores (logits or probabilities)
pub(crate) trait ImageInference {
    /// Returns the initialized ONNX session if available
    fn session(&self) -> Option<&Session>;

    /// Returns the input geometry and preprocessing of the loaded model
    fn characteristics(&self) -> Option<&ModelCharacteristics>;

    /// Opens and preprocesses the image at `path`.
    fn load_image(&self, path: &Path) -> Result<Array4<f32>, ClassifierError> {
        let characteristics = self
            .characteristics()
            .ok_or_else(|| ClassifierError::ModelError("Model characteristics not set".into()))?;
        let image = image::open(path)
            .map_err(|e| ClassifierError::ImageError(format!("Failed to open {}: {}", path.display(), e)))?;
        preprocess(&image, characteristics)
    }

    /// Feeds one input tensor through the model and returns the flattened scores.
    ///
    /// # Errors
    /// - `ModelError` if the session is not initialized
    /// - `ModelError` if tensor creation or model execution fails
    /// - `PredictionError` if the output cannot be read as f32 scores
    fn run_scores(&self, input: Array4<f32>) -> Result<Vec<f32>, ClassifierError> {
        let session = self
            .session()
            .ok_or_else(|| ClassifierError::ModelError("Session not initialized".into()))?;
        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| ClassifierError::ModelError("Model has no inputs".into()))?;

        let input_dyn = input.into_dyn();
        let input_view = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            input_name,
            Tensor::from_array(&input_view)
                .map_err(|e| ClassifierError::ModelError(format!("Failed to create input tensor: {}", e)))?,
        );

        let outputs = session
            .run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to extract output tensor: {}", e)))?;

        Ok(output_tensor.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Architecture;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_preprocess_shape_for_landscape_image() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 320, Rgb([255, 0, 0])));
        let tensor = preprocess(&image, &Architecture::Vgg.characteristics()).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_preprocess_imagenet_normalization() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 400, Rgb([255, 0, 0])));
        let tensor = preprocess(&image, &Architecture::Resnet.characteristics()).unwrap();
        let red = (1.0 - 0.485) / 0.229;
        let green = (0.0 - 0.456) / 0.224;
        assert!((tensor[[0, 0, 100, 100]] - red).abs() < 1e-4);
        assert!((tensor[[0, 1, 100, 100]] - green).abs() < 1e-4);
    }

    #[test]
    fn test_preprocess_caffe_is_bgr() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(256, 256, Rgb([10, 20, 200])));
        let tensor = preprocess(&image, &Architecture::Alexnet.characteristics()).unwrap();
        assert!((tensor[[0, 0, 0, 0]] - (200.0 - 103.939)).abs() < 1e-3);
        assert!((tensor[[0, 2, 0, 0]] - (10.0 - 123.68)).abs() < 1e-3);
    }

    #[test]
    fn test_preprocess_small_image_is_upscaled() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 30, Rgb([0, 0, 0])));
        let tensor = preprocess(&image, &Architecture::Vgg.characteristics()).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }
}
