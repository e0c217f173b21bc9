use std::fmt;
use std::str::FromStr;

const LABELS_URL: &str =
    "https://github.com/onnx/models/raw/main/validated/vision/classification/synset.txt";

/// The CNN architectures a pet image can be classified with.
///
/// Each variant maps to an ONNX export of the ImageNet-trained network
/// published in the ONNX model zoo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Architecture {
    /// ResNet-18 (v1)
    ///
    /// Characteristics:
    /// - Input: 224x224 RGB, ImageNet mean/std normalization
    /// - Size: ~45MB
    Resnet,
    /// AlexNet (BVLC Caffe release)
    ///
    /// Characteristics:
    /// - Input: 224x224 BGR, mean subtraction
    /// - Size: ~233MB
    Alexnet,
    /// VGG-16
    ///
    /// Characteristics:
    /// - Input: 224x224 RGB, ImageNet mean/std normalization
    /// - Size: ~528MB
    /// - Slowest, usually the most accurate of the three
    Vgg,
}

/// How raw pixels are turned into model input values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Preprocessing {
    /// RGB channel order, values scaled to 0..1, then `(x - mean) / std`
    ImageNetNormalized { mean: [f32; 3], std: [f32; 3] },
    /// BGR channel order, values in 0..255 with a per-channel mean subtracted
    CaffeBgr { mean: [f32; 3] },
}

impl Preprocessing {
    pub const IMAGENET: Preprocessing = Preprocessing::ImageNetNormalized {
        mean: [0.485, 0.456, 0.406],
        std: [0.229, 0.224, 0.225],
    };

    pub const CAFFE: Preprocessing = Preprocessing::CaffeBgr {
        mean: [103.939, 116.779, 123.68],
    };
}

/// Characteristics of a model including its input geometry and output size
#[derive(Debug, Clone)]
pub struct ModelCharacteristics {
    /// Width and height of the square input image
    pub input_size: u32,
    /// Number of classes the model scores
    pub num_classes: usize,
    /// Approximate size of the model file
    pub model_size_mb: usize,
    pub preprocessing: Preprocessing,
}

/// Where a built-in model's files are fetched from
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    pub labels_url: String,
}

impl Architecture {
    pub const ALL: [Architecture; 3] = [Architecture::Resnet, Architecture::Alexnet, Architecture::Vgg];

    /// The identifier used on the command line and in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resnet => "resnet",
            Self::Alexnet => "alexnet",
            Self::Vgg => "vgg",
        }
    }

    /// Get the characteristics of the model
    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            Self::Resnet => ModelCharacteristics {
                input_size: 224,
                num_classes: 1000,
                model_size_mb: 45,
                preprocessing: Preprocessing::IMAGENET,
            },
            Self::Alexnet => ModelCharacteristics {
                input_size: 224,
                num_classes: 1000,
                model_size_mb: 233,
                preprocessing: Preprocessing::CAFFE,
            },
            Self::Vgg => ModelCharacteristics {
                input_size: 224,
                num_classes: 1000,
                model_size_mb: 528,
                preprocessing: Preprocessing::IMAGENET,
            },
        }
    }

    pub fn get_model_info(&self) -> ModelInfo {
        let model_url = match self {
            Self::Resnet => "https://github.com/onnx/models/raw/main/validated/vision/classification/resnet/model/resnet18-v1-7.onnx",
            Self::Alexnet => "https://github.com/onnx/models/raw/main/validated/vision/classification/alexnet/model/bvlcalexnet-12.onnx",
            Self::Vgg => "https://github.com/onnx/models/raw/main/validated/vision/classification/vgg/model/vgg16-7.onnx",
        };
        ModelInfo {
            name: self.as_str().to_string(),
            model_url: model_url.to_string(),
            labels_url: LABELS_URL.to_string(),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|arch| arch.as_str() == wanted)
            .ok_or_else(|| format!("Unknown architecture '{}' (expected one of: resnet, alexnet, vgg)", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_architecture() {
        assert_eq!("vgg".parse::<Architecture>(), Ok(Architecture::Vgg));
        assert_eq!(" ResNet ".parse::<Architecture>(), Ok(Architecture::Resnet));
        assert!("googlenet".parse::<Architecture>().is_err());
    }

    #[test]
    fn test_model_characteristics() {
        for arch in Architecture::ALL {
            let characteristics = arch.characteristics();
            assert_eq!(characteristics.input_size, 224);
            assert_eq!(characteristics.num_classes, 1000);
        }
        assert_eq!(Architecture::Alexnet.characteristics().preprocessing, Preprocessing::CAFFE);
    }

    #[test]
    fn test_model_info_names_match_cli_values() {
        for arch in Architecture::ALL {
            let info = arch.get_model_info();
            assert_eq!(info.name, arch.to_string());
            assert!(info.model_url.ends_with(".onnx"));
        }
    }
}
