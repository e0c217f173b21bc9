use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

use crate::models::{Architecture, ModelInfo};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model not downloaded: {0}")]
    NotDownloaded(String),
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Downloads and caches the ONNX model and label file of each architecture.
///
/// The model zoo does not publish checksums, so after a download the SHA-256
/// of each file is recorded in a `<file>.sha256` sidecar. Verification later
/// compares the cached file against that record.
#[derive(Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".sha256");
    PathBuf::from(name)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("PET_CLASSIFIER_CACHE") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific cache directory
        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("pet-classifier").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("pet-classifier").join("models");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("pet-classifier").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_path(&self, architecture: Architecture) -> PathBuf {
        let info = architecture.get_model_info();
        self.models_dir.join(info.name).join("model.onnx")
    }

    pub fn get_labels_path(&self, architecture: Architecture) -> PathBuf {
        let info = architecture.get_model_info();
        self.models_dir.join(info.name).join("labels.txt")
    }

    /// Whether both files and their recorded hashes are in the cache. Files
    /// that were never hashed by a download do not count.
    pub fn is_model_downloaded(&self, architecture: Architecture) -> bool {
        let model_path = self.get_model_path(architecture);
        let labels_path = self.get_labels_path(architecture);
        log::debug!("Model path: {:?} (exists: {})", model_path, model_path.exists());
        log::debug!("Labels path: {:?} (exists: {})", labels_path, labels_path.exists());
        [model_path, labels_path]
            .iter()
            .all(|path| path.exists() && sidecar_path(path).exists())
    }

    pub async fn download_model(&self, architecture: Architecture) -> Result<(), ModelError> {
        let info = architecture.get_model_info();
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&info.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        let model_path = self.get_model_path(architecture);
        let model_result = self.fetch_unless_verified(&info.model_url, &model_path, "model").await;

        let labels_path = self.get_labels_path(architecture);
        let labels_result = self.fetch_unless_verified(&info.labels_url, &labels_path, "labels").await;

        match (model_result, labels_result) {
            (Ok(()), Ok(())) => {
                log::info!("Model '{}' ready to use", architecture);
                Ok(())
            }
            (Err(e), _) => {
                log::error!("Failed to set up model file: {}", e);
                let _ = self.remove_download(architecture);
                Err(e)
            }
            (_, Err(e)) => {
                log::error!("Failed to set up labels file: {}", e);
                let _ = self.remove_download(architecture);
                Err(e)
            }
        }
    }

    async fn fetch_unless_verified(&self, url: &str, path: &Path, file_type: &str) -> Result<(), ModelError> {
        if path.exists() {
            log::info!("{} file exists at {:?}, verifying...", file_type, path);
            if self.verify_file(path)? {
                log::info!("Existing {} file verified successfully", file_type);
                return Ok(());
            }
            log::warn!("{} file verification failed, redownloading", file_type);
        }
        self.download_and_record_file(url, path, file_type).await
    }

    /// Checks a cached file against its recorded hash. A file without a
    /// sidecar does not verify.
    fn verify_file(&self, path: &Path) -> Result<bool, ModelError> {
        let sidecar = sidecar_path(path);
        if !path.exists() || !sidecar.exists() {
            return Ok(false);
        }
        let expected = fs::read_to_string(&sidecar)?.trim().to_string();
        let actual = sha256_hex(&fs::read(path)?);
        log::debug!("Verifying {:?}: expected {}, got {}", path, expected, actual);
        Ok(actual == expected)
    }

    /// Records the current hash of a cached file in its sidecar.
    pub(crate) fn record_hash(&self, path: &Path) -> Result<String, ModelError> {
        let hash = sha256_hex(&fs::read(path)?);
        fs::write(sidecar_path(path), format!("{}\n", hash))?;
        Ok(hash)
    }

    pub fn verify_model(&self, architecture: Architecture) -> Result<bool, ModelError> {
        let model_path = self.get_model_path(architecture);
        let labels_path = self.get_labels_path(architecture);

        if !model_path.exists() || !labels_path.exists() {
            log::info!("One or both files of '{}' do not exist", architecture);
            return Ok(false);
        }

        let model_ok = self.verify_file(&model_path)?;
        let labels_ok = self.verify_file(&labels_path)?;
        log::info!("Verification of '{}': model={}, labels={}", architecture, model_ok, labels_ok);

        Ok(model_ok && labels_ok)
    }

    async fn download_and_record_file(&self, url: &str, path: &Path, file_type: &str) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?.error_for_status()?;
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if bytes.is_empty() {
            return Err(ModelError::VerificationFailed);
        }
        let downloaded_hash = sha256_hex(&bytes);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        let written_hash = self.record_hash(path)?;
        if written_hash != downloaded_hash {
            log::error!("{} hash mismatch: expected {}, got {}", file_type, downloaded_hash, written_hash);
            return Err(ModelError::HashMismatch {
                file_type: file_type.to_string(),
                expected: downloaded_hash,
                actual: written_hash,
            });
        }

        log::info!("{} file downloaded and recorded successfully", file_type);
        Ok(())
    }

    pub fn remove_download(&self, architecture: Architecture) -> Result<(), ModelError> {
        for path in [self.get_model_path(architecture), self.get_labels_path(architecture)] {
            let sidecar = sidecar_path(&path);
            if path.exists() {
                fs::remove_file(&path)?;
            }
            if sidecar.exists() {
                fs::remove_file(&sidecar)?;
            }
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, architecture: Architecture) -> Result<(), ModelError> {
        log::info!("Checking if model '{}' is downloaded...", architecture);
        if !self.is_model_downloaded(architecture) {
            log::info!("Model not found, downloading...");
            self.download_model(architecture).await?;
        } else if !self.verify_model(architecture)? {
            log::info!("Model verification failed, re-downloading...");
            self.remove_download(architecture)?;
            self.download_model(architecture).await?;
        } else {
            log::info!("Model verification successful");
        }

        if !self.is_model_downloaded(architecture) {
            return Err(ModelError::NotDownloaded(architecture.to_string()));
        }
        Ok(())
    }

    /// Info for every architecture, paired with whether it is cached locally.
    pub fn list_models(&self) -> Vec<(ModelInfo, bool)> {
        Architecture::ALL
            .into_iter()
            .map(|arch| (arch.get_model_info(), self.is_model_downloaded(arch)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_model(manager: &ModelManager, architecture: Architecture) {
        let model_path = manager.get_model_path(architecture);
        let labels_path = manager.get_labels_path(architecture);
        fs::create_dir_all(model_path.parent().unwrap()).unwrap();
        fs::write(&model_path, b"onnx bytes").unwrap();
        fs::write(&labels_path, "n02088364 beagle\n").unwrap();
        manager.record_hash(&model_path).unwrap();
        manager.record_hash(&labels_path).unwrap();
    }

    #[test]
    fn test_default_models_dir() {
        env::set_var("PET_CLASSIFIER_CACHE", "/tmp/test-pet-cache");
        let path = ModelManager::get_default_models_dir();
        assert_eq!(path, PathBuf::from("/tmp/test-pet-cache/models"));
        env::remove_var("PET_CLASSIFIER_CACHE");

        let path = ModelManager::get_default_models_dir();
        assert!(path.ends_with("pet-classifier/models"));
    }

    #[test]
    fn test_paths_per_architecture() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        assert_eq!(manager.get_model_path(Architecture::Vgg), dir.path().join("vgg/model.onnx"));
        assert_eq!(manager.get_labels_path(Architecture::Resnet), dir.path().join("resnet/labels.txt"));
        assert!(!manager.is_model_downloaded(Architecture::Alexnet));
    }

    #[test]
    fn test_verification_uses_recorded_hash() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        assert!(!manager.verify_model(Architecture::Resnet).unwrap());

        seed_model(&manager, Architecture::Resnet);
        assert!(manager.is_model_downloaded(Architecture::Resnet));
        assert!(manager.verify_model(Architecture::Resnet).unwrap());

        fs::write(manager.get_model_path(Architecture::Resnet), "corrupted data").unwrap();
        assert!(!manager.verify_model(Architecture::Resnet).unwrap());
    }

    #[test]
    fn test_missing_sidecar_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        seed_model(&manager, Architecture::Vgg);
        fs::remove_file(sidecar_path(&manager.get_labels_path(Architecture::Vgg))).unwrap();
        assert!(!manager.verify_model(Architecture::Vgg).unwrap());
    }

    #[test]
    fn test_remove_download() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        seed_model(&manager, Architecture::Alexnet);
        manager.remove_download(Architecture::Alexnet).unwrap();
        assert!(!manager.is_model_downloaded(Architecture::Alexnet));
        assert!(!sidecar_path(&manager.get_model_path(Architecture::Alexnet)).exists());
    }

    #[test]
    fn test_interrupted_download_is_not_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        seed_model(&manager, Architecture::Resnet);
        // model written but its hash never recorded
        fs::remove_file(sidecar_path(&manager.get_model_path(Architecture::Resnet))).unwrap();
        assert!(!manager.is_model_downloaded(Architecture::Resnet));
        assert!(manager.list_models().iter().all(|(_, cached)| !cached));
    }

    #[test]
    fn test_ensure_verified_model_skips_download() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        seed_model(&manager, Architecture::Vgg);

        let result = tokio_test::block_on(manager.ensure_model_downloaded(Architecture::Vgg));
        assert!(result.is_ok());

        let listed = manager.list_models();
        assert_eq!(listed.len(), 3);
        assert!(listed.iter().any(|(info, cached)| info.name == "vgg" && *cached));
        assert!(listed.iter().any(|(info, cached)| info.name == "resnet" && !*cached));
    }

    #[tokio::test]
    #[ignore = "downloads the ResNet model"]
    async fn test_download_model() -> Result<(), ModelError> {
        let dir = tempfile::tempdir()?;
        let manager = ModelManager::new(dir.path())?;
        manager.download_model(Architecture::Resnet).await?;
        assert!(manager.verify_model(Architecture::Resnet)?);
        Ok(())
    }
}
