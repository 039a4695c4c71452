use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Pipeline;

/// Leading bytes of every artifact file.
pub const ARTIFACT_MAGIC: [u8; 8] = *b"TABFRST\0";
/// Current on-disk layout version.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Failed to encode artifact: {0}")]
    EncodeError(#[from] bincode::error::EncodeError),
    #[error("Failed to decode artifact: {0}")]
    DecodeError(#[from] bincode::error::DecodeError),
    #[error("File is not a tabforest artifact")]
    BadMagic,
    #[error("Unsupported artifact format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    magic: [u8; 8],
    format_version: u32,
    sha256: String,
    payload: Vec<u8>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Encodes `pipeline` and writes it to `path`.
///
/// The bytes go to a sibling temporary file first and are renamed into place,
/// so a concurrent reader sees either the old artifact or the new one.
pub(crate) fn write_artifact(pipeline: &Pipeline, path: &Path) -> Result<(), ArtifactError> {
    let config = bincode::config::standard();
    let payload = bincode::serde::encode_to_vec(pipeline, config)?;
    let envelope = Envelope {
        magic: ARTIFACT_MAGIC,
        format_version: FORMAT_VERSION,
        sha256: sha256_hex(&payload),
        payload,
    };
    let bytes = bincode::serde::encode_to_vec(&envelope, config)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    log::debug!("Writing {} bytes to {:?}", bytes.len(), tmp_path);
    fs::write(&tmp_path, &bytes)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    log::info!("Saved artifact to {:?} (sha256 {})", path, envelope.sha256);
    Ok(())
}

fn read_envelope(path: &Path) -> Result<Envelope, ArtifactError> {
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ArtifactError::NotFound(path.display().to_string()),
        _ => ArtifactError::IoError(e),
    })?;

    let (envelope, _): (Envelope, usize) =
        bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).map_err(|e| {
            if bytes.len() < ARTIFACT_MAGIC.len() || !bytes.starts_with(&ARTIFACT_MAGIC) {
                ArtifactError::BadMagic
            } else {
                ArtifactError::DecodeError(e)
            }
        })?;

    if envelope.magic != ARTIFACT_MAGIC {
        return Err(ArtifactError::BadMagic);
    }
    if envelope.format_version != FORMAT_VERSION {
        return Err(ArtifactError::UnsupportedVersion {
            found: envelope.format_version,
            expected: FORMAT_VERSION,
        });
    }
    Ok(envelope)
}

/// Reads, verifies and decodes an artifact written by [`write_artifact`].
pub(crate) fn read_artifact(path: &Path) -> Result<Pipeline, ArtifactError> {
    log::info!("Loading artifact from {:?}", path);
    let envelope = read_envelope(path)?;

    let actual = sha256_hex(&envelope.payload);
    if actual != envelope.sha256 {
        log::error!("Artifact hash mismatch: expected {}, got {}", envelope.sha256, actual);
        return Err(ArtifactError::HashMismatch {
            expected: envelope.sha256,
            actual,
        });
    }

    let (pipeline, _): (Pipeline, usize) =
        bincode::serde::decode_from_slice(&envelope.payload, bincode::config::standard())?;
    Ok(pipeline)
}

/// A directory of named pipeline artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    artifacts_dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a new ArtifactStore with the default artifacts directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_artifacts_dir())
    }

    /// Returns the default artifacts directory path
    pub fn get_default_artifacts_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("TABFOREST_HOME") {
            return PathBuf::from(path).join("artifacts");
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("tabforest").join("artifacts");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".local").join("share").join("tabforest").join("artifacts");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("tabforest").join("artifacts")
    }

    pub fn new<P: AsRef<Path>>(artifacts_dir: P) -> io::Result<Self> {
        let artifacts_dir = artifacts_dir.as_ref().to_path_buf();
        fs::create_dir_all(&artifacts_dir)?;
        Ok(Self { artifacts_dir })
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.artifacts_dir.join(format!("{}.bin", name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.artifact_path(name).exists()
    }

    pub fn save(&self, name: &str, pipeline: &Pipeline) -> Result<PathBuf, ArtifactError> {
        let path = self.artifact_path(name);
        write_artifact(pipeline, &path)?;
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<Pipeline, ArtifactError> {
        read_artifact(&self.artifact_path(name))
    }

    /// Checks the stored checksum against the payload without decoding the
    /// pipeline. A missing artifact verifies as `false`.
    pub fn verify(&self, name: &str) -> Result<bool, ArtifactError> {
        let path = self.artifact_path(name);
        if !path.exists() {
            log::info!("Artifact {:?} does not exist", path);
            return Ok(false);
        }
        let envelope = match read_envelope(&path) {
            Ok(envelope) => envelope,
            Err(ArtifactError::BadMagic) | Err(ArtifactError::DecodeError(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        let ok = sha256_hex(&envelope.payload) == envelope.sha256;
        log::info!("Artifact {:?} hash verification: {}", path, ok);
        Ok(ok)
    }

    pub fn remove(&self, name: &str) -> Result<(), ArtifactError> {
        let path = self.artifact_path(name);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Record, Schema};

    fn small_pipeline() -> Pipeline {
        let records = vec![
            Record::new().with("age", 20.0).with("color", "red"),
            Record::new().with("age", 70.0).with("color", "blue"),
            Record::new().with("age", 30.0).with("color", "red"),
            Record::new().with("age", 80.0).with("color", "blue"),
        ];
        let labels: Vec<String> = ["young", "old", "young", "old"].iter().map(|s| s.to_string()).collect();
        Pipeline::builder()
            .with_schema(Schema::new(vec!["age"], vec!["color"], "label").unwrap())
            .with_n_estimators(5)
            .with_seed(9)
            .fit(&records, &labels)
            .unwrap()
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("artifacts")).unwrap();
        let pipeline = small_pipeline();

        assert!(!store.exists("model"));
        let path = store.save("model", &pipeline).unwrap();
        assert!(path.ends_with("model.bin"));
        assert!(store.exists("model"));
        assert!(store.verify("model").unwrap());

        let loaded = store.load("model").unwrap();
        assert_eq!(loaded.forest(), pipeline.forest());
        assert_eq!(loaded.transform_params(), pipeline.transform_params());

        store.remove("model").unwrap();
        assert!(!store.exists("model"));
        assert!(!store.verify("model").unwrap());
    }

    #[test]
    fn test_corrupted_payload_fails_hash_check() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let path = store.save("model", &small_pipeline()).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(&path, &bytes).unwrap();

        assert!(!store.verify("model").unwrap());
        assert!(matches!(store.load("model"), Err(ArtifactError::HashMismatch { .. })));
    }

    #[test]
    fn test_garbage_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        fs::write(store.artifact_path("junk"), b"corrupted data").unwrap();
        assert!(matches!(store.load("junk"), Err(ArtifactError::BadMagic)));
    }

    #[test]
    fn test_newer_format_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.bin");
        let payload = bincode::serde::encode_to_vec(&small_pipeline(), bincode::config::standard()).unwrap();
        let envelope = Envelope {
            magic: ARTIFACT_MAGIC,
            format_version: FORMAT_VERSION + 1,
            sha256: sha256_hex(&payload),
            payload,
        };
        let bytes = bincode::serde::encode_to_vec(&envelope, bincode::config::standard()).unwrap();
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            Pipeline::load(&path),
            Err(ArtifactError::UnsupportedVersion { found: 2, expected: 1 })
        ));
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        assert!(matches!(store.load("absent"), Err(ArtifactError::NotFound(_))));
    }

    #[test]
    fn test_default_artifacts_dir() {
        // Test with environment variable
        env::set_var("TABFOREST_HOME", "/tmp/tabforest-test-home");
        let path = ArtifactStore::get_default_artifacts_dir();
        assert!(path.ends_with("tabforest-test-home/artifacts"));
        env::remove_var("TABFOREST_HOME");

        // Test without environment variable
        let path = ArtifactStore::get_default_artifacts_dir();
        assert!(path.ends_with("tabforest/artifacts"));
    }
}
