use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use tokio::sync::RwLock;

use crate::artifact::ArtifactError;
use crate::{Pipeline, PipelineInfo};

/// The pipeline currently in service plus the artifact it came from.
///
/// Readers clone the inner `Arc` and release the lock immediately, so
/// inference never runs under the lock. [`ModelHandle::reload`] fully loads
/// the replacement before swapping it in; a failed reload leaves the current
/// pipeline untouched.
#[derive(Debug)]
pub struct ModelHandle {
    artifact_path: PathBuf,
    current: RwLock<Arc<Pipeline>>,
}

impl ModelHandle {
    /// Loads the artifact at `path`. Intended to run once at process start.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let artifact_path = path.as_ref().to_path_buf();
        let pipeline = Pipeline::load(&artifact_path)?;
        Ok(Self::from_pipeline(pipeline, artifact_path))
    }

    /// Wraps an already loaded pipeline; `artifact_path` is used by later reloads.
    pub fn from_pipeline(pipeline: Pipeline, artifact_path: impl Into<PathBuf>) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            current: RwLock::new(Arc::new(pipeline)),
        }
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    pub async fn current(&self) -> Arc<Pipeline> {
        Arc::clone(&*self.current.read().await)
    }

    /// Re-reads the artifact and atomically replaces the pipeline in service.
    pub async fn reload(&self) -> Result<PipelineInfo, ArtifactError> {
        let path = self.artifact_path.clone();
        let pipeline = tokio::task::spawn_blocking(move || Pipeline::load(&path))
            .await
            .map_err(|e| ArtifactError::IoError(io::Error::other(e)))??;

        let info = pipeline.info();
        *self.current.write().await = Arc::new(pipeline);
        info!("Reloaded pipeline from {:?}", self.artifact_path);
        Ok(info)
    }
}
