use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// How many candidate features each split considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// `floor(sqrt(n_features))`
    Sqrt,
    /// `floor(log2(n_features))`
    Log2,
    /// Every feature, i.e. plain bagging
    All,
    /// A fixed count, capped at the number of features
    Count(usize),
}

impl MaxFeatures {
    /// Resolves the subset size for a matrix with `n_features` columns; always at least 1.
    pub fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            Self::Sqrt => (n_features as f64).sqrt().floor() as usize,
            Self::Log2 => (n_features as f64).log2().floor() as usize,
            Self::All => n_features,
            Self::Count(k) => k.min(n_features),
        };
        n.max(1)
    }
}

/// Hyperparameters of the random forest. Fixed configuration, never learned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub n_estimators: usize,
    /// Maximum depth of each tree; `None` grows until leaves are pure
    pub max_depth: Option<usize>,
    /// Worker threads used while training (0 = let rayon decide)
    pub n_jobs: usize,
    /// Minimum number of samples a node needs before it may split
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
    /// Train each tree on a bootstrap resample of the training rows
    pub bootstrap: bool,
    /// Master seed; `None` draws one from the OS at fit time
    pub seed: Option<u64>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            max_depth: Some(20),
            n_jobs: 4,
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: None,
        }
    }
}

impl ForestConfig {
    pub(crate) fn validate(&self) -> Result<(), PipelineError> {
        if self.n_estimators == 0 {
            return Err(PipelineError::ValidationError("n_estimators must be at least 1".into()));
        }
        if self.max_depth == Some(0) {
            return Err(PipelineError::ValidationError("max_depth must be at least 1".into()));
        }
        if self.min_samples_split < 2 {
            return Err(PipelineError::ValidationError("min_samples_split must be at least 2".into()));
        }
        if self.max_features == MaxFeatures::Count(0) {
            return Err(PipelineError::ValidationError("max_features must be at least 1".into()));
        }
        Ok(())
    }
}
