use serde::{Deserialize, Serialize};

pub mod builder;
mod error;
#[allow(clippy::module_inception)]
mod pipeline;

pub use builder::PipelineBuilder;
pub use error::PipelineError;
pub use pipeline::Pipeline;

/// Information about the fitted state and configuration of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineInfo {
    /// Numeric input fields, in feature column order
    pub numeric_fields: Vec<String>,
    /// Categorical input fields, in feature block order
    pub categorical_fields: Vec<String>,
    /// Width of the encoded feature vector
    pub n_features: usize,
    /// Labels the classifier can predict, sorted
    pub classes: Vec<String>,
    /// Number of trees in the ensemble
    pub n_estimators: usize,
    /// Maximum tree depth the forest was trained with
    pub max_depth: Option<usize>,
    /// Master seed of the training run
    pub seed: u64,
}
