use thiserror::Error;

/// Represents the different types of errors that can occur while fitting or
/// applying a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A declared field is absent from every record of a training batch
    #[error("Schema error: field '{field}' is missing from every training record")]
    SchemaError { field: String },
    /// A field the fitted transformer expects is absent from a prediction batch
    #[error("Schema mismatch: field '{field}' is expected by the fitted pipeline but missing from the input")]
    SchemaMismatchError { field: String },
    /// Error occurred during the build phase
    #[error("Build error: {0}")]
    BuildError(String),
    /// Error occurred while making predictions
    #[error("Prediction error: {0}")]
    PredictionError(String),
    /// Error occurred due to invalid input parameters
    #[error("Validation error: {0}")]
    ValidationError(String),
    /// Error occurred while reading a training file
    #[error("Data error: {0}")]
    DataError(String),
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::DataError(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for PipelineError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        PipelineError::BuildError(format!("Failed to create training thread pool: {}", err))
    }
}
