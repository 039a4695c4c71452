use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::PipelineError;
use super::PipelineInfo;
use crate::artifact::{self, ArtifactError};
use crate::forest::RandomForest;
use crate::metrics::ClassificationReport;
use crate::preprocess::FittedTransformParams;
use crate::Record;

/// A fitted preprocessing + random forest pipeline.
///
/// The pipeline is immutable after fitting and is automatically `Send + Sync`,
/// so one loaded instance can serve any number of concurrent callers:
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use tabforest::{Pipeline, Record, Schema};
/// use std::sync::Arc;
/// use std::thread;
///
/// let schema = Schema::new(vec!["age"], vec!["color"], "label")?;
/// let records = vec![
///     Record::new().with("age", 20.0).with("color", "red"),
///     Record::new().with("age", 60.0).with("color", "blue"),
/// ];
/// let labels = vec!["young".to_string(), "old".to_string()];
///
/// let pipeline = Arc::new(
///     Pipeline::builder()
///         .with_schema(schema)
///         .with_n_estimators(5)
///         .with_seed(7)
///         .fit(&records, &labels)?,
/// );
///
/// let shared = Arc::clone(&pipeline);
/// thread::spawn(move || {
///     shared.predict(&[Record::new().with("age", 25.0).with("color", "red")]).unwrap();
/// })
/// .join()
/// .unwrap();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub(crate) transform: FittedTransformParams,
    pub(crate) forest: RandomForest,
    #[serde(skip)]
    pub(crate) validation_report: Option<ClassificationReport>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Pipeline>();
    }
};

impl Pipeline {
    /// Creates a new PipelineBuilder for fluent construction
    pub fn builder() -> super::builder::PipelineBuilder {
        super::builder::PipelineBuilder::new()
    }

    /// Predicts one label per record, in input order.
    ///
    /// Only the frozen parameters are used: unseen categories and missing
    /// values are encoded, never learned.
    ///
    /// # Errors
    /// - `SchemaMismatchError` if a field the pipeline was fitted on is absent
    ///   from every record
    ///
    /// # Example
    /// ```rust
    /// # use tabforest::{Pipeline, Record, Schema, FieldValue};
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let pipeline = Pipeline::builder()
    /// #     .with_schema(Schema::new(vec!["age"], vec!["color"], "label")?)
    /// #     .with_n_estimators(3)
    /// #     .with_seed(1)
    /// #     .fit(
    /// #         &[Record::new().with("age", 1.0).with("color", "red"),
    /// #           Record::new().with("age", 9.0).with("color", "blue")],
    /// #         &["a".to_string(), "b".to_string()],
    /// #     )?;
    /// let record = Record::new().with("color", "green").with("age", FieldValue::Missing);
    /// let labels = pipeline.predict(&[record])?;
    /// assert_eq!(labels.len(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn predict(&self, records: &[Record]) -> Result<Vec<String>, PipelineError> {
        let features = self.transform.transform(records)?;
        self.forest.predict(features.view())
    }

    /// Like [`Pipeline::predict`] but also returns every class probability per record.
    pub fn predict_with_scores(
        &self,
        records: &[Record],
    ) -> Result<Vec<(String, HashMap<String, f64>)>, PipelineError> {
        let features = self.transform.transform(records)?;
        features
            .rows()
            .into_iter()
            .map(|row| self.forest.score(row))
            .collect()
    }

    /// Returns information about the pipeline's fitted state
    pub fn info(&self) -> PipelineInfo {
        let config = self.forest.config();
        PipelineInfo {
            numeric_fields: self.transform.numeric_fields().to_vec(),
            categorical_fields: self
                .transform
                .categorical_fields()
                .into_iter()
                .map(String::from)
                .collect(),
            n_features: self.transform.n_features(),
            classes: self.forest.classes().to_vec(),
            n_estimators: self.forest.n_trees(),
            max_depth: config.max_depth,
            seed: self.forest.seed(),
        }
    }

    pub fn transform_params(&self) -> &FittedTransformParams {
        &self.transform
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// The held-out evaluation computed at fit time, if a validation split
    /// was configured. Never persisted.
    pub fn validation_report(&self) -> Option<&ClassificationReport> {
        self.validation_report.as_ref()
    }

    /// Writes the pipeline to `path` as a single artifact file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        artifact::write_artifact(self, path.as_ref())
    }

    /// Loads a pipeline previously written with [`Pipeline::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        artifact::read_artifact(path.as_ref())
    }
}
