use log::info;

use super::error::PipelineError;
use super::pipeline::Pipeline;
use crate::dataset::LabeledDataset;
use crate::forest::{ForestConfig, RandomForest};
use crate::metrics::ClassificationReport;
use crate::preprocess::FeatureTransformer;
use crate::{Record, Schema};

/// Seed for the validation split when the forest itself is unseeded.
const DEFAULT_SPLIT_SEED: u64 = 0;

/// A builder for fitting a [`Pipeline`] with a fluent interface.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    schema: Schema,
    forest_config: ForestConfig,
    validation_split: Option<f64>,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    /// Creates a builder for the census income schema with the default
    /// forest configuration and no validation split
    ///
    /// # Example
    /// ```
    /// use tabforest::PipelineBuilder;
    ///
    /// let builder = PipelineBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            schema: Schema::census_income(),
            forest_config: ForestConfig::default(),
            validation_split: None,
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_forest_config(mut self, config: ForestConfig) -> Self {
        self.forest_config = config;
        self
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.forest_config.n_estimators = n_estimators;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.forest_config.max_depth = max_depth;
        self
    }

    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.forest_config.n_jobs = n_jobs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.forest_config.seed = Some(seed);
        self
    }

    /// Holds out `fraction` of the training rows to compute a
    /// [`ClassificationReport`]. The held-out rows are not used for fitting.
    pub fn with_validation_split(mut self, fraction: f64) -> Self {
        self.validation_split = Some(fraction);
        self
    }

    /// Fits the transformer and the forest on a labeled dataset.
    pub fn fit_dataset(self, dataset: &LabeledDataset) -> Result<Pipeline, PipelineError> {
        self.fit(&dataset.records, &dataset.labels)
    }

    /// Fits the transformer and the forest.
    ///
    /// # Returns
    /// * `Result<Pipeline, PipelineError>` - The fitted pipeline, or an error if:
    ///   - `records` is empty or does not match `labels` in length
    ///   - a declared field is absent from every record (`SchemaError`)
    ///   - the forest configuration or validation fraction is invalid
    pub fn fit(self, records: &[Record], labels: &[String]) -> Result<Pipeline, PipelineError> {
        if records.is_empty() {
            return Err(PipelineError::ValidationError("Training batch is empty".into()));
        }
        self.forest_config.validate()?;
        let dataset = LabeledDataset::new(records.to_vec(), labels.to_vec())?;

        let (train, holdout) = match self.validation_split {
            Some(fraction) => {
                let seed = self.forest_config.seed.unwrap_or(DEFAULT_SPLIT_SEED);
                let (train, test) = dataset.train_test_split(fraction, seed)?;
                info!("Holding out {} of {} rows for validation", test.len(), dataset.len());
                (train, Some(test))
            }
            None => (dataset, None),
        };

        let transformer = FeatureTransformer::from_schema(&self.schema);
        let transform = transformer.fit(&train.records)?;
        let features = transform.transform(&train.records)?;
        info!("Transformed {} rows into {} feature columns", features.nrows(), features.ncols());

        let forest = RandomForest::fit(features.view(), &train.labels, &self.forest_config)?;
        let mut pipeline = Pipeline {
            transform,
            forest,
            validation_report: None,
        };

        if let Some(test) = holdout {
            let predictions = pipeline.predict(&test.records)?;
            let report = ClassificationReport::compute(&test.labels, &predictions);
            info!("Validation accuracy: {:.4}", report.accuracy);
            pipeline.validation_report = Some(report);
        }

        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(vec!["x"], vec!["group"], "label").unwrap()
    }

    fn training_data() -> (Vec<Record>, Vec<String>) {
        let mut records = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let x = i as f64;
            let group = if i % 2 == 0 { "even" } else { "odd" };
            records.push(Record::new().with("x", x).with("group", group));
            labels.push(if x < 20.0 { "small" } else { "large" }.to_string());
        }
        (records, labels)
    }

    #[test]
    fn test_fit_and_predict() {
        let (records, labels) = training_data();
        let pipeline = PipelineBuilder::new()
            .with_schema(schema())
            .with_n_estimators(10)
            .with_seed(3)
            .fit(&records, &labels)
            .unwrap();

        let predictions = pipeline
            .predict(&[
                Record::new().with("x", 2.0).with("group", "even"),
                Record::new().with("x", 35.0).with("group", "odd"),
            ])
            .unwrap();
        assert_eq!(predictions, vec!["small", "large"]);
        assert!(pipeline.validation_report().is_none());
    }

    #[test]
    fn test_validation_split_produces_report() {
        let (records, labels) = training_data();
        let pipeline = PipelineBuilder::new()
            .with_schema(schema())
            .with_n_estimators(10)
            .with_seed(3)
            .with_validation_split(0.25)
            .fit(&records, &labels)
            .unwrap();

        let report = pipeline.validation_report().unwrap();
        assert_eq!(report.macro_avg.support, 10);
        assert!(report.accuracy > 0.7);
    }

    #[test]
    fn test_empty_batch_rejected() {
        let result = PipelineBuilder::new().with_schema(schema()).fit(&[], &[]);
        assert!(matches!(result, Err(PipelineError::ValidationError(_))));
    }

    #[test]
    fn test_missing_field_is_schema_error() {
        let records = vec![Record::new().with("x", 1.0), Record::new().with("x", 2.0)];
        let labels = vec!["a".to_string(), "b".to_string()];
        let result = PipelineBuilder::new().with_schema(schema()).fit(&records, &labels);
        assert!(matches!(result, Err(PipelineError::SchemaError { field }) if field == "group"));
    }

    #[test]
    fn test_label_count_mismatch() {
        let (records, _) = training_data();
        let result = PipelineBuilder::new()
            .with_schema(schema())
            .fit(&records, &["a".to_string()]);
        assert!(matches!(result, Err(PipelineError::ValidationError(_))));
    }
}
