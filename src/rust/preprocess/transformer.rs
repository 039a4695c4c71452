use log::debug;
use ndarray::{Array1, Array2, ArrayViewMut1};
use serde::{Deserialize, Serialize};

use super::imputer::ConstantImputer;
use super::one_hot::CategoryVocabulary;
use crate::{PipelineError, Record, Schema};

/// Maps raw records with mixed numeric and categorical fields onto a
/// fixed-width numeric matrix.
///
/// The transformer itself only knows the field layout; [`FeatureTransformer::fit`]
/// learns the category vocabularies and returns the frozen
/// [`FittedTransformParams`] that do the actual transformation.
#[derive(Debug, Clone)]
pub struct FeatureTransformer {
    numeric: Vec<String>,
    categorical: Vec<String>,
    imputer: ConstantImputer,
}

impl FeatureTransformer {
    pub fn new(numeric: Vec<impl Into<String>>, categorical: Vec<impl Into<String>>) -> Self {
        Self {
            numeric: numeric.into_iter().map(Into::into).collect(),
            categorical: categorical.into_iter().map(Into::into).collect(),
            imputer: ConstantImputer::default(),
        }
    }

    pub fn from_schema(schema: &Schema) -> Self {
        Self::new(schema.numeric_fields().to_vec(), schema.categorical_fields().to_vec())
    }

    /// Learns one vocabulary per categorical field.
    ///
    /// # Errors
    /// - `ValidationError` if `records` is empty
    /// - `SchemaError` if a declared field is absent from every record
    pub fn fit(&self, records: &[Record]) -> Result<FittedTransformParams, PipelineError> {
        if records.is_empty() {
            return Err(PipelineError::ValidationError(
                "Cannot fit a transformer on an empty batch".into(),
            ));
        }

        if let Some(field) = first_absent_field(self.numeric.iter().chain(self.categorical.iter()), records) {
            return Err(PipelineError::SchemaError { field: field.to_string() });
        }

        let vocabularies: Vec<CategoryVocabulary> = self
            .categorical
            .iter()
            .map(|field| CategoryVocabulary::fit(field.as_str(), records.iter().filter_map(|r| r.get(field))))
            .collect();

        for vocab in &vocabularies {
            debug!("Field '{}' vocabulary has {} categories", vocab.field(), vocab.len());
        }

        Ok(FittedTransformParams {
            numeric: self.numeric.clone(),
            imputer: self.imputer,
            vocabularies,
        })
    }
}

/// Learned, immutable transformation parameters.
///
/// Column layout: numeric fields in declared order, then one one-hot block per
/// categorical field in declared order, each block ordered by its vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransformParams {
    numeric: Vec<String>,
    imputer: ConstantImputer,
    vocabularies: Vec<CategoryVocabulary>,
}

impl FittedTransformParams {
    /// Width of every feature vector produced by these parameters
    pub fn n_features(&self) -> usize {
        self.numeric.len() + self.vocabularies.iter().map(CategoryVocabulary::len).sum::<usize>()
    }

    pub fn numeric_fields(&self) -> &[String] {
        &self.numeric
    }

    pub fn categorical_fields(&self) -> Vec<&str> {
        self.vocabularies.iter().map(CategoryVocabulary::field).collect()
    }

    pub fn vocabulary(&self, field: &str) -> Option<&CategoryVocabulary> {
        self.vocabularies.iter().find(|v| v.field() == field)
    }

    /// Column names in output order, e.g. `age` or `color=blue`.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.numeric.clone();
        for vocab in &self.vocabularies {
            names.extend(vocab.categories().iter().map(|c| format!("{}={}", vocab.field(), c)));
        }
        names
    }

    /// Transforms a batch into one row per record.
    ///
    /// Never fails on values: missing or non-numeric numbers are imputed and
    /// missing or unseen categories encode as an all-zero block.
    ///
    /// # Errors
    /// - `SchemaMismatchError` if an expected field is absent from every record
    ///   of a non-empty batch
    pub fn transform(&self, records: &[Record]) -> Result<Array2<f64>, PipelineError> {
        let mut matrix = Array2::zeros((records.len(), self.n_features()));
        if records.is_empty() {
            return Ok(matrix);
        }

        let expected = self.numeric.iter().map(String::as_str).chain(self.categorical_fields());
        if let Some(field) = first_absent_field(expected, records) {
            return Err(PipelineError::SchemaMismatchError { field: field.to_string() });
        }

        for (record, row) in records.iter().zip(matrix.rows_mut()) {
            self.encode_row(record, row);
        }
        Ok(matrix)
    }

    /// Transforms a single record.
    pub fn transform_one(&self, record: &Record) -> Result<Array1<f64>, PipelineError> {
        let matrix = self.transform(std::slice::from_ref(record))?;
        Ok(matrix.row(0).to_owned())
    }

    fn encode_row(&self, record: &Record, mut row: ArrayViewMut1<f64>) {
        let Some(row) = row.as_slice_mut() else {
            return;
        };

        for (slot, field) in row.iter_mut().zip(&self.numeric) {
            *slot = self.imputer.impute(record.get(field));
        }

        let mut offset = self.numeric.len();
        for vocab in &self.vocabularies {
            let end = offset + vocab.len();
            vocab.encode_into(record.get(vocab.field()), &mut row[offset..end]);
            offset = end;
        }
    }
}

/// Returns the first field that no record in the batch carries.
fn first_absent_field<'a, S: AsRef<str> + ?Sized + 'a>(
    fields: impl IntoIterator<Item = &'a S>,
    records: &[Record],
) -> Option<&'a str> {
    fields
        .into_iter()
        .map(|field: &'a S| -> &'a str { field.as_ref() })
        .find(|field| !records.iter().any(|r| r.contains(field)))
}
