use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// The role a column plays in a training file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Numeric,
    Categorical,
    Label,
}

/// Declares which fields are numeric, which are categorical and which one is
/// the training target, plus the positional order of columns in a headerless
/// training file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    numeric: Vec<String>,
    categorical: Vec<String>,
    label: String,
    column_order: Vec<String>,
}

impl Schema {
    /// Creates a schema whose positional column order is the numeric fields,
    /// then the categorical fields, then the label.
    ///
    /// # Example
    /// ```
    /// use tabforest::Schema;
    ///
    /// let schema = Schema::new(vec!["age"], vec!["color"], "label").unwrap();
    /// assert_eq!(schema.column_order(), ["age", "color", "label"]);
    /// ```
    pub fn new(
        numeric: Vec<impl Into<String>>,
        categorical: Vec<impl Into<String>>,
        label: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        let numeric: Vec<String> = numeric.into_iter().map(Into::into).collect();
        let categorical: Vec<String> = categorical.into_iter().map(Into::into).collect();
        let label = label.into();

        let column_order = numeric
            .iter()
            .chain(categorical.iter())
            .chain(std::iter::once(&label))
            .cloned()
            .collect();

        let schema = Self { numeric, categorical, label, column_order };
        schema.validate()?;
        Ok(schema)
    }

    /// Replaces the positional column order used when reading headerless files.
    ///
    /// Every numeric field, categorical field and the label must appear exactly once.
    pub fn with_column_order(mut self, columns: Vec<impl Into<String>>) -> Result<Self, PipelineError> {
        self.column_order = columns.into_iter().map(Into::into).collect();
        self.validate()?;
        Ok(self)
    }

    /// The census income schema: 6 numeric, 8 categorical and the `income` label,
    /// in the positional order of the `adult.data` file.
    pub fn census_income() -> Self {
        let to_strings = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            numeric: to_strings(&[
                "age",
                "fnlwgt",
                "education-num",
                "capital-gain",
                "capital-loss",
                "hours-per-week",
            ]),
            categorical: to_strings(&[
                "workclass",
                "education",
                "marital-status",
                "occupation",
                "relationship",
                "race",
                "sex",
                "native-country",
            ]),
            label: "income".to_string(),
            column_order: to_strings(&[
                "age",
                "workclass",
                "fnlwgt",
                "education",
                "education-num",
                "marital-status",
                "occupation",
                "relationship",
                "race",
                "sex",
                "capital-gain",
                "capital-loss",
                "hours-per-week",
                "native-country",
                "income",
            ]),
        }
    }

    pub fn numeric_fields(&self) -> &[String] {
        &self.numeric
    }

    pub fn categorical_fields(&self) -> &[String] {
        &self.categorical
    }

    pub fn label_field(&self) -> &str {
        &self.label
    }

    pub fn column_order(&self) -> &[String] {
        &self.column_order
    }

    /// Returns the role of `name`, or `None` if the schema does not declare it.
    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        if self.numeric.iter().any(|f| f == name) {
            Some(FieldKind::Numeric)
        } else if self.categorical.iter().any(|f| f == name) {
            Some(FieldKind::Categorical)
        } else if self.label == name {
            Some(FieldKind::Label)
        } else {
            None
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.numeric.is_empty() && self.categorical.is_empty() {
            return Err(PipelineError::ValidationError(
                "Schema must declare at least one numeric or categorical field".into(),
            ));
        }

        let mut seen = HashSet::new();
        for name in self.numeric.iter().chain(self.categorical.iter()).chain(std::iter::once(&self.label)) {
            if name.is_empty() {
                return Err(PipelineError::ValidationError("Field names cannot be empty".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(PipelineError::ValidationError(format!(
                    "Field '{}' is declared more than once",
                    name
                )));
            }
        }

        if self.column_order.len() != seen.len() {
            return Err(PipelineError::ValidationError(format!(
                "Column order lists {} columns but the schema declares {} fields",
                self.column_order.len(),
                seen.len()
            )));
        }
        let mut ordered = HashSet::new();
        for column in &self.column_order {
            if !seen.contains(column.as_str()) {
                return Err(PipelineError::ValidationError(format!(
                    "Column '{}' is not declared by the schema",
                    column
                )));
            }
            if !ordered.insert(column.as_str()) {
                return Err(PipelineError::ValidationError(format!(
                    "Column '{}' appears more than once in the column order",
                    column
                )));
            }
        }
        Ok(())
    }
}
