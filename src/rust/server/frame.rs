use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::{FieldValue, Record};

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("Column '{0}' appears more than once")]
    DuplicateColumn(String),
    #[error("Row {row} has {found} values but there are {expected} columns")]
    RaggedRow { row: usize, found: usize, expected: usize },
    #[error("Index has {index} entries but there are {rows} rows")]
    IndexLength { index: usize, rows: usize },
}

/// A columnar JSON table in the "split" orientation:
///
/// ```json
/// {"index": [0, 1], "columns": ["age", "color"], "data": [[39, "red"], [null, "blue"]]}
/// ```
///
/// `index` is optional and only checked for length; rows keep their input order.
#[derive(Debug, Clone, Deserialize)]
pub struct SplitFrame {
    #[serde(default)]
    pub index: Option<Vec<serde_json::Value>>,
    pub columns: Vec<String>,
    pub data: Vec<Vec<serde_json::Value>>,
}

impl SplitFrame {
    /// Converts every row into a [`Record`] carrying all of the frame's columns.
    /// JSON `null` becomes [`FieldValue::Missing`].
    pub fn into_records(self) -> Result<Vec<Record>, FrameError> {
        let mut seen = HashSet::new();
        if let Some(dup) = self.columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(FrameError::DuplicateColumn(dup.clone()));
        }
        if let Some(index) = &self.index {
            if index.len() != self.data.len() {
                return Err(FrameError::IndexLength { index: index.len(), rows: self.data.len() });
            }
        }

        self.data
            .iter()
            .enumerate()
            .map(|(row, values)| {
                if values.len() != self.columns.len() {
                    return Err(FrameError::RaggedRow {
                        row,
                        found: values.len(),
                        expected: self.columns.len(),
                    });
                }
                Ok(self
                    .columns
                    .iter()
                    .zip(values)
                    .map(|(name, value)| (name.as_str(), FieldValue::from(value)))
                    .collect::<Record>())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(json: serde_json::Value) -> SplitFrame {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_rows_become_records() {
        let records = frame(serde_json::json!({
            "index": [0, 1],
            "columns": ["age", "color"],
            "data": [[39, "red"], [null, "blue"]]
        }))
        .into_records()
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("age"), Some(&FieldValue::Number(39.0)));
        assert_eq!(records[1].get("age"), Some(&FieldValue::Missing));
        assert_eq!(records[1].get("color"), Some(&FieldValue::Text("blue".into())));
    }

    #[test]
    fn test_index_is_optional() {
        let records = frame(serde_json::json!({"columns": ["a"], "data": [[1]]}))
            .into_records()
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_ragged_row_rejected() {
        let result = frame(serde_json::json!({"columns": ["a", "b"], "data": [[1, 2], [3]]})).into_records();
        assert_eq!(result, Err(FrameError::RaggedRow { row: 1, found: 1, expected: 2 }));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = frame(serde_json::json!({"columns": ["a", "a"], "data": []})).into_records();
        assert_eq!(result, Err(FrameError::DuplicateColumn("a".into())));
    }

    #[test]
    fn test_index_length_checked() {
        let result = frame(serde_json::json!({"index": [0, 1], "columns": ["a"], "data": [[1]]})).into_records();
        assert_eq!(result, Err(FrameError::IndexLength { index: 2, rows: 1 }));
    }
}
