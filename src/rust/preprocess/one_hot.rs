use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::record::FieldValue;

/// The fitted vocabulary of one categorical field.
///
/// Categories are kept sorted, which fixes the order of the field's one-hot
/// columns for the lifetime of the fitted parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryVocabulary {
    field: String,
    categories: Vec<String>,
}

impl CategoryVocabulary {
    /// Collects the distinct non-missing values observed for `field`.
    pub fn fit<'a>(field: impl Into<String>, values: impl IntoIterator<Item = &'a FieldValue>) -> Self {
        let categories: BTreeSet<String> = values
            .into_iter()
            .filter_map(|v| v.as_category().map(|c| c.into_owned()))
            .collect();
        Self {
            field: field.into(),
            categories: categories.into_iter().collect(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Width of the field's one-hot block
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn index_of(&self, category: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(category))
            .ok()
    }

    /// Writes the one-hot block for `value` into `block`, which must be
    /// exactly `self.len()` wide. Missing and unseen values leave the block
    /// all zero.
    pub fn encode_into(&self, value: Option<&FieldValue>, block: &mut [f64]) {
        debug_assert_eq!(block.len(), self.len());
        block.iter_mut().for_each(|x| *x = 0.0);
        if let Some(idx) = value
            .and_then(FieldValue::as_category)
            .and_then(|c| self.index_of(&c))
        {
            block[idx] = 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocabulary() -> CategoryVocabulary {
        let values = vec![
            FieldValue::from("red"),
            FieldValue::from("blue"),
            FieldValue::Missing,
            FieldValue::from("red"),
        ];
        CategoryVocabulary::fit("color", &values)
    }

    #[test]
    fn test_vocabulary_is_sorted_and_distinct() {
        let vocab = vocabulary();
        assert_eq!(vocab.field(), "color");
        assert_eq!(vocab.categories(), ["blue", "red"]);
    }

    #[test]
    fn test_known_category_sets_one_column() {
        let vocab = vocabulary();
        let mut block = [9.0; 2];
        vocab.encode_into(Some(&FieldValue::from("red")), &mut block);
        assert_eq!(block, [0.0, 1.0]);
    }

    #[test]
    fn test_unseen_and_missing_are_all_zero() {
        let vocab = vocabulary();
        let mut block = [1.0; 2];
        vocab.encode_into(Some(&FieldValue::from("green")), &mut block);
        assert_eq!(block, [0.0, 0.0]);

        let mut block = [1.0; 2];
        vocab.encode_into(Some(&FieldValue::Missing), &mut block);
        assert_eq!(block, [0.0, 0.0]);

        let mut block = [1.0; 2];
        vocab.encode_into(None, &mut block);
        assert_eq!(block, [0.0, 0.0]);
        assert_eq!(vocab.len(), 2);
    }
}
