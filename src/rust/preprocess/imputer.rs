use serde::{Deserialize, Serialize};

use crate::record::FieldValue;

/// The fill value used for missing or non-numeric numeric fields.
pub const DEFAULT_FILL_VALUE: f64 = 0.0;

/// Constant-value imputation for numeric fields. Nothing is learned from data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantImputer {
    fill_value: f64,
}

impl Default for ConstantImputer {
    fn default() -> Self {
        Self { fill_value: DEFAULT_FILL_VALUE }
    }
}

impl ConstantImputer {
    pub fn new(fill_value: f64) -> Self {
        Self { fill_value }
    }

    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    /// Passes finite numbers through and substitutes the fill value for
    /// everything else. An absent field is treated like a missing one.
    pub fn impute(&self, value: Option<&FieldValue>) -> f64 {
        value.and_then(FieldValue::as_number).unwrap_or(self.fill_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_numbers_through() {
        let imputer = ConstantImputer::default();
        assert_eq!(imputer.impute(Some(&FieldValue::Number(41.0))), 41.0);
        assert_eq!(imputer.impute(Some(&FieldValue::Number(-2.5))), -2.5);
    }

    #[test]
    fn test_fills_missing_and_non_numeric() {
        let imputer = ConstantImputer::default();
        assert_eq!(imputer.impute(Some(&FieldValue::Missing)), 0.0);
        assert_eq!(imputer.impute(Some(&FieldValue::Text("n/a".into()))), 0.0);
        assert_eq!(imputer.impute(Some(&FieldValue::Number(f64::INFINITY))), 0.0);
        assert_eq!(imputer.impute(None), 0.0);
    }
}
