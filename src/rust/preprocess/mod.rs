//! Feature preprocessing: constant imputation for numeric fields and one-hot
//! encoding with an ignore-unknown policy for categorical fields.

mod imputer;
mod one_hot;
mod transformer;

pub use imputer::{ConstantImputer, DEFAULT_FILL_VALUE};
pub use one_hot::CategoryVocabulary;
pub use transformer::{FeatureTransformer, FittedTransformParams};
