//! Random forest classifier over dense numeric feature matrices.

mod config;
mod ensemble;
mod tree;

pub use config::{ForestConfig, MaxFeatures};
pub use ensemble::RandomForest;
pub use tree::DecisionTree;
