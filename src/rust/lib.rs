//! A thread-safe tabular classification library: one-hot/imputation
//! preprocessing fused with a random forest into a single persisted artifact.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use tabforest::{Pipeline, Record, Schema, FieldValue};
//!
//! let schema = Schema::new(vec!["age"], vec!["color"], "label")?;
//! let records = vec![
//!     Record::new().with("age", 22.0).with("color", "red"),
//!     Record::new().with("age", 64.0).with("color", "blue"),
//!     Record::new().with("age", 31.0).with("color", "red"),
//!     Record::new().with("age", 70.0).with("color", FieldValue::Missing),
//! ];
//! let labels: Vec<String> = ["young", "old", "young", "old"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//!
//! let pipeline = Pipeline::builder()
//!     .with_schema(schema)
//!     .with_n_estimators(10)
//!     .with_seed(42)
//!     .fit(&records, &labels)?;
//!
//! let predictions = pipeline.predict(&[Record::new().with("age", 25.0).with("color", "green")])?;
//! println!("Predicted class: {}", predictions[0]);
//! # Ok(())
//! # }
//! ```
//!
//! # Persistence
//!
//! A fitted [`Pipeline`] round-trips through one file, checksummed with
//! SHA-256; see [`Pipeline::save`], [`Pipeline::load`] and [`ArtifactStore`].
//!
//! # Thread Safety
//!
//! The pipeline is immutable once fitted and can be shared across threads using `Arc`:
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use tabforest::{Pipeline, Record, Schema};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let pipeline = Arc::new(
//!     Pipeline::builder()
//!         .with_schema(Schema::new(vec!["x"], Vec::<String>::new(), "label")?)
//!         .with_n_estimators(4)
//!         .with_seed(1)
//!         .fit(
//!             &[Record::new().with("x", 0.0), Record::new().with("x", 1.0)],
//!             &["a".to_string(), "b".to_string()],
//!         )?,
//! );
//!
//! let mut handles = vec![];
//! for i in 0..3 {
//!     let pipeline = Arc::clone(&pipeline);
//!     handles.push(thread::spawn(move || {
//!         pipeline.predict(&[Record::new().with("x", i as f64)]).unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod dataset;
pub mod forest;
pub mod metrics;
pub mod pipeline;
pub mod preprocess;
pub mod record;
mod runtime;
pub mod schema;
pub mod server;

pub use artifact::{ArtifactError, ArtifactStore};
pub use dataset::{load_csv, read_csv, LabeledDataset, LoadSummary};
pub use forest::{ForestConfig, MaxFeatures, RandomForest};
pub use metrics::{ClassMetrics, ClassificationReport};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineError, PipelineInfo};
pub use preprocess::{FeatureTransformer, FittedTransformParams};
pub use record::{FieldValue, Record};
pub use runtime::{create_thread_pool, RuntimeConfig};
pub use schema::{FieldKind, Schema};

/// Initializes `env_logger`, defaulting to the `info` level when `RUST_LOG` is unset.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
}
