use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use log::{debug, info};
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::config::ForestConfig;
use super::tree::{DecisionTree, TreeParams};
use crate::runtime::{create_thread_pool, RuntimeConfig};
use crate::PipelineError;

/// A bagged ensemble of randomized decision trees.
///
/// Class labels are kept sorted; the predicted label for a row is the class
/// with the highest probability averaged over all trees, ties going to the
/// class that sorts first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    classes: Vec<String>,
    trees: Vec<DecisionTree>,
    n_features: usize,
    config: ForestConfig,
    seed: u64,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<RandomForest>();
    }
};

impl RandomForest {
    /// Trains `config.n_estimators` trees on a bounded worker pool.
    ///
    /// Every tree gets its own seed drawn up front from the master seed, so
    /// the result does not depend on how trees are scheduled across workers.
    ///
    /// # Errors
    /// - `ValidationError` for an empty matrix, a label count that differs
    ///   from the row count, or invalid hyperparameters
    /// - `BuildError` if the worker pool cannot be created
    pub fn fit(x: ArrayView2<f64>, labels: &[String], config: &ForestConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 {
            return Err(PipelineError::ValidationError("Training matrix has no rows".into()));
        }
        if n_features == 0 {
            return Err(PipelineError::ValidationError("Training matrix has no feature columns".into()));
        }
        if labels.len() != n_samples {
            return Err(PipelineError::ValidationError(format!(
                "Got {} labels for {} training rows",
                labels.len(),
                n_samples
            )));
        }
        if let Some(((row, col), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(PipelineError::ValidationError(format!(
                "Training matrix has a non-finite value at row {}, column {}",
                row, col
            )));
        }

        let classes: Vec<String> = labels.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect();
        let y: Vec<usize> = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_default())
            .collect();

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut master = StdRng::seed_from_u64(seed);
        let tree_seeds: Vec<u64> = (0..config.n_estimators).map(|_| master.gen()).collect();

        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            max_features: config.max_features.resolve(n_features),
        };
        let n_classes = classes.len();
        let bootstrap = config.bootstrap;

        info!(
            "Training {} trees on {} rows x {} features ({} classes, seed {})",
            config.n_estimators, n_samples, n_features, n_classes, seed
        );
        let start = Instant::now();

        let pool = create_thread_pool(&RuntimeConfig::with_jobs(config.n_jobs))?;
        let trees: Vec<DecisionTree> = pool.install(|| {
            tree_seeds
                .par_iter()
                .map(|&tree_seed| {
                    let mut rng = StdRng::seed_from_u64(tree_seed);
                    let samples: Vec<usize> = if bootstrap {
                        (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                    } else {
                        (0..n_samples).collect()
                    };
                    DecisionTree::fit(x, &y, n_classes, samples, &params, &mut rng)
                })
                .collect()
        });

        debug!(
            "Tree depths: {:?}",
            trees.iter().map(DecisionTree::depth).collect::<Vec<_>>()
        );
        info!("Forest trained in {:.2?}", start.elapsed());

        Ok(Self {
            classes,
            trees,
            n_features,
            config: config.clone(),
            seed,
        })
    }

    /// Averaged class probabilities, one row per input row and one column per class.
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, PipelineError> {
        self.check_width(x.ncols())?;
        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for (row, mut out) in x.rows().into_iter().zip(proba.rows_mut()) {
            for tree in &self.trees {
                for (acc, p) in out.iter_mut().zip(tree.predict_proba_row(row)) {
                    *acc += p;
                }
            }
            out /= self.trees.len() as f64;
        }
        Ok(proba)
    }

    /// Predicted label per input row, in row order.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<String>, PipelineError> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| self.classes[argmax(row)].clone())
            .collect())
    }

    /// Scores one feature vector: the predicted label plus every class probability.
    pub fn score(&self, features: ArrayView1<f64>) -> Result<(String, HashMap<String, f64>), PipelineError> {
        let x = features.insert_axis(ndarray::Axis(0));
        let proba = self.predict_proba(x)?;
        let row = proba.row(0);
        let scores = self
            .classes
            .iter()
            .cloned()
            .zip(row.iter().copied())
            .collect();
        Ok((self.classes[argmax(row)].clone(), scores))
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// The master seed the forest was trained with
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn check_width(&self, n_cols: usize) -> Result<(), PipelineError> {
        if n_cols != self.n_features {
            return Err(PipelineError::PredictionError(format!(
                "Expected {} feature columns, got {}",
                self.n_features, n_cols
            )));
        }
        Ok(())
    }
}

/// Index of the largest value; the first one wins ties.
fn argmax(row: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (i, &p) in row.iter().enumerate() {
        if p > row[best] {
            best = i;
        }
    }
    best
}
