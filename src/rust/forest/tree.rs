use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Growth limits shared by every tree of one ensemble.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Candidate features per split, already resolved against the matrix width
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    /// Rows with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class probabilities of the training rows that reached this leaf
    Leaf { distribution: Vec<f64> },
}

/// A CART classification tree stored as a flat node arena; the root is node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_classes: usize,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

struct PendingNode {
    index: usize,
    samples: Vec<usize>,
    depth: usize,
}

impl DecisionTree {
    /// Grows a tree on the rows listed in `samples`. Rows may repeat, which is
    /// how a bootstrap resample is expressed.
    pub(crate) fn fit(
        x: ArrayView2<f64>,
        y: &[usize],
        n_classes: usize,
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut nodes = vec![Node::Leaf { distribution: Vec::new() }];
        let mut features: Vec<usize> = (0..x.ncols()).collect();
        let mut stack = vec![PendingNode { index: 0, samples, depth: 0 }];

        while let Some(PendingNode { index, samples, depth }) = stack.pop() {
            let counts = class_counts(&samples, y, n_classes);
            let n = samples.len();
            let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
            let depth_reached = params.max_depth.is_some_and(|max| depth >= max);

            let split = if is_pure || depth_reached || n < params.min_samples_split {
                None
            } else {
                features.shuffle(rng);
                best_split(x, y, &samples, &counts, &features, params.max_features)
            };

            match split {
                Some(candidate) => {
                    let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                        .iter()
                        .partition(|&&s| x[[s, candidate.feature]] <= candidate.threshold);

                    let left = nodes.len();
                    let right = left + 1;
                    nodes.push(Node::Leaf { distribution: Vec::new() });
                    nodes.push(Node::Leaf { distribution: Vec::new() });
                    nodes[index] = Node::Split {
                        feature: candidate.feature,
                        threshold: candidate.threshold,
                        left,
                        right,
                    };
                    stack.push(PendingNode { index: right, samples: right_samples, depth: depth + 1 });
                    stack.push(PendingNode { index: left, samples: left_samples, depth: depth + 1 });
                }
                None => {
                    let total = n.max(1) as f64;
                    nodes[index] = Node::Leaf {
                        distribution: counts.iter().map(|&c| c as f64 / total).collect(),
                    };
                }
            }
        }

        Self { nodes, n_classes }
    }

    /// Routes `row` to a leaf and returns its class distribution.
    pub fn predict_proba_row(&self, row: ArrayView1<f64>) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Split { feature, threshold, left, right } => {
                    index = if row[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf { distribution } => return distribution,
            }
        }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf { .. })).count()
    }

    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Node::Split { left, right, .. } = &self.nodes[index] {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        max_depth
    }
}

fn class_counts(samples: &[usize], y: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0; n_classes];
    for &s in samples {
        counts[y[s]] += 1;
    }
    counts
}

/// `n * gini(counts)`, so children can be compared by summing.
fn weighted_gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let sum_sq: f64 = counts.iter().map(|&c| (c * c) as f64).sum();
    n as f64 - sum_sq / n as f64
}

/// Scans shuffled `features` until `max_features` non-constant ones have been
/// evaluated and returns the lowest-impurity split among them.
fn best_split(
    x: ArrayView2<f64>,
    y: &[usize],
    samples: &[usize],
    counts: &[usize],
    features: &[usize],
    max_features: usize,
) -> Option<SplitCandidate> {
    let n = samples.len();
    let mut best: Option<SplitCandidate> = None;
    let mut evaluated = 0;
    let mut column: Vec<(f64, usize)> = Vec::with_capacity(n);

    for &feature in features {
        if evaluated >= max_features {
            break;
        }

        column.clear();
        column.extend(samples.iter().map(|&s| (x[[s, feature]], y[s])));
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        if column[0].0 == column[n - 1].0 {
            continue;
        }
        evaluated += 1;

        let mut left = vec![0usize; counts.len()];
        let mut right = counts.to_vec();
        for i in 0..n - 1 {
            let (value, class) = column[i];
            left[class] += 1;
            right[class] -= 1;

            let next = column[i + 1].0;
            if value == next || !next.is_finite() {
                continue;
            }

            let n_left = i + 1;
            let impurity = weighted_gini(&left, n_left) + weighted_gini(&right, n - n_left);
            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let mut threshold = value / 2.0 + next / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some(SplitCandidate { feature, threshold, impurity });
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;

    fn params(max_depth: Option<usize>) -> TreeParams {
        TreeParams { max_depth, min_samples_split: 2, max_features: 2 }
    }

    #[test]
    fn test_separable_data_is_learned() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [8.0, 0.0], [9.0, 0.0]];
        let y = vec![0, 0, 1, 1];
        let mut rng = StdRng::seed_from_u64(7);
        let tree = DecisionTree::fit(x.view(), &y, 2, (0..4).collect(), &params(None), &mut rng);

        assert_eq!(tree.predict_proba_row(array![1.5, 0.0].view()), &[1.0, 0.0]);
        assert_eq!(tree.predict_proba_row(array![8.5, 0.0].view()), &[0.0, 1.0]);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn test_threshold_is_midpoint() {
        let x = array![[1.0], [3.0]];
        let y = vec![0, 1];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTree::fit(x.view(), &y, 2, vec![0, 1], &params(None), &mut rng);
        assert_eq!(tree.predict_proba_row(array![2.0].view()), &[1.0, 0.0]);
        assert_eq!(tree.predict_proba_row(array![2.0001].view()), &[0.0, 1.0]);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = vec![0, 1, 0, 1, 0, 1];
        let mut rng = StdRng::seed_from_u64(3);
        let tree = DecisionTree::fit(x.view(), &y, 2, (0..6).collect(), &params(Some(2)), &mut rng);
        assert!(tree.depth() <= 2);

        let distribution = tree.predict_proba_row(array![3.5].view());
        assert!((distribution.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_features_make_a_leaf() {
        let x = array![[5.0], [5.0], [5.0]];
        let y = vec![0, 1, 1];
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(x.view(), &y, 2, vec![0, 1, 2], &params(None), &mut rng);
        assert_eq!(tree.n_nodes(), 1);
        let distribution = tree.predict_proba_row(array![5.0].view());
        assert!((distribution[1] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_nan_never_becomes_a_threshold() {
        let x = array![[1.0], [f64::NAN]];
        let y = vec![0, 1];
        let mut rng = StdRng::seed_from_u64(2);
        let tree = DecisionTree::fit(x.view(), &y, 2, vec![0, 1], &params(None), &mut rng);
        assert_eq!(tree.n_nodes(), 1);
    }

    #[test]
    fn test_repeated_samples_weight_the_leaf() {
        let x = array![[0.0], [0.0]];
        let y = vec![0, 1];
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(x.view(), &y, 2, vec![1, 1, 1, 0], &params(None), &mut rng);
        assert_eq!(tree.predict_proba_row(array![0.0].view()), &[0.25, 0.75]);
    }
}
