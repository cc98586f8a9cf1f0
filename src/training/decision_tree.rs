//! Decision tree classifier

use crate::error::{Result, TabulaError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node holding the class counts of the samples that reached it
    Leaf {
        class_counts: Vec<usize>,
        n_samples: usize,
    },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Impurity criterion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Gini impurity
    #[default]
    Gini,
    /// Shannon entropy
    Entropy,
}

impl Criterion {
    /// Impurity of a node from its class counts
    pub fn impurity(&self, counts: &[usize], n_samples: usize) -> f64 {
        if n_samples == 0 {
            return 0.0;
        }
        let n = n_samples as f64;
        match self {
            Criterion::Gini => {
                1.0 - counts
                    .iter()
                    .map(|&c| (c as f64 / n).powi(2))
                    .sum::<f64>()
            }
            Criterion::Entropy => -counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        }
    }
}

/// Best split found for one node
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Decision tree classifier over class indices `0..n_classes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn per node (all when `None`)
    pub max_features: Option<usize>,
    /// Impurity criterion
    pub criterion: Criterion,
    /// Seed for per-node feature sampling
    pub random_state: u64,
    n_features: usize,
    n_classes: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::Gini,
            random_state: 0,
            n_features: 0,
            n_classes: 0,
            feature_importances: None,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set the number of features considered per split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    /// Set criterion
    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fit the tree. `n_classes` must exceed every label in `y`.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(TabulaError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(TabulaError::TrainingError(
                "Cannot fit a tree on zero samples".to_string(),
            ));
        }
        if let Some(&bad) = y.iter().find(|&&label| label >= n_classes) {
            return Err(TabulaError::TrainingError(format!(
                "Label {} out of range for {} classes",
                bad, n_classes
            )));
        }

        self.n_features = n_features;
        self.n_classes = n_classes;

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut importances = vec![0.0; n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, indices, 0, &mut importances, &mut rng));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));

        Ok(self)
    }

    fn class_counts(&self, y: &[usize], indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in indices {
            counts[y[i]] += 1;
        }
        counts
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        indices: Vec<usize>,
        depth: usize,
        importances: &mut [f64],
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let class_counts = self.class_counts(y, &indices);
        let impurity = self.criterion.impurity(&class_counts, n_samples);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || impurity <= f64::EPSILON;

        if should_stop {
            return TreeNode::Leaf {
                class_counts,
                n_samples,
            };
        }

        let Some(split) = self.choose_split(x, y, &indices, impurity, rng) else {
            return TreeNode::Leaf {
                class_counts,
                n_samples,
            };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, split.feature_idx]] <= split.threshold);

        // A threshold that separates nothing would recurse on the same rows
        if left_indices.is_empty() || right_indices.is_empty() {
            return TreeNode::Leaf {
                class_counts,
                n_samples,
            };
        }

        importances[split.feature_idx] += n_samples as f64 * split.gain;

        let left = Box::new(self.build_tree(x, y, left_indices, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(x, y, right_indices, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx: split.feature_idx,
            threshold: split.threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    /// Draw `max_features` candidates; when none of them splits the node,
    /// fall through to the remaining features.
    fn choose_split(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let mut order: Vec<usize> = (0..self.n_features).collect();
        let n_try = self.max_features.unwrap_or(self.n_features).min(self.n_features);
        if n_try < self.n_features {
            order.shuffle(rng);
        }

        let (drawn, rest) = order.split_at(n_try);
        self.find_best_split(x, y, indices, drawn, parent_impurity)
            .or_else(|| self.find_best_split(x, y, indices, rest, parent_impurity))
    }

    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        indices: &[usize],
        features: &[usize],
        parent_impurity: f64,
    ) -> Option<SplitCandidate> {
        if features.is_empty() {
            return None;
        }

        // Each feature scans its sorted values independently
        let per_feature: Vec<Option<SplitCandidate>> = features
            .par_iter()
            .map(|&feature_idx| {
                self.best_split_for_feature(x.column(feature_idx), y, indices, parent_impurity)
                    .map(|(threshold, gain)| SplitCandidate {
                        feature_idx,
                        threshold,
                        gain,
                    })
            })
            .collect();

        // First strictly better candidate wins, so ties keep draw order
        per_feature
            .into_iter()
            .flatten()
            .fold(None, |best: Option<SplitCandidate>, cand| match best {
                Some(b) if b.gain >= cand.gain => Some(b),
                _ => Some(cand),
            })
    }

    /// Sweep sorted values once, moving samples from right to left
    fn best_split_for_feature(
        &self,
        values: ArrayView1<f64>,
        y: &[usize],
        indices: &[usize],
        parent_impurity: f64,
    ) -> Option<(f64, f64)> {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

        let n = sorted.len();
        let mut left_counts = vec![0usize; self.n_classes];
        let mut right_counts = self.class_counts(y, &sorted);

        let mut best: Option<(f64, f64)> = None;

        for k in 0..n - 1 {
            let label = y[sorted[k]];
            left_counts[label] += 1;
            right_counts[label] -= 1;

            let current = values[sorted[k]];
            let next = values[sorted[k + 1]];
            if current >= next {
                continue;
            }

            let n_left = k + 1;
            let n_right = n - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let weighted = (n_left as f64 * self.criterion.impurity(&left_counts, n_left)
                + n_right as f64 * self.criterion.impurity(&right_counts, n_right))
                / n as f64;
            let gain = parent_impurity - weighted;

            if gain > 1e-12 && best.map_or(true, |(_, g)| gain > g) {
                best = Some((split_threshold(current, next), gain));
            }
        }

        best
    }

    fn leaf_for<'a>(&'a self, node: &'a TreeNode, sample: ArrayView1<f64>) -> &'a [usize] {
        match node {
            TreeNode::Leaf { class_counts, .. } => class_counts,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                if sample[*feature_idx] <= *threshold {
                    self.leaf_for(left, sample)
                } else {
                    self.leaf_for(right, sample)
                }
            }
        }
    }

    fn check_input(&self, x: &Array2<f64>) -> Result<&TreeNode> {
        let root = self.root.as_ref().ok_or(TabulaError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(TabulaError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(root)
    }

    /// Predict class indices
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let root = self.check_input(x)?;
        Ok(x.rows()
            .into_iter()
            .map(|row| argmax(self.leaf_for(root, row)))
            .collect())
    }

    /// Class distribution of the leaf each sample lands in
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let root = self.check_input(x)?;
        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        for (i, row) in x.rows().into_iter().enumerate() {
            let counts = self.leaf_for(root, row);
            let total: usize = counts.iter().sum();
            if total > 0 {
                for (j, &c) in counts.iter().enumerate() {
                    proba[[i, j]] = c as f64 / total as f64;
                }
            }
        }
        Ok(proba)
    }

    /// Normalized impurity-decrease importances
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        self.root.as_ref().map_or(0, Self::node_depth)
    }

    fn node_depth(node: &TreeNode) -> usize {
        match node {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => {
                1 + Self::node_depth(left).max(Self::node_depth(right))
            }
        }
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, Self::count_leaves)
    }

    fn count_leaves(node: &TreeNode) -> usize {
        match node {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => {
                Self::count_leaves(left) + Self::count_leaves(right)
            }
        }
    }
}

/// Midpoint between two sorted distinct values. Adjacent floats have no
/// midpoint strictly below `next`, so fall back to `current`.
fn split_threshold(current: f64, next: f64) -> f64 {
    let mid = current / 2.0 + next / 2.0;
    if mid >= next || !mid.is_finite() {
        current
    } else {
        mid
    }
}

/// Index of the largest count; ties go to the lowest index
pub(crate) fn argmax<T: PartialOrd + Copy>(values: &[T]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}
