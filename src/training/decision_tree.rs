//! Gini decision tree classifier

use super::config::TreeConfig;
use super::models::{class_labels, Classifier};
use crate::error::{NeurocogError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Decision tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with predicted class
    Leaf { class: i64, n_samples: usize },
    /// Internal node; samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Depth-bounded classification tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<TreeNode>,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            root: None,
            n_features: 0,
            feature_importances: None,
        }
    }

    /// Normalized impurity decrease per feature
    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    /// Number of split levels on the longest path
    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }

    pub fn n_leaves(&self) -> usize {
        fn count(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => count(left) + count(right),
            }
        }
        self.root.as_ref().map_or(0, count)
    }

    fn build(&self, x: &Array2<f64>, y: &[i64], indices: &[usize], depth: usize, importances: &mut [f64]) -> TreeNode {
        let n_samples = indices.len();
        let counts = class_counts(y, indices);
        let leaf = TreeNode::Leaf {
            class: majority(&counts),
            n_samples,
        };

        let should_stop = n_samples < self.config.min_samples_split
            || n_samples < 2 * self.config.min_samples_leaf
            || self.config.max_depth.map_or(false, |d| depth >= d)
            || counts.len() <= 1;
        if should_stop {
            return leaf;
        }

        let Some((feature_idx, threshold, gain)) = self.best_split(x, y, indices) else {
            return leaf;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
            indices.iter().partition(|&&i| x[[i, feature_idx]] <= threshold);
        importances[feature_idx] += n_samples as f64 * gain;

        TreeNode::Split {
            feature_idx,
            threshold,
            left: Box::new(self.build(x, y, &left_idx, depth + 1, importances)),
            right: Box::new(self.build(x, y, &right_idx, depth + 1, importances)),
            n_samples,
        }
    }

    /// Best (feature, threshold, gain); ties go to the lower feature index, then the lower threshold.
    fn best_split(&self, x: &Array2<f64>, y: &[i64], indices: &[usize]) -> Option<(usize, f64, f64)> {
        let parent = gini(&class_counts(y, indices), indices.len());
        let min_leaf = self.config.min_samples_leaf;

        let per_feature: Vec<Option<(usize, f64, f64)>> = (0..x.ncols())
            .into_par_iter()
            .map(|feature_idx| {
                let mut order: Vec<usize> = indices.to_vec();
                order.sort_by(|&a, &b| {
                    x[[a, feature_idx]]
                        .partial_cmp(&x[[b, feature_idx]])
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

                let n = order.len();
                let mut left: BTreeMap<i64, usize> = BTreeMap::new();
                let mut right = class_counts(y, &order);
                let mut best: Option<(usize, f64, f64)> = None;

                for pos in 0..n - 1 {
                    let idx = order[pos];
                    *left.entry(y[idx]).or_insert(0) += 1;
                    if let Some(c) = right.get_mut(&y[idx]) {
                        *c -= 1;
                        if *c == 0 {
                            right.remove(&y[idx]);
                        }
                    }

                    let lo = x[[idx, feature_idx]];
                    let hi = x[[order[pos + 1], feature_idx]];
                    if hi <= lo {
                        continue;
                    }
                    let n_left = pos + 1;
                    let n_right = n - n_left;
                    if n_left < min_leaf || n_right < min_leaf {
                        continue;
                    }

                    let weighted = (n_left as f64 * gini(&left, n_left) + n_right as f64 * gini(&right, n_right)) / n as f64;
                    let gain = parent - weighted;
                    if gain > 1e-12 && best.map_or(true, |(_, _, g)| gain > g) {
                        best = Some((feature_idx, (lo + hi) / 2.0, gain));
                    }
                }
                best
            })
            .collect();

        per_feature.into_iter().flatten().fold(None, |acc, cand| match acc {
            Some((_, _, g)) if cand.2 <= g => acc,
            _ => Some(cand),
        })
    }

    fn predict_row(node: &TreeNode, sample: ArrayView1<f64>) -> i64 {
        match node {
            TreeNode::Leaf { class, .. } => *class,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
                ..
            } => {
                if sample[*feature_idx] <= *threshold {
                    Self::predict_row(left, sample)
                } else {
                    Self::predict_row(right, sample)
                }
            }
        }
    }
}

impl Classifier for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(NeurocogError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(NeurocogError::TrainingError("no samples to fit".to_string()));
        }
        class_labels(y)?;

        let labels: Vec<i64> = y.iter().map(|v| v.round() as i64).collect();
        let mut importances = vec![0.0; x.ncols()];
        let indices: Vec<usize> = (0..n_samples).collect();
        let root = self.build(x, &labels, &indices, 0, &mut importances);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|imp| *imp /= total);
        }

        self.root = Some(root);
        self.n_features = x.ncols();
        self.feature_importances = Some(Array1::from_vec(importances));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| NeurocogError::PredictionError("decision tree is not fitted".to_string()))?;
        if x.ncols() != self.n_features {
            return Err(NeurocogError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.rows().into_iter().map(|row| Self::predict_row(root, row) as f64).collect())
    }
}

fn class_counts(y: &[i64], indices: &[usize]) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &i in indices {
        *counts.entry(y[i]).or_insert(0) += 1;
    }
    counts
}

fn gini(counts: &BTreeMap<i64, usize>, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts.values().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

/// Most common class; ties go to the smallest label
fn majority(counts: &BTreeMap<i64, usize>) -> i64 {
    let mut best: Option<(i64, usize)> = None;
    for (&class, &count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((class, count));
        }
    }
    best.map_or(0, |(class, _)| class)
}
