//! Stratified splitting: hold-out split and k-fold cross-validation

use crate::error::{NeurocogError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// A single train/test split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Row positions grouped by class label, in ascending label order
fn group_by_class(y: &[i64]) -> BTreeMap<i64, Vec<usize>> {
    let mut classes: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in y.iter().enumerate() {
        classes.entry(label).or_default().push(idx);
    }
    classes
}

/// Seeded hold-out split preserving class proportions.
///
/// Each class contributes `round(test_size * count)` rows to the test side.
/// Both sides are returned in ascending row order.
pub fn stratified_train_test_split(y: &[i64], test_size: f64, seed: u64) -> Result<CvSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(NeurocogError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must lie strictly between 0 and 1".to_string(),
        });
    }
    if y.len() < 2 {
        return Err(NeurocogError::TrainingError(format!(
            "need at least 2 labelled rows to split, got {}",
            y.len()
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut classes = group_by_class(y);
    for indices in classes.values_mut() {
        indices.shuffle(&mut rng);
    }

    let mut test_counts: BTreeMap<i64, usize> = classes
        .iter()
        .map(|(&label, idx)| (label, ((idx.len() as f64) * test_size).round() as usize))
        .collect();

    // Guarantee a non-empty test side, drawn from the largest class
    if test_counts.values().sum::<usize>() == 0 {
        if let Some((&label, _)) = classes
            .iter()
            .filter(|(_, idx)| idx.len() > 1)
            .max_by(|a, b| a.1.len().cmp(&b.1.len()).then(b.0.cmp(a.0)))
        {
            test_counts.insert(label, 1);
        }
    }

    let mut train_indices = Vec::with_capacity(y.len());
    let mut test_indices = Vec::new();
    for (label, indices) in &classes {
        let n_test = test_counts.get(label).copied().unwrap_or(0).min(indices.len());
        test_indices.extend_from_slice(&indices[..n_test]);
        train_indices.extend_from_slice(&indices[n_test..]);
    }

    if train_indices.is_empty() || test_indices.is_empty() {
        return Err(NeurocogError::TrainingError(
            "not enough rows per class for a train/test split".to_string(),
        ));
    }
    train_indices.sort_unstable();
    test_indices.sort_unstable();

    Ok(CvSplit {
        train_indices,
        test_indices,
        fold_idx: 0,
    })
}

/// Stratified k-fold cross-validation splitter
#[derive(Debug, Clone)]
pub struct StratifiedKFold {
    n_splits: usize,
    random_state: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize, random_state: u64) -> Self {
        Self {
            n_splits,
            random_state,
        }
    }

    /// Generate train/test splits; every class is dealt round-robin across folds.
    pub fn split(&self, y: &[i64]) -> Result<Vec<CvSplit>> {
        if self.n_splits < 2 {
            return Err(NeurocogError::InvalidParameter {
                name: "cv_splits".to_string(),
                value: self.n_splits.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if y.len() < self.n_splits {
            return Err(NeurocogError::TrainingError(format!(
                "n_samples ({}) must be >= n_splits ({})",
                y.len(),
                self.n_splits
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut classes = group_by_class(y);
        for indices in classes.values_mut() {
            indices.shuffle(&mut rng);
        }

        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        let mut next = 0usize;
        for indices in classes.values() {
            for &idx in indices {
                folds[next % self.n_splits].push(idx);
                next += 1;
            }
        }

        Ok((0..self.n_splits)
            .map(|fold_idx| {
                let mut test_indices = folds[fold_idx].clone();
                test_indices.sort_unstable();
                let mut train_indices: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect();
                train_indices.sort_unstable();
                CvSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect())
    }
}
