//! Grid search over fixed per-family hyperparameter grids
//!
//! Disabled unless `TrainingConfig::grid_search` is set. Candidates are scored
//! by mean weighted F1 over stratified k-fold splits of the training data.

use super::config::{KernelType, TrainingConfig};
use super::cross_validation::StratifiedKFold;
use super::models::{ClassificationMetrics, Classifier, ModelFamily};
use crate::error::{NeurocogError, Result};
use ndarray::{Array1, Array2, Axis};
use tracing::debug;

/// Best candidate found for one family
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub family: ModelFamily,
    pub config: TrainingConfig,
    pub mean_f1: f64,
}

/// Candidate configurations for a family, each derived from `base`
pub fn param_grid(family: ModelFamily, base: &TrainingConfig) -> Vec<TrainingConfig> {
    let mut grid = Vec::new();
    match family {
        ModelFamily::Svm => {
            for c in [0.1, 1.0, 10.0] {
                for gamma in [0.01, 0.1, 1.0] {
                    let mut cfg = base.clone();
                    cfg.svm.c = c;
                    cfg.svm.kernel = KernelType::Rbf { gamma };
                    grid.push(cfg);
                }
            }
        }
        ModelFamily::NaiveBayes => {
            for var_smoothing in [1e-9, 1e-8, 1e-7] {
                let mut cfg = base.clone();
                cfg.naive_bayes.var_smoothing = var_smoothing;
                grid.push(cfg);
            }
        }
        ModelFamily::DecisionTree => {
            for max_depth in [Some(3), Some(5), Some(7), None] {
                for min_samples_split in [2, 5, 10] {
                    let mut cfg = base.clone();
                    cfg.decision_tree.max_depth = max_depth;
                    cfg.decision_tree.min_samples_split = min_samples_split;
                    grid.push(cfg);
                }
            }
        }
    }
    grid
}

/// Exhaustive cross-validated search
#[derive(Debug, Clone)]
pub struct GridSearch {
    cv: StratifiedKFold,
}

impl GridSearch {
    pub fn new(cv_splits: usize, random_state: u64) -> Self {
        Self {
            cv: StratifiedKFold::new(cv_splits, random_state),
        }
    }

    /// Best configuration for `family`; the first candidate wins ties.
    pub fn search(&self, family: ModelFamily, base: &TrainingConfig, x: &Array2<f64>, y: &Array1<f64>) -> Result<SearchResult> {
        let labels: Vec<i64> = y.iter().map(|v| v.round() as i64).collect();
        let splits = self.cv.split(&labels)?;

        let mut best: Option<SearchResult> = None;
        for config in param_grid(family, base) {
            let mut total = 0.0;
            for split in &splits {
                let x_train = x.select(Axis(0), &split.train_indices);
                let y_train = y.select(Axis(0), &split.train_indices);
                let x_test = x.select(Axis(0), &split.test_indices);
                let y_test = y.select(Axis(0), &split.test_indices);

                let mut model = family.build(&config);
                model.fit(&x_train, &y_train)?;
                total += ClassificationMetrics::compute(&y_test, &model.predict(&x_test)?)?.f1_score;
            }
            let mean_f1 = total / splits.len() as f64;
            debug!(family = %family, mean_f1, "Scored grid candidate");

            if best.as_ref().map_or(true, |b| mean_f1 > b.mean_f1) {
                best = Some(SearchResult {
                    family,
                    config,
                    mean_f1,
                });
            }
        }

        best.ok_or_else(|| NeurocogError::TrainingError(format!("empty parameter grid for {}", family)))
    }
}
