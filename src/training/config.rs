//! Training configuration

use serde::{Deserialize, Serialize};

/// Kernel function type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KernelType {
    /// Linear kernel: K(x, y) = x · y
    Linear,
    /// Radial Basis Function (Gaussian): K(x, y) = exp(-γ * ||x - y||²)
    Rbf { gamma: f64 },
}

impl Default for KernelType {
    fn default() -> Self {
        KernelType::Rbf { gamma: 0.1 }
    }
}

/// SVM configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmConfig {
    /// Regularization parameter (C)
    pub c: f64,
    /// Kernel function
    pub kernel: KernelType,
    /// Tolerance for stopping criterion
    pub tol: f64,
    /// Maximum number of SMO sweeps
    pub max_iter: usize,
    /// Memory budget for cached kernel rows, in megabytes
    pub cache_size_mb: usize,
}

impl Default for SvmConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelType::default(),
            tol: 1e-3,
            max_iter: 1000,
            cache_size_mb: 200,
        }
    }
}

/// Gaussian naive Bayes configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NaiveBayesConfig {
    /// Fraction of the largest feature variance added to every variance
    pub var_smoothing: f64,
}

impl Default for NaiveBayesConfig {
    fn default() -> Self {
        Self { var_smoothing: 1e-9 }
    }
}

/// Decision tree configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(5),
            min_samples_split: 5,
            min_samples_leaf: 1,
        }
    }
}

/// Configuration for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Seed for splitting and any randomized fitting
    pub random_state: u64,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Folds used by grid search
    pub cv_splits: usize,
    /// Search hyperparameters before the final fit
    pub grid_search: bool,
    /// Upper bound on the whole fitting step
    pub fit_timeout_secs: u64,
    pub svm: SvmConfig,
    pub naive_bayes: NaiveBayesConfig,
    pub decision_tree: TreeConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            random_state: 1,
            test_size: 0.2,
            cv_splits: 3,
            grid_search: false,
            fit_timeout_secs: 600,
            svm: SvmConfig::default(),
            naive_bayes: NaiveBayesConfig::default(),
            decision_tree: TreeConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Builder method to set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Builder method to set the held-out fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Builder method to enable grid search
    pub fn with_grid_search(mut self, enabled: bool) -> Self {
        self.grid_search = enabled;
        self
    }

    /// Builder method to set cross-validation folds
    pub fn with_cv_splits(mut self, splits: usize) -> Self {
        self.cv_splits = splits;
        self
    }

    /// Builder method to set the fitting timeout
    pub fn with_fit_timeout_secs(mut self, secs: u64) -> Self {
        self.fit_timeout_secs = secs;
        self
    }

    pub fn with_svm(mut self, svm: SvmConfig) -> Self {
        self.svm = svm;
        self
    }

    pub fn with_decision_tree(mut self, tree: TreeConfig) -> Self {
        self.decision_tree = tree;
        self
    }
}
