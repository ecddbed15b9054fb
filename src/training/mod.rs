//! Model training module
//!
//! Fits three classifier families on the same transformed features:
//! - Support vector machine (RBF kernel, one-vs-rest SMO)
//! - Gaussian naive Bayes
//! - Depth-bounded Gini decision tree
//!
//! Each is evaluated on a stratified hold-out split and the best weighted F1 wins.

mod config;
mod models;
mod trainer;
pub mod cross_validation;
pub mod decision_tree;
pub mod naive_bayes;
pub mod svm;
pub mod tuning;

pub use config::{KernelType, NaiveBayesConfig, SvmConfig, TrainingConfig, TreeConfig};
pub use cross_validation::{stratified_train_test_split, CvSplit, StratifiedKFold};
pub use decision_tree::{DecisionTree, TreeNode};
pub use models::{class_labels, ClassificationMetrics, Classifier, ModelFamily, TrainedModel};
pub use naive_bayes::GaussianNaiveBayes;
pub use svm::SvmClassifier;
pub use trainer::{select_best, ModelRegistry, ModelTrainer};
pub use tuning::{param_grid, GridSearch, SearchResult};
