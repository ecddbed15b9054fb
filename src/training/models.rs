//! Classifier trait, model families and evaluation metrics

use super::config::TrainingConfig;
use super::decision_tree::DecisionTree;
use super::naive_bayes::GaussianNaiveBayes;
use super::svm::SvmClassifier;
use crate::error::{NeurocogError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Trait for classifiers
pub trait Classifier: Send + Sync {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Predict class labels
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
}

/// Sorted distinct labels; fails on non-integral labels
pub fn class_labels(y: &Array1<f64>) -> Result<Vec<i64>> {
    let mut labels = BTreeSet::new();
    for (i, &v) in y.iter().enumerate() {
        if !v.is_finite() || (v - v.round()).abs() > 1e-9 {
            return Err(NeurocogError::TrainingError(format!(
                "class labels must be integers, but sample {} has label {}",
                i, v
            )));
        }
        labels.insert(v.round() as i64);
    }
    Ok(labels.into_iter().collect())
}

/// The classifier families trained on every run.
///
/// The derived ordering (svm, naiveBayes, decisionTree) is the canonical
/// order used for iteration and for breaking ties between equal F1 scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelFamily {
    #[serde(rename = "svm")]
    Svm,
    #[serde(rename = "naiveBayes")]
    NaiveBayes,
    #[serde(rename = "decisionTree")]
    DecisionTree,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 3] = [ModelFamily::Svm, ModelFamily::NaiveBayes, ModelFamily::DecisionTree];

    /// Registry name
    pub fn name(&self) -> &'static str {
        match self {
            ModelFamily::Svm => "svm",
            ModelFamily::NaiveBayes => "naiveBayes",
            ModelFamily::DecisionTree => "decisionTree",
        }
    }

    /// Artifact file name within a version directory
    pub fn artifact_name(&self) -> &'static str {
        match self {
            ModelFamily::Svm => "svm_model.bin",
            ModelFamily::NaiveBayes => "nb_model.bin",
            ModelFamily::DecisionTree => "decision_tree_model.bin",
        }
    }

    /// Untrained model configured from `config`
    pub fn build(&self, config: &TrainingConfig) -> TrainedModel {
        match self {
            ModelFamily::Svm => TrainedModel::Svm(SvmClassifier::new(config.svm.clone(), config.random_state)),
            ModelFamily::NaiveBayes => TrainedModel::NaiveBayes(GaussianNaiveBayes::new(config.naive_bayes.clone())),
            ModelFamily::DecisionTree => TrainedModel::DecisionTree(DecisionTree::new(config.decision_tree.clone())),
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelFamily {
    type Err = NeurocogError;

    fn from_str(s: &str) -> Result<Self> {
        ModelFamily::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| NeurocogError::ModelNotFound(s.to_string()))
    }
}

/// Classifier state of one family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrainedModel {
    Svm(SvmClassifier),
    NaiveBayes(GaussianNaiveBayes),
    DecisionTree(DecisionTree),
}

impl TrainedModel {
    pub fn family(&self) -> ModelFamily {
        match self {
            TrainedModel::Svm(_) => ModelFamily::Svm,
            TrainedModel::NaiveBayes(_) => ModelFamily::NaiveBayes,
            TrainedModel::DecisionTree(_) => ModelFamily::DecisionTree,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            TrainedModel::Svm(m) => m,
            TrainedModel::NaiveBayes(m) => m,
            TrainedModel::DecisionTree(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            TrainedModel::Svm(m) => m,
            TrainedModel::NaiveBayes(m) => m,
            TrainedModel::DecisionTree(m) => m,
        }
    }
}

impl Classifier for TrainedModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict(x)
    }
}

/// Weighted classification metrics on a held-out split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1Score")]
    pub f1_score: f64,
}

impl ClassificationMetrics {
    /// Accuracy plus support-weighted precision, recall and F1.
    ///
    /// Labels are the union of true and predicted labels; a class with no
    /// predictions (or no support) contributes 0 instead of failing.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(NeurocogError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        let n = y_true.len();
        if n == 0 {
            return Err(NeurocogError::TrainingError("cannot evaluate on an empty split".to_string()));
        }

        let t: Vec<i64> = y_true.iter().map(|v| v.round() as i64).collect();
        let p: Vec<i64> = y_pred.iter().map(|v| v.round() as i64).collect();
        let labels: BTreeSet<i64> = t.iter().chain(p.iter()).copied().collect();

        let correct = t.iter().zip(&p).filter(|(a, b)| a == b).count();

        let mut precision = 0.0;
        let mut recall = 0.0;
        let mut f1 = 0.0;
        for &label in &labels {
            let tp = t.iter().zip(&p).filter(|(a, b)| **a == label && **b == label).count() as f64;
            let predicted = p.iter().filter(|&&b| b == label).count() as f64;
            let support = t.iter().filter(|&&a| a == label).count() as f64;

            let prec = if predicted > 0.0 { tp / predicted } else { 0.0 };
            let rec = if support > 0.0 { tp / support } else { 0.0 };
            let f = if prec + rec > 0.0 { 2.0 * prec * rec / (prec + rec) } else { 0.0 };

            let weight = support / n as f64;
            precision += weight * prec;
            recall += weight * rec;
            f1 += weight * f;
        }

        Ok(Self {
            accuracy: correct as f64 / n as f64,
            precision,
            recall,
            f1_score: f1,
        })
    }
}
