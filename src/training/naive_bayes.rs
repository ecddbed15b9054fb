//! Gaussian naive Bayes classifier

use super::config::NaiveBayesConfig;
use super::models::{class_labels, Classifier};
use crate::error::{NeurocogError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Gaussian Naive Bayes Classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    config: NaiveBayesConfig,
    /// Sorted class labels; per-class vectors below follow this order
    classes: Vec<i64>,
    means: Vec<Vec<f64>>,
    variances: Vec<Vec<f64>>,
    log_priors: Vec<f64>,
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new(NaiveBayesConfig::default())
    }
}

impl GaussianNaiveBayes {
    pub fn new(config: NaiveBayesConfig) -> Self {
        Self {
            config,
            classes: Vec::new(),
            means: Vec::new(),
            variances: Vec::new(),
            log_priors: Vec::new(),
        }
    }

    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    /// Per-row joint log likelihood, one column per class
    pub fn joint_log_likelihood(&self, x: &Array2<f64>) -> Array2<f64> {
        let mut jll = Array2::zeros((x.nrows(), self.classes.len()));
        for (i, row) in x.rows().into_iter().enumerate() {
            for k in 0..self.classes.len() {
                jll[[i, k]] = self.log_priors[k] + self.log_likelihood(row, k);
            }
        }
        jll
    }

    fn log_likelihood(&self, x: ArrayView1<f64>, k: usize) -> f64 {
        x.iter()
            .zip(&self.means[k])
            .zip(&self.variances[k])
            .map(|((&xi, &mean), &var)| -0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln()))
            .sum()
    }
}

impl Classifier for GaussianNaiveBayes {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples == 0 {
            return Err(NeurocogError::TrainingError("no samples to fit".to_string()));
        }
        let classes = class_labels(y)?;

        // Smoothing is relative to the widest feature, as scikit-learn does.
        let max_var = (0..n_features)
            .map(|j| population_variance(x.column(j).iter().copied()))
            .fold(0.0f64, f64::max);
        let epsilon = self.config.var_smoothing * max_var;

        let mut means = Vec::with_capacity(classes.len());
        let mut variances = Vec::with_capacity(classes.len());
        let mut log_priors = Vec::with_capacity(classes.len());

        for &cls in &classes {
            let rows: Vec<usize> = y
                .iter()
                .enumerate()
                .filter(|(_, &v)| v.round() as i64 == cls)
                .map(|(i, _)| i)
                .collect();

            // Single-pass Welford's algorithm for mean and variance
            let mut feature_means = vec![0.0; n_features];
            let mut feature_m2 = vec![0.0; n_features];
            for (count, &idx) in rows.iter().enumerate() {
                for (j, &val) in x.row(idx).iter().enumerate() {
                    let delta = val - feature_means[j];
                    feature_means[j] += delta / (count + 1) as f64;
                    feature_m2[j] += delta * (val - feature_means[j]);
                }
            }
            let feature_vars: Vec<f64> = feature_m2
                .iter()
                .map(|&m2| m2 / rows.len() as f64 + epsilon)
                .map(|v| if v > 0.0 { v } else { f64::MIN_POSITIVE })
                .collect();

            means.push(feature_means);
            variances.push(feature_vars);
            log_priors.push((rows.len() as f64 / n_samples as f64).ln());
        }

        self.classes = classes;
        self.means = means;
        self.variances = variances;
        self.log_priors = log_priors;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.classes.is_empty() {
            return Err(NeurocogError::PredictionError("naive Bayes is not fitted".to_string()));
        }
        let jll = self.joint_log_likelihood(x);
        let predictions: Vec<f64> = jll
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0usize;
                for (k, &v) in row.iter().enumerate() {
                    if v > row[best] {
                        best = k;
                    }
                }
                self.classes[best] as f64
            })
            .collect();
        Ok(Array1::from_vec(predictions))
    }
}

fn population_variance(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let n = values.clone().count();
    if n == 0 {
        return 0.0;
    }
    let mean = values.clone().sum::<f64>() / n as f64;
    values.map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64
}
