//! Fits, evaluates and selects among the classifier families

use super::config::TrainingConfig;
use super::models::{ClassificationMetrics, Classifier, ModelFamily, TrainedModel};
use super::tuning::GridSearch;
use crate::error::{NeurocogError, Result};
use crate::export::{ArtifactRepository, ArtifactVersion};
use crate::preprocessing::FittedTransform;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Every trained family, its held-out metrics and the best family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRegistry {
    models: BTreeMap<ModelFamily, TrainedModel>,
    metrics: BTreeMap<ModelFamily, ClassificationMetrics>,
    best: ModelFamily,
}

impl ModelRegistry {
    /// Assemble a registry; every family must have both a model and metrics.
    pub fn new(
        models: BTreeMap<ModelFamily, TrainedModel>,
        metrics: BTreeMap<ModelFamily, ClassificationMetrics>,
    ) -> Result<Self> {
        for family in ModelFamily::ALL {
            if !models.contains_key(&family) || !metrics.contains_key(&family) {
                return Err(NeurocogError::TrainingError(format!(
                    "registry is missing the {} model",
                    family
                )));
            }
        }
        let best = select_best(&metrics)
            .ok_or_else(|| NeurocogError::TrainingError("no metrics to select a model from".to_string()))?;
        Ok(Self { models, metrics, best })
    }

    /// Reassemble a persisted registry with its recorded best model
    pub fn from_parts(
        models: BTreeMap<ModelFamily, TrainedModel>,
        metrics: BTreeMap<ModelFamily, ClassificationMetrics>,
        best: ModelFamily,
    ) -> Result<Self> {
        if !models.contains_key(&best) {
            return Err(NeurocogError::ModelNotFound(best.to_string()));
        }
        Ok(Self { models, metrics, best })
    }

    pub fn best(&self) -> ModelFamily {
        self.best
    }

    pub fn get(&self, family: ModelFamily) -> Option<&TrainedModel> {
        self.models.get(&family)
    }

    pub fn models(&self) -> &BTreeMap<ModelFamily, TrainedModel> {
        &self.models
    }

    pub fn metrics(&self) -> &BTreeMap<ModelFamily, ClassificationMetrics> {
        &self.metrics
    }

    /// Resolve a requested model name; `None` means the best model.
    pub fn resolve(&self, name: Option<&str>) -> Result<ModelFamily> {
        let family = match name {
            None => return Ok(self.best),
            Some(name) => name.parse::<ModelFamily>()?,
        };
        if self.models.contains_key(&family) {
            Ok(family)
        } else {
            Err(NeurocogError::ModelNotFound(name.unwrap_or_default().to_string()))
        }
    }
}

/// Family with the strictly highest weighted F1.
///
/// Families are visited in canonical order, so equal scores keep the earlier one.
pub fn select_best(metrics: &BTreeMap<ModelFamily, ClassificationMetrics>) -> Option<ModelFamily> {
    let mut best: Option<(ModelFamily, f64)> = None;
    for (&family, m) in metrics {
        if best.map_or(true, |(_, f1)| m.f1_score > f1) {
            best = Some((family, m.f1_score));
        }
    }
    best.map(|(family, _)| family)
}

/// Trains all classifier families on the same transformed features
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    config: TrainingConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fit every family in parallel, bounded by the configured timeout.
    ///
    /// Any failure fails the whole run with a training error naming the family.
    pub fn train(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<BTreeMap<ModelFamily, TrainedModel>> {
        if x.nrows() != y.len() {
            return Err(NeurocogError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }

        let timeout = Duration::from_secs(self.config.fit_timeout_secs);
        let config = self.config.clone();
        let x = Arc::new(x.clone());
        let y = Arc::new(y.clone());
        let (tx, rx) = mpsc::channel();

        let start = Instant::now();
        thread::Builder::new()
            .name("neurocog-fit".to_string())
            .spawn(move || {
                let _ = tx.send(fit_all(&config, &x, &y));
            })?;

        match rx.recv_timeout(timeout) {
            Ok(result) => {
                let models = result?;
                info!(
                    families = models.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Trained all model families"
                );
                Ok(models)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(timeout_secs = self.config.fit_timeout_secs, "Model fitting timed out");
                Err(NeurocogError::TrainingError(format!(
                    "model fitting exceeded the {}s timeout",
                    self.config.fit_timeout_secs
                )))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(NeurocogError::TrainingError(
                "model fitting stopped without a result".to_string(),
            )),
        }
    }

    /// Score each model on the held-out split and pick the best.
    pub fn evaluate(
        &self,
        models: BTreeMap<ModelFamily, TrainedModel>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
    ) -> Result<ModelRegistry> {
        let mut metrics = BTreeMap::new();
        for (&family, model) in &models {
            let predictions = model
                .predict(x_test)
                .map_err(|e| NeurocogError::TrainingError(format!("{} evaluation failed: {}", family, e)))?;
            let m = ClassificationMetrics::compute(y_test, &predictions)?;
            info!(
                model = %family,
                accuracy = m.accuracy,
                precision = m.precision,
                recall = m.recall,
                f1 = m.f1_score,
                "Evaluated model"
            );
            metrics.insert(family, m);
        }

        let registry = ModelRegistry::new(models, metrics)?;
        info!(best = %registry.best(), "Selected best model");
        Ok(registry)
    }

    /// Persist the transform and registry as a new artifact version
    pub fn save(
        &self,
        repository: &ArtifactRepository,
        transform: &FittedTransform,
        registry: &ModelRegistry,
    ) -> Result<ArtifactVersion> {
        repository.publish(transform, registry)
    }
}

fn fit_all(config: &TrainingConfig, x: &Array2<f64>, y: &Array1<f64>) -> Result<BTreeMap<ModelFamily, TrainedModel>> {
    ModelFamily::ALL
        .par_iter()
        .map(|&family| fit_family(config, family, x, y).map(|m| (family, m)))
        .collect::<Result<Vec<_>>>()
        .map(|fitted| fitted.into_iter().collect())
}

fn fit_family(config: &TrainingConfig, family: ModelFamily, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedModel> {
    let start = Instant::now();
    let config = if config.grid_search {
        let result = GridSearch::new(config.cv_splits, config.random_state)
            .search(family, config, x, y)
            .map_err(|e| NeurocogError::TrainingError(format!("{} grid search failed: {}", family, e)))?;
        debug!(model = %family, mean_f1 = result.mean_f1, "Grid search finished");
        result.config
    } else {
        config.clone()
    };

    let mut model = family.build(&config);
    model
        .fit(x, y)
        .map_err(|e| NeurocogError::TrainingError(format!("{} training failed: {}", family, e)))?;
    debug!(model = %family, elapsed_ms = start.elapsed().as_millis() as u64, "Fitted model");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(f1: f64) -> ClassificationMetrics {
        ClassificationMetrics {
            accuracy: f1,
            precision: f1,
            recall: f1,
            f1_score: f1,
        }
    }

    fn separable(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i % 4) as f64 * 3.0 + j as f64 + (i as f64) * 0.001);
        let y = Array1::from_shape_fn(n, |i| (i % 4 + 1) as f64);
        (x, y)
    }

    #[test]
    fn test_select_best_highest_f1() {
        let mut m = BTreeMap::new();
        m.insert(ModelFamily::Svm, metrics(0.10));
        m.insert(ModelFamily::NaiveBayes, metrics(0.77));
        m.insert(ModelFamily::DecisionTree, metrics(0.96));
        assert_eq!(select_best(&m), Some(ModelFamily::DecisionTree));
    }

    #[test]
    fn test_select_best_tie_keeps_canonical_order() {
        let mut m = BTreeMap::new();
        m.insert(ModelFamily::DecisionTree, metrics(0.8));
        m.insert(ModelFamily::NaiveBayes, metrics(0.8));
        m.insert(ModelFamily::Svm, metrics(0.5));
        assert_eq!(select_best(&m), Some(ModelFamily::NaiveBayes));
    }

    #[test]
    fn test_train_and_evaluate() {
        let (x, y) = separable(40);
        let trainer = ModelTrainer::new(TrainingConfig::default());
        let models = trainer.train(&x, &y).unwrap();
        assert_eq!(models.len(), 3);

        let registry = trainer.evaluate(models, &x, &y).unwrap();
        assert_eq!(registry.metrics().len(), 3);
        assert!(registry.metrics()[&registry.best()].f1_score > 0.9);
    }

    #[test]
    fn test_failing_family_fails_run() {
        let x = Array2::from_shape_fn((6, 1), |(i, _)| i as f64);
        let y = Array1::from_elem(6, 1.0);
        let err = ModelTrainer::new(TrainingConfig::default()).train(&x, &y).unwrap_err();
        assert!(matches!(err, NeurocogError::TrainingError(_)));
        assert!(err.to_string().contains("svm"));
    }

    #[test]
    fn test_fit_timeout_fails_run() {
        let (x, y) = separable(300);
        let trainer = ModelTrainer::new(TrainingConfig::default().with_fit_timeout_secs(0));
        match trainer.train(&x, &y) {
            Err(NeurocogError::TrainingError(msg)) => assert!(msg.contains("0s timeout"), "{}", msg),
            other => panic!("expected a timeout, got {:?}", other.map(|m| m.len())),
        }
    }

    #[test]
    fn test_registry_resolve() {
        let (x, y) = separable(20);
        let trainer = ModelTrainer::new(TrainingConfig::default());
        let registry = trainer.evaluate(trainer.train(&x, &y).unwrap(), &x, &y).unwrap();

        assert_eq!(registry.resolve(None).unwrap(), registry.best());
        assert_eq!(registry.resolve(Some("svm")).unwrap(), ModelFamily::Svm);
        assert!(matches!(registry.resolve(Some("knn")), Err(NeurocogError::ModelNotFound(_))));
    }
}
