//! End-to-end train and predict workflows
//!
//! `CognitivePipeline` sequences validation, cleaning, transformation,
//! training and prediction. Lower-level failures are re-raised at the
//! workflow boundary as a training or prediction error with the original
//! message; `ModelNotFound` passes through unchanged.

use crate::config::PipelineConfig;
use crate::error::{NeurocogError, Result};
use crate::export::{ArtifactRepository, ArtifactStore, ArtifactVersion, FsArtifactStore};
use crate::inference::{PredictionEngine, PredictionRecord};
use crate::preprocessing::{ClinicalFrame, DataCleaner, FeatureTransformer, FeatureValidator, FittedTransform, Mode};
use crate::training::{stratified_train_test_split, ClassificationMetrics, ModelFamily, ModelTrainer};
use crate::utils::load_csv;
use ndarray::Array1;
use parking_lot::RwLock;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub status: String,
    pub models: BTreeMap<ModelFamily, ClassificationMetrics>,
    #[serde(rename = "bestModel")]
    pub best_model: ModelFamily,
    pub version: ArtifactVersion,
}

/// Orchestrates the train and predict workflows over one artifact repository
pub struct CognitivePipeline {
    config: PipelineConfig,
    validator: FeatureValidator,
    cleaner: DataCleaner,
    transformer: FeatureTransformer,
    trainer: ModelTrainer,
    repository: Arc<ArtifactRepository>,
    engine: RwLock<Option<Arc<PredictionEngine>>>,
}

impl CognitivePipeline {
    /// Pipeline over an arbitrary artifact store
    pub fn new(config: PipelineConfig, store: Arc<dyn ArtifactStore>) -> Self {
        let repository = Arc::new(ArtifactRepository::new(store));
        Self {
            validator: FeatureValidator::new(config.features.clone()),
            cleaner: DataCleaner::new(config.features.clone(), config.codes.clone(), config.reference_year),
            transformer: FeatureTransformer::new(Arc::clone(&repository)),
            trainer: ModelTrainer::new(config.training.clone()),
            repository,
            engine: RwLock::new(None),
            config,
        }
    }

    /// Pipeline storing artifacts under the configured model directory
    pub fn open(config: PipelineConfig) -> Result<Self> {
        let store = FsArtifactStore::open(&config.artifacts.model_dir)?;
        Ok(Self::new(config, Arc::new(store)))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<ArtifactRepository> {
        &self.repository
    }

    pub fn transformer(&self) -> &FeatureTransformer {
        &self.transformer
    }

    /// Fit the transform and all classifiers, evaluate them and publish a new version.
    pub fn train(&self, df: &DataFrame) -> Result<TrainReport> {
        self.run_training(df).map_err(NeurocogError::into_training)
    }

    /// [`Self::train`] on a CSV file
    pub fn train_csv(&self, path: impl AsRef<Path>) -> Result<TrainReport> {
        load_csv(path)
            .and_then(|df| self.run_training(&df))
            .map_err(NeurocogError::into_training)
    }

    fn run_training(&self, df: &DataFrame) -> Result<TrainReport> {
        let start = Instant::now();
        let features = &self.config.features;

        let frame = ClinicalFrame::from_dataframe(df, &features.id_column)?;
        self.validator.validate(&frame, Mode::Training)?;
        let cleaned = self.cleaner.clean(frame, Mode::Training)?;
        let (predictors, target) = cleaned.split_target(&features.target)?;

        let labelled: Vec<(usize, f64)> = target
            .iter()
            .enumerate()
            .filter_map(|(row, value)| value.map(|v| (row, v)))
            .collect();
        let dropped = target.len() - labelled.len();
        if dropped > 0 {
            warn!(dropped, target = %features.target, "Dropped rows with a missing target");
        }
        if labelled.is_empty() {
            return Err(NeurocogError::ValidationError(format!(
                "no rows have a valid {} value",
                features.target
            )));
        }

        let rows: Vec<usize> = labelled.iter().map(|&(row, _)| row).collect();
        let labels: Vec<f64> = labelled.iter().map(|&(_, v)| v).collect();
        let predictors = predictors.take_rows(&rows)?;

        let classes: Vec<i64> = labels.iter().map(|v| v.round() as i64).collect();
        let training = &self.config.training;
        let split = stratified_train_test_split(&classes, training.test_size, training.random_state)?;
        debug!(
            train_rows = split.train_indices.len(),
            test_rows = split.test_indices.len(),
            "Split training data"
        );

        let train_frame = predictors.take_rows(&split.train_indices)?;
        let test_frame = predictors.take_rows(&split.test_indices)?;
        let transform = FittedTransform::fit(&train_frame, features)?;
        let x_train = transform
            .transform(&train_frame)?
            .to_array(transform.output_columns())?;
        let x_test = transform
            .transform(&test_frame)?
            .to_array(transform.output_columns())?;
        let y_train = Array1::from_iter(split.train_indices.iter().map(|&i| labels[i]));
        let y_test = Array1::from_iter(split.test_indices.iter().map(|&i| labels[i]));

        let models = self.trainer.train(&x_train, &y_train)?;
        let registry = self.trainer.evaluate(models, &x_test, &y_test)?;
        let version = self.trainer.save(&self.repository, &transform, &registry)?;

        let report = TrainReport {
            status: "success".to_string(),
            models: registry.metrics().clone(),
            best_model: registry.best(),
            version,
        };

        let transform = Arc::new(transform);
        self.transformer.set_fitted(Arc::clone(&transform));
        *self.engine.write() = Some(Arc::new(PredictionEngine::new(
            version,
            transform,
            Arc::new(registry),
            features.clone(),
        )));

        info!(
            rows = labels.len(),
            best = %report.best_model,
            version = %version,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Training complete"
        );
        Ok(report)
    }

    /// Predict every row, in input order, with the named model or the best one.
    pub fn predict_batch(&self, df: &DataFrame, model_name: Option<&str>) -> Result<Vec<PredictionRecord>> {
        ClinicalFrame::from_dataframe(df, &self.config.features.id_column)
            .and_then(|frame| self.run_prediction(frame, model_name))
            .map_err(NeurocogError::into_prediction)
    }

    /// [`Self::predict_batch`] on a CSV file
    pub fn predict_csv(&self, path: impl AsRef<Path>, model_name: Option<&str>) -> Result<Vec<PredictionRecord>> {
        load_csv(path)
            .and_then(|df| ClinicalFrame::from_dataframe(&df, &self.config.features.id_column))
            .and_then(|frame| self.run_prediction(frame, model_name))
            .map_err(NeurocogError::into_prediction)
    }

    /// Predict one key/value record; the batch path over a one-row frame.
    pub fn predict_single(&self, record: &Map<String, Value>, model_name: Option<&str>) -> Result<PredictionRecord> {
        ClinicalFrame::from_record(record, &self.config.features.id_column)
            .and_then(|frame| self.run_prediction(frame, model_name))
            .and_then(|records| {
                records
                    .into_iter()
                    .next()
                    .ok_or_else(|| NeurocogError::PredictionError("no prediction was produced".to_string()))
            })
            .map_err(NeurocogError::into_prediction)
    }

    fn run_prediction(&self, frame: ClinicalFrame, model_name: Option<&str>) -> Result<Vec<PredictionRecord>> {
        self.validator.validate(&frame, Mode::Inference)?;

        let mut engine = (*self.engine()?).clone();
        let model = engine.select(model_name)?;
        let cleaned = self.cleaner.clean(frame, Mode::Inference)?;
        let transformed = engine.transform(&cleaned)?;
        let records = engine.predict(&transformed)?;

        info!(rows = records.len(), model = %model, version = %engine.version(), "Prediction complete");
        Ok(records)
    }

    /// Validate, clean and transform a frame with the current fitted transform.
    ///
    /// Fails with a preprocessing error when nothing has been fitted or saved.
    pub fn preprocess(&self, df: &DataFrame) -> Result<ClinicalFrame> {
        let frame = ClinicalFrame::from_dataframe(df, &self.config.features.id_column)?;
        self.validator.validate(&frame, Mode::Inference)?;
        let cleaned = self.cleaner.clean(frame, Mode::Inference)?;
        self.transformer.transform(&cleaned)
    }

    /// Engine for the live version, reloaded when a newer version has been published.
    pub fn engine(&self) -> Result<Arc<PredictionEngine>> {
        let current = self
            .repository
            .current_version()?
            .ok_or_else(|| NeurocogError::ModelNotFound("no trained model has been saved".to_string()))?;

        if let Some(engine) = self.engine.read().as_ref() {
            if engine.version() == current {
                return Ok(Arc::clone(engine));
            }
        }

        let engine = Arc::new(PredictionEngine::load(&self.repository, self.config.features.clone())?);
        self.transformer.set_fitted(engine.fitted_transform());
        *self.engine.write() = Some(Arc::clone(&engine));
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::MemoryArtifactStore;

    fn pipeline() -> CognitivePipeline {
        CognitivePipeline::new(PipelineConfig::default(), Arc::new(MemoryArtifactStore::new()))
    }

    #[test]
    fn test_predict_before_training_is_model_not_found() {
        let mut record = Map::new();
        for col in PipelineConfig::default().features.features() {
            record.insert(col.to_string(), Value::from(1));
        }
        assert!(matches!(
            pipeline().predict_single(&record, None),
            Err(NeurocogError::ModelNotFound(_))
        ));
    }

    #[test]
    fn test_engine_requires_published_version() {
        assert!(matches!(pipeline().engine(), Err(NeurocogError::ModelNotFound(_))));
    }

    #[test]
    fn test_report_json_keys() {
        let report = TrainReport {
            status: "success".to_string(),
            models: BTreeMap::new(),
            best_model: ModelFamily::DecisionTree,
            version: ArtifactVersion::new(1),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["bestModel"], "decisionTree");
        assert_eq!(json["status"], "success");
    }
}
