//! Prediction engine
//!
//! An immutable snapshot of one published artifact version:
//! - Arc-shared fitted transform and model registry
//! - Active model selection (defaults to the registry's best model)
//! - Reconstruction of echoed clinical fields from the transformed representation

use crate::error::{NeurocogError, Result};
use crate::export::{ArtifactRepository, ArtifactVersion};
use crate::preprocessing::{CleanedFrame, ClinicalFrame, FeatureSet, FittedTransform};
use crate::training::{Classifier, ModelFamily, ModelRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One prediction, echoing the subject's identifier, age and sex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(rename = "NACCID")]
    pub subject_id: String,
    #[serde(rename = "AGE")]
    pub age: i64,
    /// 1 = male, 2 = female
    #[serde(rename = "SEX")]
    pub sex: i64,
    /// Predicted cognitive status class
    #[serde(rename = "NACCUDSD")]
    pub diagnosis: i64,
}

/// Serves predictions from one artifact version
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    version: ArtifactVersion,
    transform: Arc<FittedTransform>,
    registry: Arc<ModelRegistry>,
    features: FeatureSet,
    active: ModelFamily,
}

impl PredictionEngine {
    /// Build from in-memory artifacts; the best model starts active.
    pub fn new(
        version: ArtifactVersion,
        transform: Arc<FittedTransform>,
        registry: Arc<ModelRegistry>,
        features: FeatureSet,
    ) -> Self {
        let active = registry.best();
        Self {
            version,
            transform,
            registry,
            features,
            active,
        }
    }

    /// Load the live version; `ModelNotFound` if nothing has been published.
    pub fn load(repository: &ArtifactRepository, features: FeatureSet) -> Result<Self> {
        let loaded = repository.load_current()?;
        debug!(version = %loaded.version, best = %loaded.registry.best(), "Loaded prediction engine");
        Ok(Self::new(
            loaded.version,
            Arc::new(loaded.transform),
            Arc::new(loaded.registry),
            features,
        ))
    }

    /// Set the active model by name; `None` selects the best model.
    pub fn select(&mut self, model_name: Option<&str>) -> Result<ModelFamily> {
        self.active = self.registry.resolve(model_name)?;
        Ok(self.active)
    }

    pub fn active(&self) -> ModelFamily {
        self.active
    }

    pub fn version(&self) -> ArtifactVersion {
        self.version
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Shared handle to the snapshot's transform
    pub fn fitted_transform(&self) -> Arc<FittedTransform> {
        Arc::clone(&self.transform)
    }

    /// Apply the snapshot's transform to a cleaned frame
    pub fn transform(&self, cleaned: &CleanedFrame) -> Result<ClinicalFrame> {
        self.transform.transform(cleaned)
    }

    /// Run the active model over transformed rows and rebuild one record per row, in order.
    pub fn predict(&self, transformed: &ClinicalFrame) -> Result<Vec<PredictionRecord>> {
        let model = self
            .registry
            .get(self.active)
            .ok_or_else(|| NeurocogError::ModelNotFound(self.active.to_string()))?;

        let x = transformed.to_array(self.transform.output_columns())?;
        let labels = model.predict(&x)?;

        let age_column = &self.features.age_column;
        let ages = transformed.values(age_column).map_err(|_| {
            NeurocogError::PredictionError(format!("transformed data has no {} column", age_column))
        })?;
        // Without a SEX_1 indicator no row is male.
        let sex_indicator = format!("{}_1", self.features.sex_column);
        let sexes = transformed
            .values(&sex_indicator)
            .unwrap_or_else(|_| vec![None; transformed.height()]);

        let records = transformed
            .index()
            .iter()
            .zip(ages)
            .zip(sexes)
            .zip(labels.iter())
            .map(|(((id, age), sex), &label)| {
                let scaled = age.ok_or_else(|| {
                    NeurocogError::PredictionError(format!("missing {} for subject {}", age_column, id))
                })?;
                let age = self
                    .transform
                    .inverse_numeric(age_column, scaled)
                    .ok_or_else(|| NeurocogError::PredictionError(format!("{} is not a scaled column", age_column)))?;
                Ok(PredictionRecord {
                    subject_id: id.clone(),
                    age: age.round() as i64,
                    sex: if sex == Some(1.0) { 1 } else { 2 },
                    diagnosis: label.round() as i64,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(rows = records.len(), model = %self.active, "Predicted batch");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_json_keys() {
        let record = PredictionRecord {
            subject_id: "A1".to_string(),
            age: 70,
            sex: 1,
            diagnosis: 3,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["NACCID"], "A1");
        assert_eq!(json["AGE"], 70);
        assert_eq!(json["SEX"], 1);
        assert_eq!(json["NACCUDSD"], 3);
    }
}
