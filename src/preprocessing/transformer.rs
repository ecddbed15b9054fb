//! Composite feature transformation fitted once on training data
//!
//! Numeric columns are imputed (mean or median by skewness) and standardized;
//! categorical columns are imputed with their mode and one-hot encoded; any
//! other column passes through. The output layout is recorded at fit time and
//! reproduced exactly by every later `transform`.

use super::cleaner::CleanedFrame;
use super::config::FeatureSet;
use super::encoder::OneHotEncoder;
use super::frame::ClinicalFrame;
use super::imputer::{ImputeStrategy, Imputer};
use super::scaler::StandardScaler;
use crate::error::{NeurocogError, Result};
use crate::export::ArtifactRepository;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// The immutable, serializable feature transformation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTransform {
    numeric: Vec<String>,
    categorical: Vec<String>,
    passthrough: Vec<String>,
    numeric_imputer: Imputer,
    scaler: StandardScaler,
    categorical_imputer: Imputer,
    encoder: OneHotEncoder,
    output_columns: Vec<String>,
}

impl FittedTransform {
    /// Fit on a cleaned, target-free training frame
    pub fn fit(cleaned: &CleanedFrame, features: &FeatureSet) -> Result<Self> {
        let frame = cleaned.frame();
        if frame.is_empty() {
            return Err(NeurocogError::PreprocessingError(
                "cannot fit transform on an empty frame".to_string(),
            ));
        }

        let present = frame.column_names();
        let numeric: Vec<String> = features
            .numeric
            .iter()
            .filter(|c| present.contains(c))
            .cloned()
            .collect();
        let categorical: Vec<String> = features
            .categorical
            .iter()
            .filter(|c| present.contains(c))
            .cloned()
            .collect();
        let passthrough: Vec<String> = present
            .iter()
            .filter(|c| !features.is_numeric(c) && !features.is_categorical(c) && **c != features.target)
            .cloned()
            .collect();

        let numeric_imputer = Imputer::fit_numeric(frame, &numeric)?;
        let imputed = numeric_imputer.transform(frame)?;
        let scaler = StandardScaler::fit(&imputed, &numeric)?;

        let categorical_imputer = Imputer::fit_most_frequent(frame, &categorical)?;
        let imputed = categorical_imputer.transform(frame)?;
        let encoder = OneHotEncoder::fit(&imputed, &categorical)?;

        let mut output_columns = numeric.clone();
        output_columns.extend(encoder.output_names());
        output_columns.extend(passthrough.iter().cloned());

        info!(
            rows = frame.height(),
            numeric = numeric.len(),
            categorical = categorical.len(),
            outputs = output_columns.len(),
            "Fitted feature transform"
        );

        Ok(Self {
            numeric,
            categorical,
            passthrough,
            numeric_imputer,
            scaler,
            categorical_imputer,
            encoder,
            output_columns,
        })
    }

    /// Apply the fitted transform. Never refits.
    ///
    /// The result has exactly [`Self::output_columns`], in order, over the input's index.
    pub fn transform(&self, cleaned: &CleanedFrame) -> Result<ClinicalFrame> {
        let frame = cleaned.frame();
        let absent: Vec<&str> = self
            .numeric
            .iter()
            .chain(&self.categorical)
            .chain(&self.passthrough)
            .filter(|c| !frame.has_column(c))
            .map(String::as_str)
            .collect();
        if !absent.is_empty() {
            return Err(NeurocogError::PreprocessingError(format!(
                "transform input is missing columns: {}",
                absent.join(", ")
            )));
        }

        let numeric = self.scaler.transform(&self.numeric_imputer.transform(frame)?)?;
        let encoded = self
            .encoder
            .transform(&self.categorical_imputer.transform(frame)?)?;

        let mut out = ClinicalFrame::from_columns(frame.index().to_vec(), Vec::new())?;
        for name in &self.numeric {
            out = out.with_values(name, numeric.values(name)?)?;
        }
        for name in encoded.column_names() {
            out = out.with_values(&name, encoded.values(&name)?)?;
        }
        for name in &self.passthrough {
            out = out.with_values(name, frame.values(name)?)?;
        }

        debug!(rows = out.height(), columns = out.column_names().len(), "Applied feature transform");
        Ok(out)
    }

    /// Output column names in emission order
    pub fn output_columns(&self) -> &[String] {
        &self.output_columns
    }

    /// Undo standard scaling of a numeric column
    pub fn inverse_numeric(&self, column: &str, value: f64) -> Option<f64> {
        self.scaler.inverse_value(column, value)
    }

    /// Imputation strategy chosen for a column, if any
    pub fn impute_strategy(&self, column: &str) -> Option<ImputeStrategy> {
        self.numeric_imputer
            .strategy(column)
            .or_else(|| self.categorical_imputer.strategy(column))
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Holder that serves the current transform, loading the persisted one on first use
pub struct FeatureTransformer {
    repository: Arc<ArtifactRepository>,
    fitted: RwLock<Option<Arc<FittedTransform>>>,
}

impl FeatureTransformer {
    pub fn new(repository: Arc<ArtifactRepository>) -> Self {
        Self {
            repository,
            fitted: RwLock::new(None),
        }
    }

    /// Replace the in-memory transform (after a training run)
    pub fn set_fitted(&self, fitted: Arc<FittedTransform>) {
        *self.fitted.write() = Some(fitted);
    }

    pub fn is_loaded(&self) -> bool {
        self.fitted.read().is_some()
    }

    /// The in-memory transform, or the persisted one; "not fitted" if neither exists.
    pub fn fitted(&self) -> Result<Arc<FittedTransform>> {
        if let Some(fitted) = self.fitted.read().as_ref() {
            return Ok(Arc::clone(fitted));
        }

        let (version, loaded) = self.repository.load_transform().map_err(|e| match e {
            NeurocogError::ModelNotFound(_) => NeurocogError::PreprocessingError(
                "feature transform is not fitted and no saved transform was found".to_string(),
            ),
            other => other.into_preprocessing(),
        })?;
        debug!(version = version.number, "Loaded saved feature transform");

        let loaded = Arc::new(loaded);
        *self.fitted.write() = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    pub fn transform(&self, cleaned: &CleanedFrame) -> Result<ClinicalFrame> {
        self.fitted()?.transform(cleaned)
    }
}
