//! Pipeline configuration

use crate::error::{NeurocogError, Result};
use crate::preprocessing::{CodeBook, FeatureSet, DEFAULT_REFERENCE_YEAR};
use crate::training::TrainingConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where published artifacts live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub model_dir: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("saved_models"),
        }
    }
}

/// Everything the train and predict workflows are parameterized by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub features: FeatureSet,
    pub codes: CodeBook,
    pub training: TrainingConfig,
    pub artifacts: ArtifactConfig,
    /// Year subtracted from birth year when age must be derived
    pub reference_year: i32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            features: FeatureSet::default(),
            codes: CodeBook::default(),
            training: TrainingConfig::default(),
            artifacts: ArtifactConfig::default(),
            reference_year: DEFAULT_REFERENCE_YEAR,
        }
    }
}

impl PipelineConfig {
    /// Load a JSON config; missing sections take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            NeurocogError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| NeurocogError::ConfigError(format!("invalid config {}: {}", path.display(), e)))
    }

    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    pub fn with_codes(mut self, codes: CodeBook) -> Self {
        self.codes = codes;
        self
    }

    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }

    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifacts.model_dir = dir.into();
        self
    }

    pub fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }
}
