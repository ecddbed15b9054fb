//! Versioned publication of training artifacts
//!
//! Each training run is written under its own version directory
//! (`v1/`, `v2/`, ...). A `CURRENT` pointer naming the live version is
//! written last, so a reader resolves either the previous version or the
//! complete new one.

use super::store::ArtifactStore;
use crate::error::{NeurocogError, Result};
use crate::preprocessing::FittedTransform;
use crate::training::{ClassificationMetrics, ModelFamily, ModelRegistry, TrainedModel};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Name of the pointer to the live version
pub const CURRENT_POINTER: &str = "CURRENT";
pub const TRANSFORM_ARTIFACT: &str = "preprocessor.json";
pub const METRICS_ARTIFACT: &str = "model_metrics.json";

/// Monotonic artifact version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactVersion {
    pub number: u64,
}

impl ArtifactVersion {
    pub fn new(number: u64) -> Self {
        Self { number }
    }

    pub fn next(&self) -> Self {
        Self::new(self.number + 1)
    }

    /// Store key of an artifact within this version
    pub fn artifact(&self, name: &str) -> String {
        format!("{}/{}", self, name)
    }

    /// Parse `v3` or `3`
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        s.strip_prefix('v')
            .unwrap_or(s)
            .parse::<u64>()
            .map(Self::new)
            .map_err(|_| NeurocogError::SerializationError(format!("invalid artifact version: {:?}", s)))
    }
}

impl fmt::Display for ArtifactVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number)
    }
}

/// Metrics and selection recorded alongside a version's models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsManifest {
    pub version: ArtifactVersion,
    #[serde(rename = "bestModel")]
    pub best_model: ModelFamily,
    pub models: BTreeMap<ModelFamily, ClassificationMetrics>,
    #[serde(rename = "outputColumns")]
    pub output_columns: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Everything a version holds, loaded together
#[derive(Debug, Clone)]
pub struct LoadedArtifacts {
    pub version: ArtifactVersion,
    pub transform: FittedTransform,
    pub registry: ModelRegistry,
    pub manifest: MetricsManifest,
}

/// Version-stamped load/store of the fitted transform and model registry
pub struct ArtifactRepository {
    store: Arc<dyn ArtifactStore>,
    publish_lock: Mutex<()>,
}

impl ArtifactRepository {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            publish_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// The live version, or `None` before the first publication
    pub fn current_version(&self) -> Result<Option<ArtifactVersion>> {
        if !self.store.exists(CURRENT_POINTER) {
            return Ok(None);
        }
        let raw = self.store.load(CURRENT_POINTER)?;
        let text = String::from_utf8_lossy(&raw);
        ArtifactVersion::parse(&text).map(Some)
    }

    fn require_current(&self) -> Result<ArtifactVersion> {
        self.current_version()?
            .ok_or_else(|| NeurocogError::ModelNotFound("no trained model has been saved".to_string()))
    }

    /// Write a complete new version, then move the pointer to it.
    pub fn publish(&self, transform: &FittedTransform, registry: &ModelRegistry) -> Result<ArtifactVersion> {
        let _guard = self.publish_lock.lock();
        let version = self
            .current_version()?
            .map_or(ArtifactVersion::new(1), |v| v.next());

        self.store
            .save(&version.artifact(TRANSFORM_ARTIFACT), &transform.to_json()?)?;

        for family in ModelFamily::ALL {
            let model = registry
                .get(family)
                .ok_or_else(|| NeurocogError::TrainingError(format!("registry is missing the {} model", family)))?;
            let location = self
                .store
                .save(&version.artifact(family.artifact_name()), &model.to_bytes()?)?;
            debug!(model = %family, location = %location, "Saved model artifact");
        }

        let manifest = MetricsManifest {
            version,
            best_model: registry.best(),
            models: registry.metrics().clone(),
            output_columns: transform.output_columns().to_vec(),
            created_at: Utc::now(),
        };
        self.store
            .save(&version.artifact(METRICS_ARTIFACT), &serde_json::to_vec_pretty(&manifest)?)?;

        self.store.save(CURRENT_POINTER, version.to_string().as_bytes())?;
        info!(version = %version, best = %registry.best(), "Published training artifacts");
        Ok(version)
    }

    /// Load the live transform only
    pub fn load_transform(&self) -> Result<(ArtifactVersion, FittedTransform)> {
        let version = self.require_current()?;
        let bytes = self.store.load(&version.artifact(TRANSFORM_ARTIFACT))?;
        Ok((version, FittedTransform::from_json(&bytes)?))
    }

    /// Load the live metrics manifest only
    pub fn load_manifest(&self) -> Result<MetricsManifest> {
        let version = self.require_current()?;
        self.load_manifest_at(version)
    }

    fn load_manifest_at(&self, version: ArtifactVersion) -> Result<MetricsManifest> {
        let bytes = self.store.load(&version.artifact(METRICS_ARTIFACT))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Load every artifact of the live version
    pub fn load_current(&self) -> Result<LoadedArtifacts> {
        let version = self.require_current()?;
        let transform = FittedTransform::from_json(&self.store.load(&version.artifact(TRANSFORM_ARTIFACT))?)?;
        let manifest = self.load_manifest_at(version)?;

        let mut models = BTreeMap::new();
        for family in ModelFamily::ALL {
            let bytes = self.store.load(&version.artifact(family.artifact_name()))?;
            models.insert(family, TrainedModel::from_bytes(&bytes)?);
        }
        let registry = ModelRegistry::from_parts(models, manifest.models.clone(), manifest.best_model)?;

        debug!(version = %version, "Loaded training artifacts");
        Ok(LoadedArtifacts {
            version,
            transform,
            registry,
            manifest,
        })
    }
}
