//! Artifact persistence
//!
//! Provides named blob storage and the versioned layout used to publish
//! the fitted transform, the three trained models and their metrics.

mod store;
mod versioning;

pub use store::{ArtifactStore, FsArtifactStore, MemoryArtifactStore};
pub use versioning::{
    ArtifactRepository, ArtifactVersion, LoadedArtifacts, MetricsManifest, CURRENT_POINTER, METRICS_ARTIFACT,
    TRANSFORM_ARTIFACT,
};
