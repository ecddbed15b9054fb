//! Neurocog - Cognitive-status prediction from structured clinical features
//!
//! This crate provides the complete prediction workflow:
//! - Validation and cleaning of raw clinical records (sentinel codes, range repair, age derivation)
//! - A fitted feature transformation reused unchanged at prediction time
//! - Training and evaluation of SVM, naive Bayes and decision-tree classifiers
//! - Versioned artifact persistence and batch/single-record prediction
//!
//! # Modules
//!
//! - [`preprocessing`] - Validation, cleaning, imputation, scaling, encoding
//! - [`training`] - Classifiers, stratified splitting, metrics and model selection
//! - [`export`] - Artifact store and versioned publication
//! - [`inference`] - Prediction engine over a published version
//! - [`pipeline`] - End-to-end train and predict workflows
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use neurocog::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> neurocog::Result<()> {
//! let pipeline = CognitivePipeline::new(PipelineConfig::default(), Arc::new(MemoryArtifactStore::new()));
//! let report = pipeline.train_csv("investigator_nacc.csv")?;
//! println!("best model: {}", report.best_model);
//!
//! let predictions = pipeline.predict_csv("new_visits.csv", None)?;
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;
pub mod config;

// Core ML modules
pub mod preprocessing;
pub mod training;
pub mod inference;

// Persistence
pub mod export;

// Workflows
pub mod pipeline;

// Utilities
pub mod utils;

// Services
pub mod cli;

pub use error::{NeurocogError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{NeurocogError, Result};

    // Configuration
    pub use crate::config::{ArtifactConfig, PipelineConfig};

    // Preprocessing
    pub use crate::preprocessing::{
        CleanedFrame, ClinicalFrame, CodeBook, DataCleaner, FeatureSet, FeatureTransformer, FeatureValidator,
        FittedTransform, Mode,
    };

    // Training
    pub use crate::training::{ClassificationMetrics, Classifier, ModelFamily, ModelRegistry, ModelTrainer, TrainingConfig};

    // Persistence
    pub use crate::export::{ArtifactRepository, ArtifactStore, ArtifactVersion, FsArtifactStore, MemoryArtifactStore};

    // Inference
    pub use crate::inference::{PredictionEngine, PredictionRecord};

    // Workflows
    pub use crate::pipeline::{CognitivePipeline, TrainReport};
}
