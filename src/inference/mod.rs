//! Inference module
//!
//! Serves batch and single-record predictions from a published artifact
//! version, applying the same clean/transform path used at training time.

mod engine;

pub use engine::{PredictionEngine, PredictionRecord};
