//! Integration test: artifact persistence across pipeline instances

mod common;

use common::{clinical_training_df, two_subject_batch};
use neurocog::export::{CURRENT_POINTER, METRICS_ARTIFACT, TRANSFORM_ARTIFACT};
use neurocog::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

fn fs_pipeline(dir: &TempDir) -> CognitivePipeline {
    let config = PipelineConfig::default().with_model_dir(dir.path());
    CognitivePipeline::open(config).unwrap()
}

#[test]
fn test_predict_before_training_is_model_not_found() {
    let dir = TempDir::new().unwrap();
    let pipeline = fs_pipeline(&dir);
    assert!(matches!(
        pipeline.predict_batch(&two_subject_batch(), None),
        Err(NeurocogError::ModelNotFound(_))
    ));
}

#[test]
fn test_version_layout_on_disk() {
    let dir = TempDir::new().unwrap();
    fs_pipeline(&dir).train(&clinical_training_df(80)).unwrap();

    assert_eq!(std::fs::read_to_string(dir.path().join(CURRENT_POINTER)).unwrap(), "v1");
    let v1 = dir.path().join("v1");
    assert!(v1.join(TRANSFORM_ARTIFACT).is_file());
    assert!(v1.join(METRICS_ARTIFACT).is_file());
    for family in ModelFamily::ALL {
        assert!(v1.join(family.artifact_name()).is_file(), "missing {}", family);
    }
}

#[test]
fn test_reload_gives_identical_predictions() {
    let dir = TempDir::new().unwrap();
    let trained = fs_pipeline(&dir);
    let report = trained.train(&clinical_training_df(80)).unwrap();

    let batch = two_subject_batch();
    let reloaded = fs_pipeline(&dir);
    for family in ModelFamily::ALL {
        let before = trained.predict_batch(&batch, Some(family.name())).unwrap();
        let after = reloaded.predict_batch(&batch, Some(family.name())).unwrap();
        assert_eq!(before, after, "{} predictions changed after reload", family);
    }

    let engine = reloaded.engine().unwrap();
    assert_eq!(engine.version(), report.version);
    assert_eq!(engine.active(), report.best_model);
    assert_eq!(engine.registry().metrics(), &report.models);
}

#[test]
fn test_reloaded_transform_matches_fitted() {
    let dir = TempDir::new().unwrap();
    let trained = fs_pipeline(&dir);
    trained.train(&clinical_training_df(80)).unwrap();

    let reloaded = fs_pipeline(&dir);
    assert!(!reloaded.transformer().is_loaded());
    let loaded = reloaded.transformer().fitted().unwrap();
    assert!(reloaded.transformer().is_loaded());
    assert_eq!(*loaded, *trained.transformer().fitted().unwrap());

    let a = trained.preprocess(&two_subject_batch()).unwrap();
    let b = reloaded.preprocess(&two_subject_batch()).unwrap();
    assert!(a.data().equals_missing(b.data()));
}

#[test]
fn test_manifest_records_best_model() {
    let dir = TempDir::new().unwrap();
    let pipeline = fs_pipeline(&dir);
    let report = pipeline.train(&clinical_training_df(80)).unwrap();

    let manifest = pipeline.repository().load_manifest().unwrap();
    assert_eq!(manifest.version, report.version);
    assert_eq!(manifest.best_model, report.best_model);
    assert_eq!(manifest.models, report.models);
}

#[test]
fn test_second_process_sees_new_version() {
    let dir = TempDir::new().unwrap();
    let reader = fs_pipeline(&dir);
    let writer = fs_pipeline(&dir);

    writer.train(&clinical_training_df(80)).unwrap();
    assert_eq!(reader.engine().unwrap().version(), ArtifactVersion::new(1));

    writer.train(&clinical_training_df(80)).unwrap();
    assert_eq!(reader.engine().unwrap().version(), ArtifactVersion::new(2));
}

#[test]
fn test_memory_store_round_trip() {
    let store = Arc::new(MemoryArtifactStore::new());
    let trained = CognitivePipeline::new(PipelineConfig::default(), store.clone());
    trained.train(&clinical_training_df(80)).unwrap();

    let reloaded = CognitivePipeline::new(PipelineConfig::default(), store);
    assert_eq!(
        trained.predict_batch(&two_subject_batch(), None).unwrap(),
        reloaded.predict_batch(&two_subject_batch(), None).unwrap()
    );
}
