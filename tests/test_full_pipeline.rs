//! Integration test: Full pipeline (validate → clean → transform → train → predict)

mod common;

use common::{clinical_training_df, single_subject, two_subject_batch};
use neurocog::prelude::*;
use neurocog::training::select_best;
use polars::prelude::*;
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn memory_pipeline() -> CognitivePipeline {
    CognitivePipeline::new(PipelineConfig::default(), Arc::new(MemoryArtifactStore::new()))
}

fn trained_pipeline() -> (CognitivePipeline, TrainReport) {
    let pipeline = memory_pipeline();
    let report = pipeline.train(&clinical_training_df(80)).unwrap();
    (pipeline, report)
}

fn record(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}

#[test]
fn test_train_reports_every_model() {
    let (_, report) = trained_pipeline();

    assert_eq!(report.status, "success");
    assert_eq!(report.version, ArtifactVersion::new(1));
    assert_eq!(report.models.len(), 3);
    for family in ModelFamily::ALL {
        let m = report.models[&family];
        assert!((0.0..=1.0).contains(&m.accuracy), "{} accuracy {}", family, m.accuracy);
        assert!((0.0..=1.0).contains(&m.f1_score), "{} f1 {}", family, m.f1_score);
    }
}

#[test]
fn test_best_model_has_highest_f1() {
    let (_, report) = trained_pipeline();

    assert_eq!(select_best(&report.models), Some(report.best_model));
    let best_f1 = report.models[&report.best_model].f1_score;
    assert!(report.models.values().all(|m| m.f1_score <= best_f1));
}

#[test]
fn test_training_is_deterministic() {
    let (_, first) = trained_pipeline();
    let (_, second) = trained_pipeline();
    assert_eq!(first, second);
}

#[test]
fn test_end_to_end_two_subject_batch() {
    let (pipeline, _) = trained_pipeline();

    let records = pipeline.predict_batch(&two_subject_batch(), None).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].subject_id, "A1");
    assert_eq!(records[0].age, 70);
    assert_eq!(records[0].sex, 1);
    assert_eq!(records[1].subject_id, "A2");
    assert_eq!(records[1].age, 81);
    assert_eq!(records[1].sex, 2);
    for r in &records {
        assert!((1..=4).contains(&r.diagnosis), "unexpected class {}", r.diagnosis);
    }
}

#[test]
fn test_single_matches_batch() {
    let (pipeline, _) = trained_pipeline();
    let batch = pipeline.predict_batch(&two_subject_batch(), None).unwrap();

    let single = pipeline
        .predict_single(
            &record(json!({
                "NACCID": "A1", "AGE": 70, "EDUC": 16, "UDSBENTC": 14, "SEX": 1,
                "MOCATRAI": 0, "AMNDEM": 0, "NACCPPAG": 1, "AMYLPET": 0,
                "DYSILL": 0, "DYSILLIF": 1
            })),
            None,
        )
        .unwrap();

    assert_eq!(single, batch[0]);
}

#[test]
fn test_single_record_accepts_numeric_strings() {
    let (pipeline, _) = trained_pipeline();

    let single = pipeline
        .predict_single(
            &record(json!({
                "NACCID": "A2", "AGE": "81", "EDUC": "12", "UDSBENTC": "3", "SEX": "2",
                "MOCATRAI": "1", "AMNDEM": "1", "NACCPPAG": "3", "AMYLPET": "1",
                "DYSILL": "1", "DYSILLIF": "2"
            })),
            None,
        )
        .unwrap();

    assert_eq!(single.age, 81);
    assert_eq!(single.sex, 2);
}

#[test]
fn test_every_model_can_be_selected() {
    let (pipeline, _) = trained_pipeline();
    for family in ModelFamily::ALL {
        let records = pipeline.predict_batch(&two_subject_batch(), Some(family.name())).unwrap();
        assert_eq!(records.len(), 2);
    }
}

#[test]
fn test_unknown_model_name() {
    let (pipeline, _) = trained_pipeline();
    let result = pipeline.predict_batch(&two_subject_batch(), Some("randomForest"));
    assert!(matches!(result, Err(NeurocogError::ModelNotFound(_))));
}

#[test]
fn test_missing_target_rejected() {
    let df = clinical_training_df(40).drop("NACCUDSD").unwrap();
    match memory_pipeline().train(&df) {
        Err(NeurocogError::TrainingError(msg)) => assert!(msg.contains("NACCUDSD"), "{}", msg),
        other => panic!("expected a training error, got {:?}", other.map(|r| r.best_model)),
    }
}

#[test]
fn test_missing_predictor_rejected_at_prediction() {
    let (pipeline, _) = trained_pipeline();
    let df = two_subject_batch().drop("EDUC").unwrap();
    match pipeline.predict_batch(&df, None) {
        Err(NeurocogError::PredictionError(msg)) => assert!(msg.contains("EDUC"), "{}", msg),
        other => panic!("expected a prediction error, got {:?}", other),
    }
}

#[test]
fn test_sentinel_sex_matches_missing_sex() {
    let (pipeline, _) = trained_pipeline();

    let sentinel = pipeline.preprocess(&single_subject(&[("SEX", Some(99.0))])).unwrap();
    let missing = pipeline.preprocess(&single_subject(&[("SEX", None)])).unwrap();
    assert!(sentinel.data().equals_missing(missing.data()));

    let a = pipeline.predict_batch(&single_subject(&[("SEX", Some(99.0))]), None).unwrap();
    let b = pipeline.predict_batch(&single_subject(&[("SEX", None)]), None).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_nan_is_imputed_like_missing() {
    let (pipeline, _) = trained_pipeline();

    let nan = pipeline.preprocess(&single_subject(&[("EDUC", Some(f64::NAN))])).unwrap();
    let missing = pipeline.preprocess(&single_subject(&[("EDUC", None)])).unwrap();
    assert!(nan.data().equals_missing(missing.data()));
    assert!(nan.values("EDUC").unwrap()[0].is_some_and(f64::is_finite));

    let a = pipeline.predict_batch(&single_subject(&[("AGE", Some(f64::NAN))]), None).unwrap();
    let b = pipeline.predict_batch(&single_subject(&[("AGE", None)]), None).unwrap();
    assert_eq!(a, b);
    assert!((60..90).contains(&a[0].age));
}

#[test]
fn test_sex_defaults_to_female_without_male_indicator() {
    let pipeline = memory_pipeline();
    let mut df = clinical_training_df(80);
    df.with_column(Column::new("SEX".into(), vec![2.0; 80])).unwrap();
    pipeline.train(&df).unwrap();

    let fitted = pipeline.transformer().fitted().unwrap();
    assert!(!fitted.output_columns().contains(&"SEX_1".to_string()));

    let records = pipeline.predict_batch(&two_subject_batch(), None).unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.sex == 2));
}

#[test]
fn test_out_of_range_education_is_clipped() {
    let (pipeline, _) = trained_pipeline();

    let clipped = pipeline.preprocess(&single_subject(&[("EDUC", Some(50.0))])).unwrap();
    let top = pipeline.preprocess(&single_subject(&[("EDUC", Some(36.0))])).unwrap();
    assert!(clipped.data().equals_missing(top.data()));
}

#[test]
fn test_unseen_category_does_not_fail() {
    let (pipeline, _) = trained_pipeline();

    // DYSILLIF = 3 is a valid code that never occurs in the training cohort
    let df = single_subject(&[("DYSILLIF", Some(3.0))]);
    let transformed = pipeline.preprocess(&df).unwrap();
    let indicators: Vec<String> = transformed
        .column_names()
        .into_iter()
        .filter(|c| c.starts_with("DYSILLIF_"))
        .collect();
    assert!(!indicators.is_empty());
    for name in indicators {
        assert_eq!(transformed.values(&name).unwrap(), vec![Some(0.0)]);
    }

    let records = pipeline.predict_batch(&df, None).unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn test_transform_is_idempotent() {
    let (pipeline, _) = trained_pipeline();
    let df = two_subject_batch();

    let first = pipeline.preprocess(&df).unwrap();
    let second = pipeline.preprocess(&df).unwrap();
    assert!(first.data().equals_missing(second.data()));
    assert_eq!(first.index(), second.index());
}

#[test]
fn test_transform_output_layout() {
    let (pipeline, _) = trained_pipeline();
    let transformed = pipeline.preprocess(&two_subject_batch()).unwrap();
    let fitted = pipeline.transformer().fitted().unwrap();

    assert_eq!(transformed.column_names(), fitted.output_columns().to_vec());
    assert_eq!(&fitted.output_columns()[..3], &["AGE", "EDUC", "UDSBENTC"]);
    assert!(fitted.output_columns().contains(&"SEX_1".to_string()));
    assert!(!fitted.output_columns().contains(&"NACCUDSD".to_string()));
}

#[test]
fn test_age_derived_from_birth_year() {
    let (pipeline, _) = trained_pipeline();
    let mut df = two_subject_batch().drop("AGE").unwrap();
    df.with_column(Column::new("BIRTHYR".into(), &[1954.0, 1943.0])).unwrap();

    let records = pipeline.predict_batch(&df, None).unwrap();
    assert_eq!(records[0].age, 70);
    assert_eq!(records[1].age, 81);
}

#[test]
fn test_rows_without_target_are_dropped() {
    let mut df = clinical_training_df(84);
    let target: Vec<Option<f64>> = df
        .column("NACCUDSD")
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .enumerate()
        .map(|(i, v)| if i >= 80 { None } else { v })
        .collect();
    df.with_column(Column::new("NACCUDSD".into(), target)).unwrap();

    let report = memory_pipeline().train(&df).unwrap();
    assert_eq!(report.models.len(), 3);
}

#[test]
fn test_fit_timeout_publishes_nothing() {
    let mut config = PipelineConfig::default();
    config.training = config.training.with_fit_timeout_secs(0);
    let pipeline = CognitivePipeline::new(config, Arc::new(MemoryArtifactStore::new()));

    match pipeline.train(&clinical_training_df(200)) {
        Err(NeurocogError::TrainingError(msg)) => assert!(msg.contains("timeout"), "{}", msg),
        other => panic!("expected a training error, got {:?}", other),
    }
    assert_eq!(pipeline.repository().current_version().unwrap(), None);
    assert!(matches!(pipeline.engine(), Err(NeurocogError::ModelNotFound(_))));
}

#[test]
fn test_retraining_publishes_new_version() {
    let (pipeline, first) = trained_pipeline();
    let before = pipeline.engine().unwrap();
    assert_eq!(before.version(), first.version);

    let second = pipeline.train(&clinical_training_df(80)).unwrap();
    assert_eq!(second.version, ArtifactVersion::new(2));
    assert_eq!(pipeline.engine().unwrap().version(), second.version);
}

#[test]
fn test_preprocess_before_training_is_not_fitted() {
    let result = memory_pipeline().preprocess(&two_subject_batch());
    match result {
        Err(NeurocogError::PreprocessingError(msg)) => assert!(msg.contains("not fitted"), "{}", msg),
        other => panic!("expected a preprocessing error, got {:?}", other.map(|f| f.height())),
    }
}

#[test]
fn test_empty_input_rejected() {
    let (pipeline, _) = trained_pipeline();
    let empty = two_subject_batch().head(Some(0));
    assert!(matches!(
        pipeline.predict_batch(&empty, None),
        Err(NeurocogError::PredictionError(_))
    ));
}
