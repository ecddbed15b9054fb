//! Shared clinical fixtures for integration tests

#![allow(dead_code)]

use polars::prelude::*;

/// Deterministic labelled cohort: `n` subjects, four balanced classes.
///
/// The test score and amnestic flag track the class so every model family
/// can learn something; a few sentinel codes are sprinkled in.
pub fn clinical_training_df(n: usize) -> DataFrame {
    let mut ids = Vec::with_capacity(n);
    let mut age = Vec::with_capacity(n);
    let mut educ = Vec::with_capacity(n);
    let mut benson = Vec::with_capacity(n);
    let mut sex = Vec::with_capacity(n);
    let mut moca = Vec::with_capacity(n);
    let mut amndem = Vec::with_capacity(n);
    let mut ppag = Vec::with_capacity(n);
    let mut amyl = Vec::with_capacity(n);
    let mut dysill = Vec::with_capacity(n);
    let mut dysillif = Vec::with_capacity(n);
    let mut target = Vec::with_capacity(n);

    for i in 0..n {
        let class = (i % 4) as f64 + 1.0;
        ids.push(format!("S{:04}", i));
        age.push(60.0 + ((i * 7) % 30) as f64);
        educ.push(if i % 17 == 0 { 99.0 } else { 8.0 + ((i * 5) % 13) as f64 });
        benson.push(17.0 - class * 3.0 - (i % 3) as f64);
        sex.push(if i % 11 == 0 { -4.0 } else { (i % 2) as f64 + 1.0 });
        moca.push((i % 2) as f64);
        amndem.push(if class >= 3.0 { 1.0 } else { 0.0 });
        ppag.push(((i / 3) % 4) as f64 + 1.0);
        amyl.push(if class == 4.0 { 1.0 } else { 0.0 });
        dysill.push(((i / 2) % 2) as f64);
        dysillif.push(((i / 5) % 2) as f64 + 1.0);
        target.push(class);
    }

    df!(
        "NACCID" => &ids,
        "AGE" => &age,
        "EDUC" => &educ,
        "UDSBENTC" => &benson,
        "SEX" => &sex,
        "MOCATRAI" => &moca,
        "AMNDEM" => &amndem,
        "NACCPPAG" => &ppag,
        "AMYLPET" => &amyl,
        "DYSILL" => &dysill,
        "DYSILLIF" => &dysillif,
        "NACCUDSD" => &target
    )
    .unwrap()
}

/// Two-subject prediction batch: A1 (70, male) and A2 (81, female)
pub fn two_subject_batch() -> DataFrame {
    df!(
        "NACCID" => &["A1", "A2"],
        "AGE" => &[70.0, 81.0],
        "EDUC" => &[16.0, 12.0],
        "UDSBENTC" => &[14.0, 3.0],
        "SEX" => &[1.0, 2.0],
        "MOCATRAI" => &[0.0, 1.0],
        "AMNDEM" => &[0.0, 1.0],
        "NACCPPAG" => &[1.0, 3.0],
        "AMYLPET" => &[0.0, 1.0],
        "DYSILL" => &[0.0, 1.0],
        "DYSILLIF" => &[1.0, 2.0]
    )
    .unwrap()
}

/// One-subject batch with every predictor set to a valid value except the overrides
pub fn single_subject(overrides: &[(&str, Option<f64>)]) -> DataFrame {
    let base: [(&str, f64); 10] = [
        ("AGE", 75.0),
        ("EDUC", 14.0),
        ("UDSBENTC", 9.0),
        ("SEX", 1.0),
        ("MOCATRAI", 0.0),
        ("AMNDEM", 0.0),
        ("NACCPPAG", 2.0),
        ("AMYLPET", 0.0),
        ("DYSILL", 0.0),
        ("DYSILLIF", 1.0),
    ];

    let mut columns = vec![Column::new("NACCID".into(), &["B1"])];
    for (name, value) in base {
        let value = overrides
            .iter()
            .find(|(col, _)| *col == name)
            .map_or(Some(value), |(_, v)| *v);
        columns.push(Column::new(name.into(), &[value]));
    }
    DataFrame::new(columns).unwrap()
}
