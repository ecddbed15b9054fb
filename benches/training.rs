use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use neurocog::prelude::*;
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

fn create_clinical_data(n_rows: usize, with_target: bool) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let ids: Vec<String> = (0..n_rows).map(|i| format!("S{}", i)).collect();
    let target: Vec<f64> = (0..n_rows).map(|i| (i % 4) as f64 + 1.0).collect();
    let mut columns = vec![Column::new("NACCID".into(), ids)];

    let numeric = |rng: &mut ChaCha8Rng, lo: f64, hi: f64| -> Vec<f64> {
        (0..n_rows).map(|_| rng.gen_range(lo..hi).round()).collect()
    };
    columns.push(Column::new("AGE".into(), numeric(&mut rng, 55.0, 95.0)));
    columns.push(Column::new("EDUC".into(), numeric(&mut rng, 6.0, 22.0)));
    columns.push(Column::new(
        "UDSBENTC".into(),
        target.iter().map(|c| 17.0 - c * 3.0 - rng.gen_range(0.0..3.0_f64).round()).collect::<Vec<_>>(),
    ));

    let codes: [(&str, &[f64]); 7] = [
        ("SEX", &[1.0, 2.0]),
        ("MOCATRAI", &[0.0, 1.0]),
        ("AMNDEM", &[0.0, 1.0]),
        ("NACCPPAG", &[1.0, 2.0, 3.0, 4.0]),
        ("AMYLPET", &[0.0, 1.0]),
        ("DYSILL", &[0.0, 1.0]),
        ("DYSILLIF", &[1.0, 2.0, 3.0]),
    ];
    for (name, values) in codes {
        let col: Vec<f64> = (0..n_rows).map(|_| values[rng.gen_range(0..values.len())]).collect();
        columns.push(Column::new(name.into(), col));
    }

    if with_target {
        columns.push(Column::new("NACCUDSD".into(), target));
    }
    DataFrame::new(columns).unwrap()
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [200, 1000, 2000].iter() {
        let df = create_clinical_data(*n_rows, true);

        group.bench_with_input(BenchmarkId::new("train", n_rows), &df, |b, df| {
            b.iter(|| {
                let pipeline = CognitivePipeline::new(PipelineConfig::default(), Arc::new(MemoryArtifactStore::new()));
                pipeline.train(black_box(df)).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    // Train once
    let pipeline = CognitivePipeline::new(PipelineConfig::default(), Arc::new(MemoryArtifactStore::new()));
    pipeline.train(&create_clinical_data(1000, true)).unwrap();

    for n_rows in [1, 100, 1000].iter() {
        let df = create_clinical_data(*n_rows, false);

        group.bench_with_input(BenchmarkId::new("predict_batch", n_rows), &df, |b, df| {
            b.iter(|| pipeline.predict_batch(black_box(df), None).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_training, bench_prediction);
criterion_main!(benches);
