use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tabforest::{Pipeline, Record, Schema};

const WORKCLASSES: [&str; 4] = ["Private", "Self-emp-not-inc", "State-gov", "Local-gov"];
const EDUCATIONS: [&str; 5] = ["Bachelors", "HS-grad", "Masters", "Some-college", "Doctorate"];

fn synthetic_rows(n: usize) -> (Vec<Record>, Vec<String>) {
    let mut records = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let age = 18.0 + (i % 60) as f64;
        let hours = 20.0 + (i * 7 % 50) as f64;
        let education = EDUCATIONS[i % EDUCATIONS.len()];
        records.push(
            Record::new()
                .with("age", age)
                .with("hours-per-week", hours)
                .with("workclass", WORKCLASSES[i % WORKCLASSES.len()])
                .with("education", education),
        );
        let rich = age > 35.0 && hours > 40.0 && education != "HS-grad";
        labels.push(if rich { ">50K" } else { "<=50K" }.to_string());
    }
    (records, labels)
}

fn setup_benchmark_pipeline(n_estimators: usize, n_jobs: usize) -> Pipeline {
    let schema = Schema::new(
        vec!["age", "hours-per-week"],
        vec!["workclass", "education"],
        "income",
    )
    .unwrap();
    let (records, labels) = synthetic_rows(2_000);
    Pipeline::builder()
        .with_schema(schema)
        .with_n_estimators(n_estimators)
        .with_n_jobs(n_jobs)
        .with_seed(42)
        .fit(&records, &labels)
        .unwrap()
}

fn bench_transform(c: &mut Criterion) {
    let pipeline = setup_benchmark_pipeline(10, 0);
    let mut group = c.benchmark_group("Transform");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for &rows in &[1usize, 100, 1_000] {
        let (records, _) = synthetic_rows(rows);
        group.bench_function(format!("rows_{}", rows), |b| {
            b.iter(|| pipeline.transform_params().transform(black_box(&records)).unwrap())
        });
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let (single, _) = synthetic_rows(1);
    let (batch, _) = synthetic_rows(500);
    for &n_estimators in &[10usize, 50] {
        let pipeline = setup_benchmark_pipeline(n_estimators, 0);
        group.bench_function(format!("single_{}_trees", n_estimators), |b| {
            b.iter(|| pipeline.predict(black_box(&single)).unwrap())
        });
        group.bench_function(format!("batch_500_{}_trees", n_estimators), |b| {
            b.iter(|| pipeline.predict(black_box(&batch)).unwrap())
        });
    }

    group.finish();
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("Training");
    group.sample_size(10);

    for &n_jobs in &[1usize, 4] {
        group.bench_function(format!("fit_20_trees_{}_jobs", n_jobs), |b| {
            b.iter(|| setup_benchmark_pipeline(20, n_jobs))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_transform, bench_prediction, bench_training);
criterion_main!(benches);
