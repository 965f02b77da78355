use chrono::NaiveDate;
use criterion::{Criterion, criterion_group, criterion_main};
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;
use review_scheduler::{
    SchedulerError, SimulationConfig, SimulationResult, Topic, simulate, simulate_many,
};
use std::hint::black_box;

fn topics(n: usize) -> Vec<Topic> {
    (0..n)
        .map(|i| Topic::new(format!("t{i}"), format!("Topic {i}")).with_difficulty((i % 10) as f32))
        .collect()
}

/// Average minutes per recalled review for each budget from 30 to 240 minutes.
pub(crate) fn parallel_budgets(topics: &[Topic]) -> Result<Vec<f32>, SchedulerError> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (2..=16)
        .into_par_iter()
        .map(|i| {
            let config = SimulationConfig {
                daily_budget_minutes: i * 15,
                ..Default::default()
            };
            let SimulationResult {
                correct_cnt_per_day,
                minutes_per_day,
                ..
            } = simulate(&config, topics, start, Some(i as u64 + 42))?;
            let correct = correct_cnt_per_day.iter().sum::<usize>().max(1);
            Ok(minutes_per_day.iter().sum::<u32>() as f32 / correct as f32)
        })
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let topics = topics(2_000);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let config = SimulationConfig {
        learn_span: 365,
        daily_budget_minutes: 600,
        ..Default::default()
    };
    c.bench_function("simulate", |b| {
        b.iter(|| black_box(simulate(&config, &topics, start, None)))
    });
    c.bench_function("simulate_many", |b| {
        b.iter(|| black_box(simulate_many(&config, &topics, start, 16)))
    });
    c.bench_function("parallel_budgets", |b| {
        b.iter(|| black_box(parallel_budgets(&topics)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
