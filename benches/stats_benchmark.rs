use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pet_classifier::report::write_results;
use pet_classifier::stats::calculate_results_stats;
use pet_classifier::{PetImageResult, PetResults, ReportOptions};

fn synthetic_results(count: usize) -> PetResults {
    (0..count)
        .map(|i| {
            let pet_is_dog = i % 3 != 0;
            let classifier_is_dog = i % 5 != 0;
            let is_match = i % 2 == 0;
            (
                format!("Image_{:05}.jpg", i),
                PetImageResult::new("beagle", "walker hound, walker foxhound", is_match, pet_is_dog, classifier_is_dog),
            )
        })
        .collect()
}

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Aggregation");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for &count in &[40, 1_000, 50_000] {
        let results = synthetic_results(count);
        group.bench_function(format!("images_{}", count), |b| b.iter(|| {
            calculate_results_stats(black_box(&results)).unwrap()
        }));
    }

    group.finish();
}

fn bench_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("Report");
    group.sample_size(50);

    let results = synthetic_results(1_000);
    let stats = calculate_results_stats(&results).unwrap();
    let options = ReportOptions {
        print_incorrect_dogs: true,
        print_incorrect_breed: true,
    };

    group.bench_function("write_results_1000", |b| b.iter(|| {
        let mut out = Vec::with_capacity(64 * 1024);
        write_results(&mut out, black_box(&results), &stats, "vgg", options).unwrap();
        out
    }));

    group.finish();
}

criterion_group!(
    benches,
    bench_aggregation,
    bench_report
);
criterion_main!(benches);
