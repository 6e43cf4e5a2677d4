use criterion::{Criterion, black_box, criterion_group, criterion_main};
use refresher_core::{Recipe, plan_dispense};

fn bench_plan(c: &mut Criterion) {
    let recipe = Recipe {
        name: "lemonade".into(),
        ratios: [0.5, 0.0, 0.0, 0.5, 0.0],
    };
    c.bench_function("plan_dispense", |b| {
        b.iter(|| plan_dispense(black_box(&recipe), black_box(16.0), black_box(2.5)))
    });

    c.bench_function("plan_dispense_total", |b| {
        b.iter(|| {
            plan_dispense(black_box(&recipe), black_box(30.0), black_box(2.5)).total_seconds()
        })
    });
}

criterion_group!(benches, bench_plan);
criterion_main!(benches);
