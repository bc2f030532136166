use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use vault_engine::simulation::inflation_attack::{run_inflation_attack, AttackConfig};
use vault_engine::simulation::workload::{apply_workload, build_vault, generate_workload, WorkloadConfig};
use vault_engine::vault::conversion::{shares_for, Rounding};

fn bench_conversion(c: &mut Criterion) {
    c.bench_function("shares_for_offset_6", |b| {
        b.iter(|| {
            shares_for(
                black_box(123_456_789_000),
                black_box(98_765_432_100_000),
                black_box(97_000_000_000_000_000_000),
                6,
                Rounding::Down,
            )
        })
    });
}

fn bench_workload(c: &mut Criterion, steps: usize, name: &str) {
    let config = WorkloadConfig {
        holders: 20,
        steps,
        ..Default::default()
    };
    let workload = generate_workload(&config, &mut StdRng::seed_from_u64(1));

    c.bench_function(name, |b| {
        b.iter(|| {
            let mut vault = build_vault(&config).expect("workload vault deploys");
            apply_workload(&mut vault, black_box(&workload))
        })
    });
}

fn bench_workload_100_steps(c: &mut Criterion) {
    bench_workload(c, 100, "workload_100_steps");
}

fn bench_workload_1000_steps(c: &mut Criterion) {
    bench_workload(c, 1000, "workload_1000_steps");
}

fn bench_inflation_attack(c: &mut Criterion) {
    let config = AttackConfig {
        victims: 16,
        ..Default::default()
    };
    c.bench_function("inflation_attack_16_victims", |b| {
        b.iter(|| run_inflation_attack(black_box(&config)))
    });
}

criterion_group!(
    benches,
    bench_conversion,
    bench_workload_100_steps,
    bench_workload_1000_steps,
    bench_inflation_attack
);
criterion_main!(benches);
