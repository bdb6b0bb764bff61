use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gradesync_core::matching::IdentityMatcher;

fn ids(count: usize, noise: bool) -> Vec<String> {
    (0..count)
        .map(|i| {
            let id = format!("{:08}", 10_000_000 + i * 37);
            if noise && i % 3 == 0 {
                id.replacen('0', "8", 1)
            } else {
                id
            }
        })
        .collect()
}

fn bench_match_ids(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_ids");

    let roster = ids(60, false);
    let clean = ids(60, false);
    let noisy = ids(60, true);

    group.bench_function("exact_only", |b| {
        let matcher = IdentityMatcher::exact_only();
        b.iter(|| matcher.match_ids(black_box(&roster), black_box(&clean)))
    });

    if let Ok(matcher) = IdentityMatcher::new(80.0) {
        group.bench_function("fuzzy_80_noisy", |b| {
            b.iter(|| matcher.match_ids(black_box(&roster), black_box(&noisy)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_match_ids);
criterion_main!(benches);
