// Criterion benchmarks: dictionary construction and the three query kinds
// over a synthetic key set.
//
// Run:
//   cargo bench

use criterion::{criterion_group, criterion_main, Criterion};
use fst_dict::{build_fst, Pair};

/// Deterministic pseudo-random key set; no fixture files needed.
fn synthetic_entries(n: usize) -> Vec<Pair> {
    (0..n)
        .map(|i| {
            let scrambled = (i as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
            Pair::new(format!("{:04}-{scrambled:012x}", i % 500), i as i32 + 1)
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let entries = synthetic_entries(10_000);
    c.bench_function("build_10k_keys", |b| {
        b.iter(|| std::hint::black_box(build_fst(entries.clone()).unwrap()));
    });
}

fn bench_search(c: &mut Criterion) {
    let entries = synthetic_entries(10_000);
    let probes: Vec<Vec<u8>> = entries
        .iter()
        .step_by(11)
        .map(|p| p.input.clone())
        .collect();
    let fst = build_fst(entries).unwrap();

    c.bench_function("search_hits", |b| {
        b.iter(|| {
            for probe in &probes {
                std::hint::black_box(fst.search(probe));
            }
        });
    });

    c.bench_function("search_misses", |b| {
        b.iter(|| {
            for probe in &probes {
                let mut miss = probe.clone();
                miss.push(b'!');
                std::hint::black_box(fst.search(&miss));
            }
        });
    });
}

fn bench_prefix_queries(c: &mut Criterion) {
    let entries = synthetic_entries(10_000);
    let probes: Vec<Vec<u8>> = entries
        .iter()
        .step_by(23)
        .map(|p| {
            let mut q = p.input.clone();
            q.extend_from_slice(b"-suffix");
            q
        })
        .collect();
    let fst = build_fst(entries).unwrap();

    c.bench_function("prefix_search", |b| {
        b.iter(|| {
            for probe in &probes {
                std::hint::black_box(fst.prefix_search(probe));
            }
        });
    });

    c.bench_function("common_prefix_search", |b| {
        b.iter(|| {
            for probe in &probes {
                std::hint::black_box(fst.common_prefix_search(probe));
            }
        });
    });
}

criterion_group!(benches, bench_build, bench_search, bench_prefix_queries);
criterion_main!(benches);
