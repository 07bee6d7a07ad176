use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeMap;
use xenoscan::scoring::{consecutive_scans, ScanScorer, ScoringConfig};
use xenoscan::search::{AcquisitionMode, HitBundle, ScanHit};

/// Sparse scan list with runs of 5 separated by gaps of 10
fn scan_list(len: usize) -> Vec<usize> {
    (0..len).map(|i| (i / 5) * 15 + i % 5).collect()
}

/// Synthetic bundle with `ladders` three-rung ladders over `scans` scans
fn create_bundle(ladders: usize, scans: usize) -> HitBundle {
    let mut hits = BTreeMap::new();
    for ladder in 0..ladders {
        let parent = format!("C{}H20O2_{:.6}", 10 + ladder, 200.0 + ladder as f64);
        let keys = [
            format!("{}$M+H[1+];0", parent),
            format!("{}$M+H[1+],(C13);1", parent),
            format!("{}$M+H[1+],(2C13);2", parent),
        ];
        for (rung, key) in keys.into_iter().enumerate() {
            let scale = 1.0 / (1.0 + rung as f64 * 4.0);
            let series: Vec<ScanHit> = (0..scans)
                .filter(|scan| (scan + ladder) % 40 < 12 - rung * 2)
                .map(|scan| {
                    let phase = ((scan + ladder) % 40) as f64;
                    ScanHit {
                        scan,
                        intensity: (1000.0 * (-(phase - 5.0).powi(2) / 8.0).exp() + 10.0) * scale,
                        mz: 201.0 + ladder as f64 + rung as f64,
                        time: scan as f64 * 0.8,
                    }
                })
                .collect();
            hits.insert(key, series);
        }
    }
    HitBundle {
        sigmap: BTreeMap::new(),
        sample: "bench".into(),
        max_scan: scans - 1,
        hits,
        signature_map: Vec::new(),
        mode: Some(AcquisitionMode::Positive),
    }
}

/// Benchmark the gap-tolerant clusterer
fn bench_clusterer(c: &mut Criterion) {
    let mut group = c.benchmark_group("consecutive_scans");

    for len in [1_000, 10_000, 100_000] {
        let scans = scan_list(len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &scans, |b, s| {
            b.iter(|| consecutive_scans(black_box(s), 2, 2))
        });
    }

    group.finish();
}

/// Benchmark scoring a whole bundle
fn bench_score_bundle(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_bundle");

    for ladders in [10, 100] {
        let bundle = create_bundle(ladders, 400);
        group.throughput(Throughput::Elements(bundle.hit_count() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}ladders", ladders)),
            &bundle,
            |b, bundle| {
                let mut scorer = ScanScorer::new(ScoringConfig::default()).unwrap();
                b.iter(|| scorer.score_bundle(black_box(bundle)).unwrap())
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_clusterer, bench_score_bundle);
criterion_main!(benches);
