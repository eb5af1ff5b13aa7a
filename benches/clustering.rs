//! Benchmarks for matrix construction and clustering.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sockscan::cluster::{perform_dbscan, perform_hac};
use sockscan::distance::jaccard_distance;
use sockscan::ident::{PosterId, ThreadKey};
use sockscan::keyset::KeysetMap;

/// Deterministic synthetic universe: `n` posters spread over `threads`
/// threads, with overlapping histories so clusters actually form.
fn synthetic_keysets(n: usize, threads: usize) -> KeysetMap {
    let mut map = KeysetMap::new();
    for i in 0..n {
        let keys: Vec<ThreadKey> = (0..threads)
            .filter(|t| (i + t) % 3 != 0)
            .map(|t| ThreadKey::new(format!("{t}")))
            .collect();
        map.insert(PosterId::new(format!("id{i}")), keys);
    }
    map
}

fn bench_jaccard(c: &mut Criterion) {
    let map = synthetic_keysets(100, 20);
    c.bench_function("jaccard_100x20", |bench| {
        bench.iter(|| black_box(jaccard_distance(&map)))
    });
}

fn bench_hac(c: &mut Criterion) {
    let map = synthetic_keysets(100, 20);
    let ids = map.posters();
    let matrix = jaccard_distance(&map);
    c.bench_function("hac_100", |bench| {
        bench.iter(|| black_box(perform_hac(&ids, &matrix)))
    });
}

fn bench_dbscan(c: &mut Criterion) {
    let map = synthetic_keysets(100, 20);
    let ids = map.posters();
    let matrix = jaccard_distance(&map);
    c.bench_function("dbscan_100", |bench| {
        bench.iter(|| black_box(perform_dbscan(&ids, &matrix)))
    });
}

criterion_group!(benches, bench_jaccard, bench_hac, bench_dbscan);
criterion_main!(benches);
