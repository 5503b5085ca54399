use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

use fixerp_kv::{KVStore, RedbStore};

fn bench_set(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = RedbStore::open(&tmp.path().join("bench.redb")).unwrap();

    c.bench_function("kv_set", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("cart:pos:till1:{}", i);
            store.set(black_box(&key), black_box(b"line item")).unwrap();
            i += 1;
        });
    });
}

fn bench_get(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = RedbStore::open(&tmp.path().join("bench.redb")).unwrap();

    // Pre-populate.
    for i in 0..1000 {
        let key = format!("cart:pos:till1:{:04}", i);
        store.set(&key, b"line item").unwrap();
    }

    c.bench_function("kv_get", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("cart:pos:till1:{:04}", i % 1000);
            let _ = store.get(black_box(&key)).unwrap();
            i += 1;
        });
    });
}

fn bench_scan_cart(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = RedbStore::open(&tmp.path().join("bench.redb")).unwrap();

    // A busy cart: 50 lines, surrounded by other carts.
    for i in 0..1000 {
        let key = format!("cart:stockin:c{:03}:{:02}", i / 50, i % 50);
        store.set(&key, b"line item").unwrap();
    }

    c.bench_function("kv_scan_cart_50", |b| {
        b.iter(|| {
            let results = store.scan(black_box("cart:stockin:c010:")).unwrap();
            assert_eq!(results.len(), 50);
        });
    });
}

fn bench_clear_cart(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = RedbStore::open(&tmp.path().join("bench.redb")).unwrap();

    c.bench_function("kv_clear_cart_50", |b| {
        b.iter(|| {
            for i in 0..50 {
                let key = format!("cart:pos:till9:{:02}", i);
                store.set(&key, b"line item").unwrap();
            }
            let removed = store.delete_prefix(black_box("cart:pos:till9:")).unwrap();
            assert_eq!(removed, 50);
        });
    });
}

criterion_group!(benches, bench_set, bench_get, bench_scan_cart, bench_clear_cart);
criterion_main!(benches);
