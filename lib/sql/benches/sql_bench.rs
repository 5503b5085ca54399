use criterion::{black_box, criterion_group, criterion_main, Criterion};

use fixerp_sql::{BatchStmt, SQLStore, SqliteStore, Value};

fn bench_exec_insert(c: &mut Criterion) {
    let store = SqliteStore::open_in_memory().unwrap();
    store
        .exec(
            "CREATE TABLE movements (id INTEGER PRIMARY KEY AUTOINCREMENT, component_id TEXT, qty INTEGER)",
            &[],
        )
        .unwrap();

    c.bench_function("sqlite_insert", |b| {
        b.iter(|| {
            store
                .exec(
                    "INSERT INTO movements (component_id, qty) VALUES (?1, ?2)",
                    &[Value::Text("scr-001".to_string()), Value::Integer(3)],
                )
                .unwrap();
        });
    });
}

fn bench_query_by_id(c: &mut Criterion) {
    let store = SqliteStore::open_in_memory().unwrap();
    store
        .exec(
            "CREATE TABLE components (id TEXT PRIMARY KEY, name TEXT, stock INTEGER)",
            &[],
        )
        .unwrap();

    for i in 0..10000 {
        store
            .exec(
                "INSERT INTO components (id, name, stock) VALUES (?1, ?2, ?3)",
                &[
                    Value::Text(format!("cmp-{i:05}")),
                    Value::Text(format!("part {i}")),
                    Value::Integer(100),
                ],
            )
            .unwrap();
    }

    c.bench_function("sqlite_query_by_id", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let id = format!("cmp-{:05}", i % 10000);
            let rows = store
                .query(
                    "SELECT * FROM components WHERE id = ?1",
                    &[Value::Text(black_box(id))],
                )
                .unwrap();
            assert_eq!(rows.len(), 1);
            i += 1;
        });
    });
}

fn bench_exec_batch_checkout(c: &mut Criterion) {
    let store = SqliteStore::open_in_memory().unwrap();
    store
        .exec(
            "CREATE TABLE components (id TEXT PRIMARY KEY, stock INTEGER)",
            &[],
        )
        .unwrap();
    store
        .exec(
            "CREATE TABLE movements (id INTEGER PRIMARY KEY AUTOINCREMENT, component_id TEXT, qty INTEGER)",
            &[],
        )
        .unwrap();
    for i in 0..100 {
        store
            .exec(
                "INSERT INTO components (id, stock) VALUES (?1, ?2)",
                &[Value::Text(format!("cmp-{i:03}")), Value::Integer(1_000_000_000)],
            )
            .unwrap();
    }

    // A five-line commit: guarded decrement plus ledger row per line.
    c.bench_function("sqlite_exec_batch_5_lines", |b| {
        b.iter(|| {
            let mut stmts = Vec::with_capacity(10);
            for i in 0..5 {
                let id = format!("cmp-{i:03}");
                stmts.push(BatchStmt::guarded(
                    "UPDATE components SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1",
                    vec![Value::Integer(1), Value::Text(id.clone())],
                    "out of stock",
                ));
                stmts.push(BatchStmt::new(
                    "INSERT INTO movements (component_id, qty) VALUES (?1, ?2)",
                    vec![Value::Text(id), Value::Integer(-1)],
                ));
            }
            store.exec_batch(black_box(&stmts)).unwrap();
        });
    });
}

criterion_group!(benches, bench_exec_insert, bench_query_by_id, bench_exec_batch_checkout);
criterion_main!(benches);
