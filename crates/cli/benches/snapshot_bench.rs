use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use record::{User, MAX_USERS};
use storage::Storage;
use tempfile::tempdir;

fn user(i: usize) -> User {
    User::new(format!("u{i}"), 40, true, 80.0, vec!["Dune".into()])
}

fn storage_append(c: &mut Criterion) {
    c.bench_function("storage_append_sync_8", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let storage = Storage::open(dir.path().join("bench.db")).unwrap();
                (dir, storage)
            },
            |(_dir, mut storage)| {
                for i in 0..MAX_USERS {
                    storage.append(&user(i)).unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn storage_snapshot(c: &mut Criterion) {
    let users: Vec<User> = (0..MAX_USERS).map(user).collect();
    c.bench_function("storage_snapshot_8", |b| {
        b.iter_batched(
            || {
                let dir = tempdir().unwrap();
                let storage = Storage::open(dir.path().join("bench.db")).unwrap();
                (dir, storage)
            },
            |(_dir, mut storage)| storage.save_snapshot(&users).unwrap(),
            BatchSize::SmallInput,
        );
    });
}

fn storage_load(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let mut storage = Storage::open(dir.path().join("bench.db")).unwrap();
    let users: Vec<User> = (0..MAX_USERS).map(user).collect();
    storage.save_snapshot(&users).unwrap();

    c.bench_function("storage_load_8", |b| {
        b.iter(|| storage.load().unwrap());
    });
}

criterion_group!(benches, storage_append, storage_snapshot, storage_load);
criterion_main!(benches);
