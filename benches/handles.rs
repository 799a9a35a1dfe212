use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pyhandle::{build_value, Dict, Int, List, ListBuilder, Object, Runtime, RuntimeConfig};
use std::sync::Once;

static START: Once = Once::new();

/// The benchmark thread keeps the interpreter lock for the whole run
fn start_interpreter() {
    START.call_once(|| {
        let config = RuntimeConfig {
            install_signal_handlers: false,
            ..RuntimeConfig::default()
        };
        let runtime = Runtime::initialize(&config).expect("interpreter start-up");
        std::mem::forget(runtime);
    });
}

fn bench_refcount(c: &mut Criterion) {
    start_interpreter();
    let value: Object = Int::new(1_000_000).unwrap().into();

    c.bench_function("clone_drop", |b| {
        b.iter(|| {
            let copy = black_box(&value).clone();
            drop(copy);
        });
    });
}

fn bench_containers(c: &mut Criterion) {
    start_interpreter();
    let mut group = c.benchmark_group("containers");

    for size in [8usize, 64, 512] {
        let items: Vec<Object> = (0..size).map(|i| Int::from_usize(i).unwrap().into()).collect();

        group.bench_with_input(BenchmarkId::new("list_append", size), &items, |b, items| {
            b.iter(|| {
                let list = List::new().unwrap();
                for item in items {
                    list.append(item).unwrap();
                }
                black_box(list)
            });
        });

        group.bench_with_input(BenchmarkId::new("list_builder", size), &items, |b, items| {
            b.iter(|| {
                let mut builder = ListBuilder::new(items.len()).unwrap();
                for (index, item) in items.iter().enumerate() {
                    builder.set(index, item.clone()).unwrap();
                }
                black_box(builder.finish().unwrap())
            });
        });

        group.bench_with_input(BenchmarkId::new("dict_set_get", size), &items, |b, items| {
            b.iter(|| {
                let dict = Dict::new().unwrap();
                for item in items {
                    dict.set_item(item, item).unwrap();
                }
                for item in items {
                    black_box(dict.get_item(item).unwrap());
                }
            });
        });
    }

    group.finish();
}

fn bench_build_value(c: &mut Criterion) {
    start_interpreter();

    c.bench_function("build_value_nested", |b| {
        b.iter(|| {
            black_box(
                build_value("{s:i,s:(dd)}", &["n".into(), 7.into(), "xy".into(), 1.0.into(), 2.0.into()])
                    .unwrap(),
            )
        });
    });
}

criterion_group!(benches, bench_refcount, bench_containers, bench_build_value);
criterion_main!(benches);
