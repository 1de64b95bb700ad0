//! Performance benchmarks for stratum-state drafts and patches.
//!
//! Run with: cargo bench --package stratum-state

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use std::hint::black_box;
use stratum_state::{apply_patch, manage, path, Manager, Op, Patch, Path, Seg, Value};

// ============================================================================
// Helper functions to generate test data
// ============================================================================

/// Generate a flat object with N fields
fn generate_flat_doc(num_fields: usize) -> Value {
    (0..num_fields)
        .map(|i| (format!("field_{i}"), Value::from(i)))
        .collect::<stratum_state::Object>()
        .into()
}

/// Generate a deeply nested object and the path of its leaf
fn generate_nested_doc(depth: usize) -> (Value, Path) {
    let mut current = Value::from(json!({"value": 42}));
    for i in (0..depth).rev() {
        current = [(format!("level_{i}"), current)]
            .into_iter()
            .collect::<stratum_state::Object>()
            .into();
    }
    let mut leaf: Path = (0..depth).map(|i| Seg::key(format!("level_{i}"))).collect();
    leaf.push("value");
    (current, leaf)
}

fn generate_list(len: usize) -> Value {
    Value::from(json!({"items": (0..len).map(|i| json!({"id": i, "done": false})).collect::<Vec<_>>()}))
}

// ============================================================================
// Benchmark: untouched drafts
// ============================================================================

fn bench_noop_manage(c: &mut Criterion) {
    let mut group = c.benchmark_group("manage_noop");

    for num_fields in [10, 100, 1000, 10000] {
        let doc = generate_flat_doc(num_fields);
        group.bench_with_input(BenchmarkId::from_parameter(num_fields), &doc, |b, doc| {
            b.iter(|| black_box(manage(black_box(doc.clone()), |_| Ok(()))));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: single write in a wide object
// ============================================================================

fn bench_flat_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("manage_flat_write");

    for num_fields in [10, 100, 1000, 10000] {
        group.throughput(Throughput::Elements(num_fields as u64));
        let doc = generate_flat_doc(num_fields);
        group.bench_with_input(BenchmarkId::from_parameter(num_fields), &doc, |b, doc| {
            b.iter(|| black_box(manage(doc.clone(), |draft| draft.set("field_0", -1))));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: deep write versus patch replay
// ============================================================================

fn bench_nested_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("manage_nested_write");

    for depth in [5, 10, 20, 50] {
        let (doc, leaf) = generate_nested_doc(depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &doc, |b, doc| {
            b.iter(|| {
                black_box(manage(doc.clone(), |draft| {
                    let mut current = *draft;
                    for seg in &leaf.segments()[..depth] {
                        current = current.draft(seg.clone())?;
                    }
                    current.set("value", 999)
                }))
            });
        });

        let patch = Patch::new().with_op(Op::set(leaf.clone(), 999));
        group.bench_with_input(BenchmarkId::new("apply_patch", depth), &doc, |b, doc| {
            b.iter(|| black_box(apply_patch(black_box(doc), black_box(&patch))));
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: recording patches
// ============================================================================

fn bench_patch_recording(c: &mut Criterion) {
    let mut group = c.benchmark_group("manage_with_patches");
    let manager = Manager::new();

    for len in [10, 100, 1000] {
        let doc = generate_list(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &doc, |b, doc| {
            b.iter(|| {
                black_box(manager.manage_with_patches(doc.clone(), |draft| {
                    let items = draft.draft("items")?;
                    items.draft(len / 2)?.set("done", true)?;
                    items.push(json!({"id": len, "done": false}))
                }))
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: deep freeze
// ============================================================================

fn bench_freeze(c: &mut Criterion) {
    let mut group = c.benchmark_group("freeze_deep");

    for len in [100, 1000] {
        group.bench_function(BenchmarkId::from_parameter(len), |b| {
            b.iter_batched(
                || generate_list(len),
                |doc| black_box(stratum_state::freeze(doc, true)),
                BatchSize::SmallInput,
            );
        });
    }

    let frozen = stratum_state::freeze(generate_list(1000), true);
    group.bench_function("already_frozen", |b| {
        b.iter(|| black_box(stratum_state::freeze(frozen.clone(), true)));
    });

    group.finish();
}

fn bench_operation_types(c: &mut Criterion) {
    let mut group = c.benchmark_group("operation_types");
    let doc = Value::from(json!({
        "counter": 0,
        "items": [1, 2, 3],
        "user": {"name": "Alice", "age": 30}
    }));

    for (name, op) in [
        ("set", Op::set(path!("counter"), 42)),
        ("append", Op::append(path!("items"), 4)),
        ("insert", Op::insert(path!("items"), 0, 0)),
        ("delete", Op::delete(path!("user", "age"))),
    ] {
        let patch = Patch::new().with_op(op);
        group.bench_function(name, |b| {
            b.iter(|| black_box(apply_patch(black_box(&doc), black_box(&patch))));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_noop_manage,
    bench_flat_write,
    bench_nested_write,
    bench_patch_recording,
    bench_freeze,
    bench_operation_types,
);

criterion_main!(benches);
