//! Benchmarks for shim building and dispatch.
//!
//! ## Profiling with Puffin
//!
//! Run with the `profile-with-puffin` feature to collect per-stage timings:
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use nativeshim::{
    BindingDescriptor, BindingTable, BoxError, DataType, Dispatch, Dynamic, InterfaceEntry,
    MethodSignature, NativeBinding, NativeError, NativeLinker, ShimFactory, TypeEntry,
    UnlinkedLinker,
};
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// Linker that answers every call without leaving the process.
struct NullLinker;

impl NativeLinker for NullLinker {
    fn invoke(&self, _binding: &BindingDescriptor, _args: &[Dynamic]) -> Result<Dynamic, NativeError> {
        Ok(Dynamic::Int(0))
    }
}

/// An interface with `methods` two-argument methods, every other one bound.
fn interface(methods: usize) -> (TypeEntry, BindingTable) {
    let mut iface = InterfaceEntry::new(format!("IBench{methods}"));
    let mut bindings = BindingTable::new();
    for i in 0..methods {
        let sig = MethodSignature::new(
            format!("Method{i}"),
            vec![DataType::INT32, DataType::DOUBLE],
            DataType::INT32,
        );
        if i % 2 == 0 {
            bindings.bind(&sig, NativeBinding::new("bench"));
        }
        iface = iface.with_method(sig);
    }
    (iface.into(), bindings)
}

fn build_benchmarks(c: &mut Criterion) {
    setup_profiler();

    let factory = ShimFactory::new().with_linker(UnlinkedLinker);
    let filtered = ShimFactory::new()
        .with_linker(UnlinkedLinker)
        .with_filter(|d: &mut BindingDescriptor| -> Result<(), BoxError> {
            d.entry_point.insert_str(0, "bench_");
            Ok(())
        });

    let mut group = c.benchmark_group("build");
    for methods in [0, 8, 64, 512] {
        let (target, bindings) = interface(methods);
        group.throughput(Throughput::Elements(methods as u64));
        group.bench_with_input(BenchmarkId::new("plain", methods), &methods, |b, _| {
            b.iter(|| {
                let shim = factory.build(black_box(&target), black_box(&bindings)).unwrap();
                end_profiling_frame();
                black_box(shim)
            });
        });
        group.bench_with_input(BenchmarkId::new("filtered", methods), &methods, |b, _| {
            b.iter(|| black_box(filtered.build(black_box(&target), black_box(&bindings)).unwrap()));
        });
    }
    group.finish();
}

fn dispatch_benchmarks(c: &mut Criterion) {
    let (target, bindings) = interface(64);
    let shim = ShimFactory::new()
        .with_linker(NullLinker)
        .build(&target, &bindings)
        .unwrap();
    let bound = MethodSignature::new("Method0", vec![DataType::INT32, DataType::DOUBLE], DataType::INT32);
    let unbound = MethodSignature::new("Method1", vec![DataType::INT32, DataType::DOUBLE], DataType::INT32);
    let args = [Dynamic::Int(1), Dynamic::Float(2.0)];

    let mut group = c.benchmark_group("dispatch");
    group.bench_function("by_signature/native", |b| {
        let hash = bound.signature_hash();
        b.iter(|| black_box(shim.invoke(black_box(hash), &args)))
    });
    group.bench_function("by_signature/not_implemented", |b| {
        let hash = unbound.signature_hash();
        b.iter(|| black_box(shim.invoke(black_box(hash), &args)))
    });
    group.bench_function("by_name/native", |b| {
        b.iter(|| black_box(shim.call(black_box("Method0"), &args)))
    });
    group.finish();
}

criterion_group!(benches, build_benchmarks, dispatch_benchmarks);
criterion_main!(benches);
