//! Performance measurement for edit bursts and incremental flushes

// Criterion macros generate undocumented functions
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use gridmap::catalog::StaticCatalog;
use gridmap::geometry::config::GridGeometry;
use gridmap::map::GridMap;
use gridmap::map::cell::CellRef;
use std::hint::black_box;
use std::rc::Rc;

fn fresh_map() -> GridMap {
    let catalog = StaticCatalog::new(GridGeometry::square([16.0, 16.0]));
    let mut map = GridMap::with_catalog(Rc::new(catalog));
    map.attach();
    map
}

/// Measures painting an n-by-n block and flushing it once
fn bench_paint_and_flush(c: &mut Criterion) {
    let mut group = c.benchmark_group("paint_and_flush");
    for side in &[16i32, 64, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(side), side, |b, &side| {
            b.iter(|| {
                let mut map = fresh_map();
                for x in 0..side {
                    for y in 0..side {
                        if map
                            .set_cell(0, [x, y], CellRef::new(1, [0, 0], 0))
                            .is_err()
                        {
                            return;
                        }
                    }
                }
                black_box(map.update());
            });
        });
    }
    group.finish();
}

/// Measures re-flushing after touching one cell per bucket
fn bench_sparse_redirty(c: &mut Criterion) {
    let mut map = fresh_map();
    for x in 0..128 {
        for y in 0..128 {
            if map.set_cell(0, [x, y], CellRef::new(1, [0, 0], 0)).is_err() {
                return;
            }
        }
    }
    map.update();

    c.bench_function("sparse_redirty_flush", |b| {
        b.iter(|| {
            for bucket in 0..8 {
                let coords = [bucket * 16, bucket * 16];
                if map.set_cell(0, coords, CellRef::new(2, [0, 0], 0)).is_err() {
                    return;
                }
                if map.set_cell(0, coords, CellRef::new(1, [0, 0], 0)).is_err() {
                    return;
                }
            }
            black_box(map.update());
        });
    });
}

criterion_group!(benches, bench_paint_and_flush, bench_sparse_redirty);
criterion_main!(benches);
