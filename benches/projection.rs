//! Performance measurement for coordinate projection across grid shapes

// Criterion macros generate undocumented functions
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use gridmap::geometry::config::{CellShape, GridGeometry, GridLayout, OffsetAxis};
use std::hint::black_box;

fn geometry_for(shape: CellShape) -> GridGeometry {
    GridGeometry {
        shape,
        offset_axis: OffsetAxis::Horizontal,
        layout: GridLayout::StairsRight,
        cell_size: [64.0, 32.0],
    }
}

/// Measures the forward projection per shape
fn bench_cell_to_world(c: &mut Criterion) {
    let mut group = c.benchmark_group("cell_to_world");
    for shape in [
        CellShape::Square,
        CellShape::Isometric,
        CellShape::Hexagon,
    ] {
        let geometry = geometry_for(shape);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{shape:?}")),
            &geometry,
            |b, geometry| {
                b.iter(|| geometry.cell_to_world(black_box([123, -45])));
            },
        );
    }
    group.finish();
}

/// Measures a full round trip through the smart-floor inverse per shape
fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection_round_trip");
    for shape in [
        CellShape::Square,
        CellShape::Isometric,
        CellShape::Hexagon,
    ] {
        let geometry = geometry_for(shape);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{shape:?}")),
            &geometry,
            |b, geometry| {
                b.iter(|| {
                    let world = geometry.cell_to_world(black_box([123, -45]));
                    black_box(geometry.world_to_cell(world))
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_cell_to_world, bench_round_trip);
criterion_main!(benches);
