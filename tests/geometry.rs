//! Validates coordinate projections, neighbor adjacency and layout
//! conversions across every grid geometry

use gridmap::geometry::config::{CellShape, GridGeometry, GridLayout, OffsetAxis};
use gridmap::geometry::layout::transform_layout;
use gridmap::geometry::neighbor::CellNeighbor;

const SHAPES: [CellShape; 4] = [
    CellShape::Square,
    CellShape::Isometric,
    CellShape::HalfOffsetSquare,
    CellShape::Hexagon,
];

const AXES: [OffsetAxis; 2] = [OffsetAxis::Horizontal, OffsetAxis::Vertical];

const LAYOUTS: [GridLayout; 6] = [
    GridLayout::Stacked,
    GridLayout::StackedOffset,
    GridLayout::StairsRight,
    GridLayout::StairsDown,
    GridLayout::DiamondRight,
    GridLayout::DiamondDown,
];

fn all_geometries() -> Vec<GridGeometry> {
    let mut geometries = Vec::new();
    for shape in SHAPES {
        for offset_axis in AXES {
            for layout in LAYOUTS {
                for cell_size in [[16.0, 16.0], [64.0, 32.0]] {
                    geometries.push(GridGeometry {
                        shape,
                        offset_axis,
                        layout,
                        cell_size,
                    });
                }
            }
        }
    }
    geometries
}

#[test]
fn test_cell_centers_round_trip_exactly() {
    for geometry in all_geometries() {
        for x in -8..=8 {
            for y in -8..=8 {
                let world = geometry.cell_to_world([x, y]);
                assert_eq!(
                    geometry.world_to_cell(world),
                    [x, y],
                    "round trip failed for {geometry:?} at ({x}, {y})"
                );
            }
        }
    }
}

#[test]
fn test_interior_points_map_to_their_cell() {
    // Offsets small enough to stay inside the cell polygon of every shape.
    let offsets: [[f64; 2]; 4] = [[0.15, 0.0], [-0.15, 0.0], [0.0, 0.15], [0.1, -0.1]];
    for geometry in all_geometries() {
        for x in -4..=4 {
            for y in -4..=4 {
                let center = geometry.cell_to_world([x, y]);
                for offset in offsets {
                    let point = [
                        offset[0].mul_add(geometry.cell_size[0], center[0]),
                        offset[1].mul_add(geometry.cell_size[1], center[1]),
                    ];
                    assert_eq!(
                        geometry.world_to_cell(point),
                        [x, y],
                        "interior point failed for {geometry:?} at ({x}, {y}) offset {offset:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn test_neighbor_symmetry_for_every_valid_direction() {
    for geometry in all_geometries() {
        for direction in CellNeighbor::ALL {
            if !geometry.is_valid_direction(direction) {
                continue;
            }
            for x in -3..=3 {
                for y in -3..=3 {
                    let Ok(neighbor) = geometry.neighbor([x, y], direction) else {
                        unreachable!("valid direction rejected");
                    };
                    assert_ne!(neighbor, [x, y], "neighbor must move for {geometry:?}");
                    assert_eq!(
                        geometry.neighbor(neighbor, direction.opposite()).ok(),
                        Some([x, y]),
                        "symmetry failed for {geometry:?} direction {direction:?} at ({x}, {y})"
                    );
                }
            }
        }
    }
}

#[test]
fn test_invalid_directions_are_rejected() {
    let square = GridGeometry::square([16.0, 16.0]);
    assert!(!square.is_valid_direction(CellNeighbor::RightCorner));
    assert!(square.neighbor([0, 0], CellNeighbor::RightCorner).is_err());

    let hexagon = GridGeometry {
        shape: CellShape::Hexagon,
        offset_axis: OffsetAxis::Horizontal,
        layout: GridLayout::Stacked,
        cell_size: [16.0, 16.0],
    };
    assert!(!hexagon.is_valid_direction(CellNeighbor::BottomSide));
    assert!(hexagon.neighbor([0, 0], CellNeighbor::BottomSide).is_err());
}

#[test]
fn test_surrounding_cells_are_distinct_side_neighbors() {
    for geometry in all_geometries() {
        let around = geometry.surrounding_cells([2, -1]);
        let expected = match geometry.shape {
            CellShape::Square | CellShape::Isometric => 4,
            CellShape::HalfOffsetSquare | CellShape::Hexagon => 6,
        };
        assert_eq!(around.len(), expected, "count wrong for {geometry:?}");
        let mut unique = around.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), around.len(), "duplicates for {geometry:?}");
    }
}

#[test]
fn test_layout_conversions_are_bijective() {
    for offset_axis in AXES {
        for from in LAYOUTS {
            for to in LAYOUTS {
                for x in -6..=6 {
                    for y in -6..=6 {
                        let there = transform_layout([x, y], offset_axis, from, to);
                        let back = transform_layout(there, offset_axis, to, from);
                        assert_eq!(
                            back,
                            [x, y],
                            "bijection failed {from:?} -> {to:?} on {offset_axis:?}"
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn test_layouts_agree_with_the_projection() {
    // A coordinate projected under any layout must land where its
    // stacked-layout equivalent lands under the stacked layout.
    for shape in [CellShape::Isometric, CellShape::HalfOffsetSquare, CellShape::Hexagon] {
        for offset_axis in AXES {
            for layout in LAYOUTS {
                let geometry = GridGeometry {
                    shape,
                    offset_axis,
                    layout,
                    cell_size: [32.0, 32.0],
                };
                let stacked = GridGeometry {
                    layout: GridLayout::Stacked,
                    ..geometry
                };
                for x in -5..=5 {
                    for y in -5..=5 {
                        let equivalent =
                            transform_layout([x, y], offset_axis, layout, GridLayout::Stacked);
                        let a = geometry.cell_to_world([x, y]);
                        let b = stacked.cell_to_world(equivalent);
                        assert!(
                            (a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9,
                            "projection mismatch for {geometry:?} at ({x}, {y})"
                        );
                    }
                }
            }
        }
    }
}
