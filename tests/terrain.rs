//! Validates terrain constraint derivation and best-pattern selection
//! through the fill operations

use std::rc::Rc;

use gridmap::catalog::{StaticCatalog, TileData};
use gridmap::geometry::config::{CellShape, GridGeometry, GridLayout, OffsetAxis};
use gridmap::geometry::neighbor::CellNeighbor;
use gridmap::map::cell::CellRef;
use gridmap::map::GridMap;
use gridmap::terrain::pattern::{TerrainMode, TerrainPattern, peering_bits};
use gridmap::terrain::solver;

const GRASS: i32 = 0;

fn interior_tile() -> CellRef {
    CellRef::new(1, [0, 0], 0)
}

fn isolated_tile() -> CellRef {
    CellRef::new(1, [1, 0], 0)
}

fn interior_pattern() -> TerrainPattern {
    TerrainPattern::filled(
        GRASS,
        peering_bits(CellShape::Square, OffsetAxis::Horizontal),
    )
}

fn isolated_pattern() -> TerrainPattern {
    TerrainPattern::with_terrain(GRASS)
}

/// Square-grid catalog with one terrain and two patterns: a fully-connected
/// interior tile and an isolated blob tile
fn grass_catalog() -> Rc<StaticCatalog> {
    let mut catalog = StaticCatalog::new(GridGeometry {
        shape: CellShape::Square,
        offset_axis: OffsetAxis::Horizontal,
        layout: GridLayout::Stacked,
        cell_size: [16.0, 16.0],
    });
    let set = catalog.add_terrain_set(TerrainMode::CornersAndSides, 1);
    assert_eq!(set, 0);
    catalog.add_tile(
        interior_tile(),
        TileData {
            terrain_set: Some(0),
            pattern: Some(interior_pattern()),
            probability: 1.0,
        },
    );
    catalog.add_tile(
        isolated_tile(),
        TileData {
            terrain_set: Some(0),
            pattern: Some(isolated_pattern()),
            probability: 1.0,
        },
    );
    Rc::new(catalog)
}

fn grass_map() -> GridMap {
    let mut map = GridMap::with_catalog(grass_catalog());
    map.attach();
    map
}

#[test]
fn test_isolated_paint_prefers_the_unconnected_pattern() {
    let map = grass_map();
    let output = solver::fill_connect(&map, 0, &[[0, 0]], 0, GRASS, false);
    let Ok(output) = output else {
        unreachable!("fill failed");
    };
    // The isolated pattern matches the empty surroundings with zero
    // mismatches; the interior pattern would contradict all eight bits.
    assert_eq!(output.get(&[0, 0]), Some(&isolated_pattern()));
}

#[test]
fn test_adjacent_paint_connects_through_the_shared_side() {
    let mut map = grass_map();
    let painted = [[0, 0], [1, 0]];
    let output = solver::fill_connect(&map, 0, &painted, 0, GRASS, false);
    let Ok(output) = output else {
        unreachable!("fill failed");
    };
    // The shared right/left side is asserted at paint priority, which costs
    // the isolated pattern more than the interior pattern's empty-edge
    // mismatches.
    assert_eq!(output.get(&[0, 0]), Some(&interior_pattern()));
    assert_eq!(output.get(&[1, 0]), Some(&interior_pattern()));

    assert!(map
        .set_cells_terrain_connect(0, &painted, 0, GRASS, false)
        .is_ok());
    assert_eq!(map.get_cell(0, [0, 0], false), interior_tile());
    assert_eq!(map.get_cell(0, [1, 0], false), interior_tile());
    // Surrounding cells kept their (empty) patterns and stay empty.
    assert_eq!(map.get_cell(0, [2, 0], false), CellRef::INVALID);
    assert_eq!(map.get_cell(0, [0, 1], false), CellRef::INVALID);
}

#[test]
fn test_fills_are_deterministic() {
    let map = grass_map();
    let painted = [[0, 0], [1, 0], [1, 1]];
    let first = solver::fill_connect(&map, 0, &painted, 0, GRASS, false);
    let second = solver::fill_connect(&map, 0, &painted, 0, GRASS, false);
    assert!(first.is_ok());
    assert_eq!(first.ok(), second.ok());
}

#[test]
fn test_ignoring_empty_terrains_leaves_isolated_paint_unchanged() {
    let mut map = grass_map();
    // With empty neighbors ignored, no constraint pins the peering bits, so
    // every candidate would alter unconstrained bits and is disqualified.
    assert!(map
        .set_cells_terrain_connect(0, &[[0, 0]], 0, GRASS, true)
        .is_ok());
    assert_eq!(map.get_cell(0, [0, 0], false), CellRef::INVALID);
}

#[test]
fn test_paths_must_be_contiguous() {
    let map = grass_map();
    let broken = solver::fill_path(&map, 0, &[[0, 0], [5, 5]], 0, GRASS, false);
    assert!(broken.is_err());

    let diagonal = solver::fill_path(&map, 0, &[[0, 0], [1, 1]], 0, GRASS, false);
    // Diagonal steps are corner neighbors on a square grid, which count as
    // adjacency for paths.
    assert!(diagonal.is_ok());
}

#[test]
fn test_path_fill_marks_the_step_sides() {
    let map = grass_map();
    let output = solver::fill_path(&map, 0, &[[0, 0], [1, 0], [2, 0]], 0, GRASS, false);
    let Ok(output) = output else {
        unreachable!("fill failed");
    };
    // Middle cell connects on both sides, so only the interior pattern fits
    // its paint constraints best.
    assert_eq!(output.get(&[1, 0]), Some(&interior_pattern()));
}

#[test]
fn test_existing_terrain_is_reused_by_connect() {
    // A catalog that also carries a right-edge tile, so a cell bordering
    // existing terrain on its right has an exactly-matching candidate.
    let mut right_edge = TerrainPattern::with_terrain(GRASS);
    for bit in [
        CellNeighbor::RightSide,
        CellNeighbor::BottomRightCorner,
        CellNeighbor::TopRightCorner,
    ] {
        right_edge.set_peering_bit(bit, GRASS);
    }

    let Some(mut catalog) = Rc::into_inner(grass_catalog()) else {
        unreachable!("catalog is uniquely owned");
    };
    catalog.add_tile(
        CellRef::new(1, [2, 0], 0),
        TileData {
            terrain_set: Some(0),
            pattern: Some(right_edge.clone()),
            probability: 1.0,
        },
    );

    let mut map = GridMap::with_catalog(Rc::new(catalog));
    map.attach();
    assert!(map.set_cell(0, [1, 0], interior_tile()).is_ok());

    let output = solver::fill_connect(&map, 0, &[[0, 0]], 0, GRASS, true);
    let Ok(output) = output else {
        unreachable!("fill failed");
    };
    // The neighbor's center already carries the terrain, so the shared side
    // and corners are asserted; the right-edge tile matches them with zero
    // mismatches while leaving every unconstrained bit untouched.
    assert_eq!(output.get(&[0, 0]), Some(&right_edge));
    // The existing neighbor keeps its pattern.
    assert_eq!(output.get(&[1, 0]), Some(&interior_pattern()));
}

#[test]
fn test_unknown_terrain_set_is_rejected() {
    let map = grass_map();
    assert!(solver::fill_connect(&map, 0, &[[0, 0]], 3, GRASS, false).is_err());
    assert!(solver::fill_connect(&map, 9, &[[0, 0]], 0, GRASS, false).is_err());
}

#[test]
fn test_fill_without_catalog_is_rejected() {
    let map = GridMap::new();
    assert!(solver::fill_connect(&map, 0, &[[0, 0]], 0, GRASS, false).is_err());
}
