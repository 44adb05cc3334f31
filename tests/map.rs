//! Validates cell storage, quadrant lifecycle, dirty coalescing and the
//! persistence formats through the public map API

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use gridmap::catalog::{StaticCatalog, TileData};
use gridmap::geometry::config::GridGeometry;
use gridmap::io::buffer::BufferFormat;
use gridmap::io::document::MapDocument;
use gridmap::map::cell::{CellRect, CellRef};
use gridmap::map::pattern::MapPattern;
use gridmap::map::GridMap;
use gridmap::quadrant::collaborator::{
    CollaboratorHandle, QuadrantCollaborator, QuadrantPayload, Subsystem,
};

fn square_catalog() -> Rc<StaticCatalog> {
    let mut catalog = StaticCatalog::new(GridGeometry::square([16.0, 16.0]));
    for source in 1..=4 {
        catalog.add_tile(CellRef::new(source, [0, 0], 0), TileData::default());
    }
    Rc::new(catalog)
}

fn attached_map() -> GridMap {
    let mut map = GridMap::with_catalog(square_catalog());
    map.attach();
    map
}

fn tile(source: i32) -> CellRef {
    CellRef::new(source, [0, 0], 0)
}

/// Collaborator that records every hook invocation into a shared log
struct Recorder {
    tag: &'static str,
    log: Rc<RefCell<Vec<String>>>,
    next_handle: u64,
}

impl Recorder {
    fn new(tag: &'static str, log: Rc<RefCell<Vec<String>>>) -> Self {
        Self {
            tag,
            log,
            next_handle: 0,
        }
    }
}

impl QuadrantCollaborator for Recorder {
    fn create_quadrant(&mut self, layer: usize, bucket: [i32; 2]) -> CollaboratorHandle {
        self.next_handle += 1;
        self.log
            .borrow_mut()
            .push(format!("{} create {layer} {bucket:?}", self.tag));
        CollaboratorHandle(self.next_handle)
    }

    fn rebuild_quadrant(&mut self, _handle: CollaboratorHandle, payload: &QuadrantPayload<'_>) {
        self.log.borrow_mut().push(format!(
            "{} rebuild {} {:?} ({} cells)",
            self.tag,
            payload.layer,
            payload.bucket,
            payload.cells.len()
        ));
    }

    fn release_quadrant(&mut self, _handle: CollaboratorHandle) {
        self.log.borrow_mut().push(format!("{} release", self.tag));
    }
}

fn assert_quadrant_invariant(map: &GridMap) {
    for layer in 0..map.layer_count() {
        let used: HashSet<[i32; 2]> = map.get_used_cells(layer).into_iter().collect();
        let mut bucketed: HashSet<[i32; 2]> = HashSet::new();
        for quadrant in map.quadrants(layer) {
            assert!(
                !quadrant.cells.is_empty(),
                "a bucket with zero cells must not exist"
            );
            for &coords in &quadrant.cells {
                assert!(
                    bucketed.insert(coords),
                    "cell {coords:?} appears in two buckets"
                );
            }
        }
        assert_eq!(used, bucketed, "cells and buckets disagree on layer {layer}");
    }
}

#[test]
fn test_single_cell_quadrant_lifecycle() {
    let mut map = attached_map();

    assert!(map.set_cell(0, [0, 0], tile(1)).is_ok());
    assert_eq!(map.quadrant_count(0), 1);
    assert_eq!(map.quadrants(0).first().map(|q| q.coords), Some([0, 0]));
    assert_eq!(
        map.get_used_rect(),
        Some(CellRect {
            position: [0, 0],
            size: [1, 1]
        })
    );

    assert!(map.erase_cell(0, [0, 0]).is_ok());
    assert_eq!(map.quadrant_count(0), 0);
    assert_eq!(map.get_used_rect(), None);
}

#[test]
fn test_negative_coordinates_bucket_toward_negative_infinity() {
    let mut map = attached_map();
    assert!(map.set_cell(0, [-1, -1], tile(1)).is_ok());
    assert!(map.set_cell(0, [-16, -16], tile(1)).is_ok());
    assert!(map.set_cell(0, [-17, -17], tile(1)).is_ok());

    let mut buckets: Vec<[i32; 2]> = map.quadrants(0).iter().map(|q| q.coords).collect();
    buckets.sort_unstable();
    assert_eq!(buckets, vec![[-2, -2], [-1, -1]]);
    assert_quadrant_invariant(&map);
}

#[test]
fn test_edit_bursts_coalesce_into_one_flush() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut map = attached_map();
    map.set_collaborator(
        Subsystem::Rendering,
        Box::new(Recorder::new("render", Rc::clone(&log))),
    );

    // A burst of edits across two buckets.
    for x in 0..10 {
        assert!(map.set_cell(0, [x, 0], tile(1)).is_ok());
    }
    assert!(map.set_cell(0, [40, 40], tile(2)).is_ok());
    assert!(map.has_pending_update());

    let flushed = map.update();
    assert_eq!(flushed, 2, "one flush covers both dirty buckets");
    assert!(!map.has_pending_update());
    assert_eq!(map.update(), 0, "nothing left to flush");

    let rebuilds = log
        .borrow()
        .iter()
        .filter(|line| line.contains("rebuild"))
        .count();
    assert_eq!(rebuilds, 2);
}

#[test]
fn test_identical_set_cell_is_a_silent_no_op() {
    let mut map = attached_map();
    assert!(map.set_cell(0, [3, 3], tile(2)).is_ok());
    map.update();

    assert!(map.set_cell(0, [3, 3], tile(2)).is_ok());
    assert!(!map.has_pending_update());
    assert_eq!(map.dirty_quadrant_count(0), 0);
}

#[test]
fn test_collaborators_rebuild_in_fixed_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut map = attached_map();
    map.set_collaborator(
        Subsystem::Navigation,
        Box::new(Recorder::new("navigation", Rc::clone(&log))),
    );
    map.set_collaborator(
        Subsystem::Physics,
        Box::new(Recorder::new("physics", Rc::clone(&log))),
    );
    map.set_collaborator(
        Subsystem::Rendering,
        Box::new(Recorder::new("render", Rc::clone(&log))),
    );

    assert!(map.set_cell(0, [0, 0], tile(1)).is_ok());
    map.update();

    let lines = log.borrow();
    let rebuilds: Vec<&String> = lines.iter().filter(|l| l.contains("rebuild")).collect();
    assert_eq!(rebuilds.len(), 3);
    assert!(rebuilds.first().is_some_and(|l| l.starts_with("render")));
    assert!(rebuilds.get(1).is_some_and(|l| l.starts_with("physics")));
    assert!(rebuilds.get(2).is_some_and(|l| l.starts_with("navigation")));
}

#[test]
fn test_release_hooks_fire_when_buckets_empty() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut map = attached_map();
    map.set_collaborator(
        Subsystem::Physics,
        Box::new(Recorder::new("physics", Rc::clone(&log))),
    );

    assert!(map.set_cell(0, [0, 0], tile(1)).is_ok());
    assert!(map.erase_cell(0, [0, 0]).is_ok());

    let lines = log.borrow();
    assert!(lines.iter().any(|l| l.contains("create")));
    assert!(lines.iter().any(|l| l.contains("release")));
}

#[test]
fn test_quadrant_invariant_survives_mixed_edits() {
    let mut map = attached_map();
    for step in 0i32..200 {
        let coords = [(step * 7) % 37 - 18, (step * 13) % 29 - 14];
        if step % 5 == 0 {
            assert!(map.erase_cell(0, coords).is_ok());
        } else {
            assert!(map.set_cell(0, coords, tile(step % 3 + 1)).is_ok());
        }
        if step % 17 == 0 {
            map.update();
        }
    }
    assert_quadrant_invariant(&map);
    map.update();
    assert_quadrant_invariant(&map);
}

#[test]
fn test_y_sort_collapses_buckets_to_single_cells() {
    let mut map = attached_map();
    assert!(map.set_cell(0, [0, 0], tile(1)).is_ok());
    assert!(map.set_cell(0, [1, 0], tile(1)).is_ok());
    assert_eq!(map.quadrant_count(0), 1);

    assert!(map.set_layer_y_sort_enabled(0, true).is_ok());
    map.set_y_sort_enabled(true);
    assert_eq!(map.effective_quadrant_size(0), 1);
    assert_eq!(map.quadrant_count(0), 2);
    assert_quadrant_invariant(&map);
}

#[test]
fn test_disabled_layers_keep_cells_but_drop_buckets() {
    let mut map = attached_map();
    assert!(map.set_cell(0, [5, 5], tile(1)).is_ok());

    assert!(map.set_layer_enabled(0, false).is_ok());
    assert_eq!(map.quadrant_count(0), 0);
    assert_eq!(map.get_cell(0, [5, 5], false), tile(1));

    assert!(map.set_layer_enabled(0, true).is_ok());
    assert_eq!(map.quadrant_count(0), 1);
    assert_quadrant_invariant(&map);
}

#[test]
fn test_layer_moves_rebuild_cleanly() {
    let mut map = attached_map();
    let added = map.add_layer(-1);
    assert_eq!(added.ok(), Some(1));
    assert!(map.set_layer_name(1, "props").is_ok());
    assert!(map.set_cell(0, [0, 0], tile(1)).is_ok());
    assert!(map.set_cell(1, [9, 9], tile(2)).is_ok());

    assert!(map.move_layer(1, 0).is_ok());
    assert_eq!(map.layer_settings(0).map(|s| s.name.clone()), Some("props".to_string()));
    assert_eq!(map.get_cell(0, [9, 9], false), tile(2));
    assert_eq!(map.get_cell(1, [0, 0], false), tile(1));
    assert_quadrant_invariant(&map);

    assert!(map.remove_layer(0).is_ok());
    assert_eq!(map.layer_count(), 1);
    assert_eq!(map.get_cell(0, [0, 0], false), tile(1));
    assert_quadrant_invariant(&map);

    assert!(map.move_layer(5, 0).is_err());
}

#[test]
fn test_force_update_flushes_synchronously() {
    let mut map = GridMap::with_catalog(square_catalog());
    // Detached: edits must not schedule anything.
    assert!(map.set_cell(0, [0, 0], tile(1)).is_ok());
    assert!(!map.has_pending_update());
    assert!(map.dirty_quadrant_count(0) > 0);

    assert!(map.force_update(Some(0)).is_ok());
    assert_eq!(map.dirty_quadrant_count(0), 0);
    assert_eq!(map.quadrant_count(0), 1);

    assert!(map.force_update(Some(7)).is_err());
}

#[test]
fn test_proxies_resolve_on_read() {
    let mut catalog = StaticCatalog::new(GridGeometry::square([16.0, 16.0]));
    catalog.add_tile(tile(1), TileData::default());
    catalog.add_tile(tile(2), TileData::default());
    catalog.add_proxy(tile(1), tile(2));

    let mut map = GridMap::with_catalog(Rc::new(catalog));
    assert!(map.set_cell(0, [0, 0], tile(1)).is_ok());
    assert_eq!(map.get_cell(0, [0, 0], false), tile(1));
    assert_eq!(map.get_cell(0, [0, 0], true), tile(2));
}

#[test]
fn test_used_cells_filter_matches_components_independently() {
    let mut map = attached_map();
    assert!(map.set_cell(0, [0, 0], CellRef::new(1, [0, 0], 0)).is_ok());
    assert!(map.set_cell(0, [1, 0], CellRef::new(1, [2, 0], 0)).is_ok());
    assert!(map.set_cell(0, [2, 0], CellRef::new(2, [0, 0], 1)).is_ok());

    assert_eq!(map.get_used_cells(0).len(), 3);
    assert_eq!(
        map.get_used_cells_by_id(0, Some(1), None, None),
        vec![[0, 0], [1, 0]]
    );
    assert_eq!(
        map.get_used_cells_by_id(0, Some(1), Some([2, 0]), None),
        vec![[1, 0]]
    );
    assert_eq!(
        map.get_used_cells_by_id(0, None, None, Some(1)),
        vec![[2, 0]]
    );
}

#[test]
fn test_partial_invalid_references_erase() {
    let mut map = attached_map();
    assert!(map.set_cell(0, [0, 0], tile(1)).is_ok());
    assert!(map
        .set_cell(0, [0, 0], CellRef::new(1, [-1, -1], 0))
        .is_ok());
    assert_eq!(map.get_cell(0, [0, 0], false), CellRef::INVALID);
    assert_eq!(map.quadrant_count(0), 0);
}

#[test]
fn test_buffer_export_import_round_trips() {
    let mut map = attached_map();
    assert!(map.set_cell(0, [-5, 3], CellRef::new(1, [1, 2], 0)).is_ok());
    assert!(map.set_cell(0, [7, -2], CellRef::new(2, [0, 0], 3)).is_ok());

    let Ok(data) = map.get_cells_as_buffer(0) else {
        unreachable!("export failed");
    };

    let mut restored = attached_map();
    assert!(restored
        .set_cells_from_buffer(0, &data, BufferFormat::Current)
        .is_ok());
    assert_eq!(restored.get_used_cells(0), map.get_used_cells(0));
    assert_eq!(
        restored.get_cell(0, [-5, 3], false),
        CellRef::new(1, [1, 2], 0)
    );
    assert_quadrant_invariant(&restored);
}

#[test]
fn test_legacy_import_matches_current_import() {
    // The same logical cell written in the 8-byte legacy layout and the
    // current 12-byte layout.
    let mut legacy = Vec::new();
    legacy.extend_from_slice(&4i16.to_le_bytes());
    legacy.extend_from_slice(&(-6i16).to_le_bytes());
    legacy.extend_from_slice(&3u32.to_le_bytes());

    let mut current = Vec::new();
    current.extend_from_slice(&4i16.to_le_bytes());
    current.extend_from_slice(&(-6i16).to_le_bytes());
    current.extend_from_slice(&3u16.to_le_bytes());
    current.extend_from_slice(&0u16.to_le_bytes());
    current.extend_from_slice(&0u16.to_le_bytes());
    current.extend_from_slice(&0u16.to_le_bytes());

    let mut from_legacy = attached_map();
    assert!(from_legacy
        .set_cells_from_buffer(0, &legacy, BufferFormat::LegacyV1)
        .is_ok());
    let mut from_current = attached_map();
    assert!(from_current
        .set_cells_from_buffer(0, &current, BufferFormat::Current)
        .is_ok());

    assert_eq!(
        from_legacy.get_cell(0, [4, -6], false),
        from_current.get_cell(0, [4, -6], false)
    );
}

#[test]
fn test_corrupt_buffers_leave_prior_state_untouched() {
    let mut map = attached_map();
    assert!(map.set_cell(0, [1, 1], tile(1)).is_ok());

    let bad = vec![0u8; 13];
    assert!(map
        .set_cells_from_buffer(0, &bad, BufferFormat::Current)
        .is_err());
    assert_eq!(map.get_cell(0, [1, 1], false), tile(1));
}

#[test]
fn test_pattern_stamp_and_extract_round_trip() {
    let mut map = attached_map();
    let mut pattern = MapPattern::new();
    pattern.set_cell([0, 0], tile(1));
    pattern.set_cell([1, 0], tile(2));
    pattern.set_cell([0, 1], tile(3));

    assert!(map.set_pattern(0, [10, 10], &pattern).is_ok());
    assert_eq!(map.get_cell(0, [10, 10], false), tile(1));
    assert_eq!(map.get_cell(0, [11, 10], false), tile(2));
    assert_eq!(map.get_cell(0, [10, 11], false), tile(3));

    let coords = [[10, 10], [11, 10], [10, 11], [11, 11]];
    let Ok(extracted) = map.get_pattern(0, &coords) else {
        unreachable!("extract failed");
    };
    assert_eq!(extracted.get_cell([0, 0]), tile(1));
    assert_eq!(extracted.get_cell([1, 0]), tile(2));
    assert!(!extracted.has_cell([1, 1]));
}

#[test]
fn test_document_round_trips_through_a_file() {
    let Ok(directory) = tempfile::tempdir() else {
        unreachable!("tempdir failed");
    };
    let path = directory.path().join("map.gmap");

    let mut map = attached_map();
    assert!(map.add_layer(-1).is_ok());
    assert!(map.set_layer_name(1, "decals").is_ok());
    assert!(map.set_layer_modulate(1, [0.5, 0.5, 0.5, 1.0]).is_ok());
    assert!(map.set_cell(0, [0, 0], tile(1)).is_ok());
    assert!(map.set_cell(1, [3, -3], tile(2)).is_ok());

    assert!(MapDocument::from_map(&map).write_file(&path).is_ok());
    let Ok(document) = MapDocument::read_file(&path) else {
        unreachable!("read failed");
    };

    let mut restored = attached_map();
    assert!(document.apply_to(&mut restored).is_ok());
    assert_eq!(restored.layer_count(), 2);
    assert_eq!(
        restored.layer_settings(1).map(|s| s.name.clone()),
        Some("decals".to_string())
    );
    assert_eq!(restored.get_cell(1, [3, -3], false), tile(2));
    assert_quadrant_invariant(&restored);
}

#[test]
fn test_bad_layer_indices_follow_the_no_op_policy() {
    let mut map = attached_map();
    assert!(map.set_cell(9, [0, 0], tile(1)).is_err());
    assert_eq!(map.get_cell(9, [0, 0], false), CellRef::INVALID);
    assert!(map.get_used_cells(9).is_empty());
    assert!(map.get_cells_as_buffer(9).is_err());
}
