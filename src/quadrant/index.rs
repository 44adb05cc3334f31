//! Per-layer bucket bookkeeping and the dirty worklist
//!
//! The index maps cell coordinates to buckets with a flooring division so
//! negative coordinates bucket correctly, tracks which buckets need a
//! rebuild, and drives the collaborator hooks when a flush runs. The dirty
//! worklist is an explicit ordered set of bucket keys; a key without a live
//! bucket is a bookkeeping bug, not a recoverable condition.

use std::collections::{BTreeSet, HashMap};

use crate::catalog::CellCatalog;
use crate::map::cell::CellRef;
use crate::math::integer::floor_div;
use crate::quadrant::collaborator::{CollaboratorSet, QuadrantPayload, ResolvedCell};
use crate::quadrant::{Quadrant, draw_order};

/// Bucket index and dirty worklist for one layer
#[derive(Debug)]
pub struct QuadrantIndex {
    bucket_size: i32,
    quadrants: HashMap<[i32; 2], Quadrant>,
    dirty: BTreeSet<[i32; 2]>,
}

impl QuadrantIndex {
    /// Empty index with the given effective bucket size
    pub fn new(bucket_size: i32) -> Self {
        Self {
            bucket_size: bucket_size.max(1),
            quadrants: HashMap::new(),
            dirty: BTreeSet::new(),
        }
    }

    /// Effective bucket size the index was built with
    pub const fn bucket_size(&self) -> i32 {
        self.bucket_size
    }

    /// Bucket containing a cell coordinate
    pub fn bucket_of(&self, coords: [i32; 2]) -> [i32; 2] {
        [
            floor_div(coords[0], self.bucket_size),
            floor_div(coords[1], self.bucket_size),
        ]
    }

    /// Number of live buckets
    pub fn quadrant_count(&self) -> usize {
        self.quadrants.len()
    }

    /// Number of buckets awaiting a rebuild
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Bucket for a coordinate, if live
    pub fn quadrant(&self, bucket: [i32; 2]) -> Option<&Quadrant> {
        self.quadrants.get(&bucket)
    }

    /// Iterate over live buckets
    pub fn quadrants(&self) -> impl Iterator<Item = &Quadrant> {
        self.quadrants.values()
    }

    /// Track a newly painted cell, creating its bucket on first use
    pub fn insert_cell(
        &mut self,
        layer: usize,
        coords: [i32; 2],
        collaborators: &mut CollaboratorSet,
    ) {
        let bucket = self.bucket_of(coords);
        let quadrant = self.quadrants.entry(bucket).or_insert_with(|| {
            let mut created = Quadrant::new(bucket);
            collaborators.for_each_mut(|slot, collaborator| {
                if let Some(handle) = created.handles.get_mut(slot) {
                    *handle = Some(collaborator.create_quadrant(layer, bucket));
                }
            });
            created
        });
        quadrant.cells.insert(coords);
        self.dirty.insert(bucket);
    }

    /// Mark the bucket of an overwritten cell dirty
    pub fn touch_cell(&mut self, coords: [i32; 2]) {
        let bucket = self.bucket_of(coords);
        debug_assert!(
            self.quadrants.contains_key(&bucket),
            "touched cell outside any live bucket"
        );
        self.dirty.insert(bucket);
    }

    /// Track an erased cell, destroying its bucket when it empties
    pub fn remove_cell(&mut self, coords: [i32; 2], collaborators: &mut CollaboratorSet) {
        let bucket = self.bucket_of(coords);
        debug_assert!(
            self.quadrants.contains_key(&bucket),
            "erased cell outside any live bucket"
        );
        let Some(quadrant) = self.quadrants.get_mut(&bucket) else {
            return;
        };
        quadrant.cells.remove(&coords);
        if quadrant.cells.is_empty() {
            // Leave the worklist before the bucket goes away.
            self.dirty.remove(&bucket);
            if let Some(removed) = self.quadrants.remove(&bucket) {
                release_handles(&removed, collaborators);
            }
        } else {
            self.dirty.insert(bucket);
        }
    }

    /// Queue every live bucket for a rebuild
    pub fn mark_all_dirty(&mut self) {
        for bucket in self.quadrants.keys() {
            self.dirty.insert(*bucket);
        }
    }

    /// Destroy every bucket and clear the worklist
    pub fn clear(&mut self, collaborators: &mut CollaboratorSet) {
        for quadrant in self.quadrants.values() {
            release_handles(quadrant, collaborators);
        }
        self.quadrants.clear();
        self.dirty.clear();
    }

    /// Rebuild the index from scratch over a cell map
    ///
    /// The index must have been cleared beforehand; every recreated bucket
    /// starts dirty so the next flush rebuilds its caches.
    pub fn rebuild(
        &mut self,
        layer: usize,
        bucket_size: i32,
        cells: &HashMap<[i32; 2], CellRef>,
        collaborators: &mut CollaboratorSet,
    ) {
        debug_assert!(
            self.quadrants.is_empty(),
            "rebuilding a non-empty quadrant index"
        );
        self.bucket_size = bucket_size.max(1);
        for coords in cells.keys() {
            self.insert_cell(layer, *coords, collaborators);
        }
    }

    /// Rebuild the caches of every dirty bucket and notify collaborators
    ///
    /// Returns the number of buckets processed. Collaborators run in fixed
    /// order (rendering, physics, navigation) per bucket.
    pub fn flush(
        &mut self,
        layer: usize,
        cells: &HashMap<[i32; 2], CellRef>,
        catalog: &dyn CellCatalog,
        collaborators: &mut CollaboratorSet,
    ) -> usize {
        let geometry = catalog.geometry();
        let worklist = std::mem::take(&mut self.dirty);
        let mut flushed = 0;

        for bucket in worklist {
            debug_assert!(
                self.quadrants.contains_key(&bucket),
                "dirty entry for a destroyed bucket"
            );
            let Some(quadrant) = self.quadrants.get_mut(&bucket) else {
                continue;
            };

            quadrant.cell_to_world.clear();
            let mut resolved = Vec::with_capacity(quadrant.cells.len());
            for &coords in &quadrant.cells {
                let world = geometry.cell_to_world(coords);
                quadrant.cell_to_world.insert(coords, world);
                let stored = cells.get(&coords).copied().unwrap_or(CellRef::INVALID);
                resolved.push(ResolvedCell {
                    coords,
                    world,
                    cell: catalog.resolve_proxy(stored),
                });
            }
            resolved.sort_by(|a, b| draw_order(a.world, b.world));
            quadrant.world_to_cell = resolved
                .iter()
                .map(|cell| (cell.world, cell.coords))
                .collect();

            let payload = QuadrantPayload {
                layer,
                bucket,
                cells: &resolved,
            };
            let handles = quadrant.handles;
            collaborators.for_each_mut(|slot, collaborator| {
                if let Some(Some(handle)) = handles.get(slot) {
                    collaborator.rebuild_quadrant(*handle, &payload);
                }
            });

            flushed += 1;
        }

        flushed
    }
}

fn release_handles(quadrant: &Quadrant, collaborators: &mut CollaboratorSet) {
    let handles = quadrant.handles;
    collaborators.for_each_mut(|slot, collaborator| {
        if let Some(Some(handle)) = handles.get(slot) {
            collaborator.release_quadrant(*handle);
        }
    });
}
