//! In-memory cell catalog
//!
//! A small, fully-owned implementation of [`CellCatalog`] for tests, benches
//! and the command-line tooling. A real engine would back the trait with its
//! resource system instead.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::catalog::CellCatalog;
use crate::geometry::config::GridGeometry;
use crate::geometry::neighbor::CellNeighbor;
use crate::map::cell::CellRef;
use crate::terrain::pattern::{TerrainMode, TerrainPattern, peering_bits};

/// Per-tile data the grid core consumes
#[derive(Clone, Debug)]
pub struct TileData {
    /// Terrain set the tile belongs to, if any
    pub terrain_set: Option<usize>,
    /// Terrain pattern of the tile within its terrain set
    pub pattern: Option<TerrainPattern>,
    /// Relative preference when several tiles share a pattern
    pub probability: f64,
}

impl Default for TileData {
    fn default() -> Self {
        Self {
            terrain_set: None,
            pattern: None,
            probability: 1.0,
        }
    }
}

/// Definition of one terrain set
#[derive(Clone, Copy, Debug)]
pub struct TerrainSetDef {
    /// Which bit kinds the set matches across
    pub mode: TerrainMode,
    /// Number of terrains in the set
    pub terrain_count: usize,
}

/// Owned, mutable catalog of tiles and terrain sets
#[derive(Debug, Default)]
pub struct StaticCatalog {
    geometry: GridGeometry,
    tiles: BTreeMap<CellRef, TileData>,
    terrain_sets: Vec<TerrainSetDef>,
    proxies: HashMap<CellRef, CellRef>,
    generation: u64,
}

impl StaticCatalog {
    /// Empty catalog with the given geometry
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            ..Self::default()
        }
    }

    /// Register a tile and its data
    pub fn add_tile(&mut self, cell: CellRef, data: TileData) {
        self.tiles.insert(cell, data);
        self.generation += 1;
    }

    /// Register a terrain set and return its index
    pub fn add_terrain_set(&mut self, mode: TerrainMode, terrain_count: usize) -> usize {
        self.terrain_sets.push(TerrainSetDef {
            mode,
            terrain_count,
        });
        self.generation += 1;
        self.terrain_sets.len() - 1
    }

    /// Redirect one reference to another in the proxy table
    pub fn add_proxy(&mut self, from: CellRef, to: CellRef) {
        self.proxies.insert(from, to);
        self.generation += 1;
    }

    /// Remove a tile, leaving stored references to it dangling
    pub fn remove_tile(&mut self, cell: CellRef) {
        self.tiles.remove(&cell);
        self.generation += 1;
    }
}

impl CellCatalog for StaticCatalog {
    fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    fn resolve_proxy(&self, cell: CellRef) -> CellRef {
        self.proxies.get(&cell).copied().unwrap_or(cell)
    }

    fn contains(&self, cell: CellRef) -> bool {
        self.tiles.contains_key(&cell)
    }

    fn terrain_set_count(&self) -> usize {
        self.terrain_sets.len()
    }

    fn terrain_mode(&self, terrain_set: usize) -> TerrainMode {
        self.terrain_sets
            .get(terrain_set)
            .map_or(TerrainMode::CornersAndSides, |set| set.mode)
    }

    fn is_valid_peering_bit(&self, terrain_set: usize, bit: CellNeighbor) -> bool {
        let Some(set) = self.terrain_sets.get(terrain_set) else {
            return false;
        };
        set.mode.accepts(bit)
            && peering_bits(self.geometry.shape, self.geometry.offset_axis).contains(&bit)
    }

    fn candidate_patterns(&self, terrain_set: usize) -> Vec<TerrainPattern> {
        let unique: BTreeSet<TerrainPattern> = self
            .tiles
            .values()
            .filter(|data| data.terrain_set == Some(terrain_set))
            .filter_map(|data| data.pattern.clone())
            .collect();
        unique.into_iter().collect()
    }

    fn terrain_pattern_of(&self, terrain_set: usize, cell: CellRef) -> Option<TerrainPattern> {
        let data = self.tiles.get(&cell)?;
        if data.terrain_set == Some(terrain_set) {
            data.pattern.clone()
        } else {
            None
        }
    }

    fn representative_cell(&self, terrain_set: usize, pattern: &TerrainPattern) -> CellRef {
        // Highest probability wins; the BTreeMap order breaks ties so the
        // choice is stable across runs.
        let mut best: Option<(&CellRef, f64)> = None;
        for (cell, data) in &self.tiles {
            if data.terrain_set != Some(terrain_set) || data.pattern.as_ref() != Some(pattern) {
                continue;
            }
            if best.is_none_or(|(_, probability)| data.probability > probability) {
                best = Some((cell, data.probability));
            }
        }
        best.map_or(CellRef::INVALID, |(cell, _)| *cell)
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::{StaticCatalog, TileData};
    use crate::catalog::CellCatalog;
    use crate::geometry::config::GridGeometry;
    use crate::map::cell::CellRef;
    use crate::terrain::pattern::{TerrainMode, TerrainPattern};

    #[test]
    fn proxies_redirect_only_mapped_references() {
        let mut catalog = StaticCatalog::new(GridGeometry::square([16.0, 16.0]));
        let old = CellRef::new(1, [0, 0], 0);
        let new = CellRef::new(2, [1, 0], 0);
        catalog.add_proxy(old, new);
        assert_eq!(catalog.resolve_proxy(old), new);
        assert_eq!(catalog.resolve_proxy(new), new);
    }

    #[test]
    fn representative_cell_prefers_probability_then_order() {
        let mut catalog = StaticCatalog::new(GridGeometry::square([16.0, 16.0]));
        let set = catalog.add_terrain_set(TerrainMode::CornersAndSides, 1);
        let pattern = TerrainPattern::with_terrain(0);
        for (source, probability) in [(1, 0.5), (2, 1.5), (3, 1.5)] {
            catalog.add_tile(
                CellRef::new(source, [0, 0], 0),
                TileData {
                    terrain_set: Some(set),
                    pattern: Some(pattern.clone()),
                    probability,
                },
            );
        }
        assert_eq!(
            catalog.representative_cell(set, &pattern),
            CellRef::new(2, [0, 0], 0)
        );
    }

    #[test]
    fn generation_advances_on_every_mutation() {
        let mut catalog = StaticCatalog::new(GridGeometry::square([16.0, 16.0]));
        let before = catalog.generation();
        catalog.add_tile(CellRef::new(1, [0, 0], 0), TileData::default());
        assert!(catalog.generation() > before);
    }
}
