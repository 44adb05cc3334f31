//! Narrow interface to the external cell-set resource
//!
//! The map never owns tile definitions; it consumes them through this trait.
//! Everything the grid core needs from a cell set fits in a handful of
//! queries: the geometry configuration, proxy redirection of stored
//! references, existence checks, and the terrain-pattern catalogs the solver
//! scores candidates from.

/// In-memory catalog used by tests and the command-line tooling
pub mod static_catalog;

use crate::geometry::config::GridGeometry;
use crate::geometry::neighbor::CellNeighbor;
use crate::map::cell::CellRef;
use crate::terrain::pattern::{TerrainMode, TerrainPattern};

pub use static_catalog::{StaticCatalog, TileData};

/// Queries the map core issues against the external cell-set resource
pub trait CellCatalog {
    /// Geometry configuration shared by every cell of the set
    fn geometry(&self) -> GridGeometry;

    /// Redirect a stored reference through the set's proxy table
    ///
    /// Lets content authors point old tile references at new ones without
    /// rewriting stored map data. References without a proxy entry pass
    /// through unchanged.
    fn resolve_proxy(&self, cell: CellRef) -> CellRef;

    /// Whether the reference addresses an existing tile of the set
    fn contains(&self, cell: CellRef) -> bool;

    /// Number of terrain sets defined by the resource
    fn terrain_set_count(&self) -> usize;

    /// Matching mode of a terrain set
    fn terrain_mode(&self, terrain_set: usize) -> TerrainMode;

    /// Whether a peering bit participates in matching for a terrain set
    fn is_valid_peering_bit(&self, terrain_set: usize, bit: CellNeighbor) -> bool;

    /// Every terrain pattern registered for a terrain set, in a stable order
    fn candidate_patterns(&self, terrain_set: usize) -> Vec<TerrainPattern>;

    /// Terrain pattern of a tile, if the tile belongs to the terrain set
    fn terrain_pattern_of(&self, terrain_set: usize, cell: CellRef) -> Option<TerrainPattern>;

    /// Tile to paint for a terrain pattern
    ///
    /// Deterministic so that repeated fills on identical state produce
    /// identical maps; returns [`CellRef::INVALID`] when no tile of the set
    /// carries the pattern.
    fn representative_cell(&self, terrain_set: usize, pattern: &TerrainPattern) -> CellRef;

    /// Monotonic counter bumped on every mutation of the resource
    ///
    /// The map polls this to detect edits and rebuild its derived state, the
    /// single notification the core reads back from the resource.
    fn generation(&self) -> u64;
}
