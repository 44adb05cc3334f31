//! The public map facade
//!
//! [`GridMap`] owns the ordered layer list, routes every edit through the
//! quadrant index, coalesces dirty buckets into one deferred flush per edit
//! burst, and exposes the authoring operations built on top: terrain fills,
//! pattern stamping and buffer import/export.
//!
//! The map is single-threaded and cooperative: "deferred" means the flush
//! runs once at the next [`GridMap::update`] pump on the owning thread, not
//! on a worker.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::catalog::CellCatalog;
use crate::geometry::config::{CellShape, GridGeometry, GridLayout, OffsetAxis};
use crate::geometry::neighbor::CellNeighbor;
use crate::io::buffer::{self, BufferFormat};
use crate::io::configuration::DEFAULT_QUADRANT_SIZE;
use crate::io::error::{MapError, Result};
use crate::map::cell::{CellRect, CellRef};
use crate::map::layer::{Layer, LayerSettings};
use crate::map::pattern::MapPattern;
use crate::quadrant::Quadrant;
use crate::quadrant::collaborator::{CollaboratorSet, QuadrantCollaborator, Subsystem};
use crate::terrain::pattern::TerrainPattern;
use crate::terrain::solver;

/// Grid-addressed map node storing cells across ordered layers
///
/// Always owns at least one layer after construction. All mutable structures
/// (layers, buckets, dirty sets) are exclusive to the instance; collaborators
/// are injected trait objects, never ambient singletons.
pub struct GridMap {
    catalog: Option<Rc<dyn CellCatalog>>,
    catalog_generation: u64,
    layers: Vec<Layer>,
    quadrant_size: i32,
    y_sort_enabled: bool,
    attached: bool,
    pending_update: bool,
    collaborators: CollaboratorSet,
    used_rect_cache: Option<CellRect>,
    used_rect_dirty: bool,
}

impl GridMap {
    /// Map with one empty layer and no catalog
    pub fn new() -> Self {
        Self {
            catalog: None,
            catalog_generation: 0,
            layers: vec![Layer::new(DEFAULT_QUADRANT_SIZE)],
            quadrant_size: DEFAULT_QUADRANT_SIZE,
            y_sort_enabled: false,
            attached: false,
            pending_update: false,
            collaborators: CollaboratorSet::new(),
            used_rect_cache: None,
            used_rect_dirty: true,
        }
    }

    /// Map with one empty layer and the given catalog attached
    pub fn with_catalog(catalog: Rc<dyn CellCatalog>) -> Self {
        let mut map = Self::new();
        map.set_catalog(Some(catalog));
        map
    }

    // --- Catalog -----------------------------------------------------------

    /// Attached cell catalog, if any
    pub fn catalog(&self) -> Option<&Rc<dyn CellCatalog>> {
        self.catalog.as_ref()
    }

    /// Replace the attached catalog, rebuilding all derived state
    pub fn set_catalog(&mut self, catalog: Option<Rc<dyn CellCatalog>>) {
        self.clear_internals();
        self.catalog_generation = catalog.as_ref().map_or(0, |c| c.generation());
        self.catalog = catalog;
        self.recreate_internals();
    }

    /// Geometry of the attached catalog, if any
    pub fn geometry(&self) -> Option<GridGeometry> {
        self.catalog.as_ref().map(|catalog| catalog.geometry())
    }

    // --- Collaborators -----------------------------------------------------

    /// Install a collaborator, rebuilding so create hooks fire for every
    /// live bucket
    pub fn set_collaborator(
        &mut self,
        subsystem: Subsystem,
        collaborator: Box<dyn QuadrantCollaborator>,
    ) {
        self.clear_internals();
        self.collaborators.set(subsystem, collaborator);
        self.recreate_internals();
    }

    // --- Lifecycle ---------------------------------------------------------

    /// Whether the map is attached to its owning scene
    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    /// Attach the map, rebuilding derived state and arming the scheduler
    pub fn attach(&mut self) {
        self.clear_internals();
        self.attached = true;
        self.recreate_internals();
    }

    /// Detach the map, tearing down derived state
    ///
    /// A flush still pending when the map detaches becomes a no-op.
    pub fn detach(&mut self) {
        self.clear_internals();
        self.attached = false;
        self.pending_update = false;
    }

    /// Whether a deferred flush is scheduled
    pub const fn has_pending_update(&self) -> bool {
        self.pending_update
    }

    /// Run the deferred flush if one is scheduled
    ///
    /// Called once per processing cycle by the owner. Also polls the catalog
    /// for edits and rebuilds everything when it changed. Returns the number
    /// of buckets rebuilt.
    pub fn update(&mut self) -> usize {
        self.poll_catalog();

        if !self.pending_update {
            return 0;
        }
        self.pending_update = false;

        let Some(catalog) = self.catalog.clone() else {
            return 0;
        };

        let mut flushed = 0;
        for (index, layer) in self.layers.iter_mut().enumerate() {
            let Layer {
                cells,
                index: quadrants,
                ..
            } = layer;
            flushed += quadrants.flush(index, cells, catalog.as_ref(), &mut self.collaborators);
        }

        if self.used_rect_dirty {
            self.recompute_used_rect();
        }

        flushed
    }

    /// Synchronously tear down and rebuild one layer, or every layer
    ///
    /// For callers that cannot wait for the deferred flush.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad layer index.
    pub fn force_update(&mut self, layer: Option<usize>) -> Result<()> {
        match layer {
            Some(index) => {
                self.check_layer(index)?;
                self.clear_layer_internals(index);
                self.recreate_layer_internals(index);
            }
            None => {
                self.clear_internals();
                self.recreate_internals();
            }
        }
        self.pending_update = true;
        self.update();
        Ok(())
    }

    // --- Quadrant configuration -------------------------------------------

    /// Configured bucket size
    pub const fn quadrant_size(&self) -> i32 {
        self.quadrant_size
    }

    /// Change the bucket size, rebuilding every index
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidParameter`] for sizes below one.
    pub fn set_quadrant_size(&mut self, size: i32) -> Result<()> {
        if size < 1 {
            return Err(MapError::InvalidParameter {
                parameter: "quadrant_size",
                value: size.to_string(),
                reason: "bucket size cannot be smaller than 1".to_string(),
            });
        }
        self.quadrant_size = size;
        self.clear_internals();
        self.recreate_internals();
        Ok(())
    }

    /// Bucket size a layer actually uses
    ///
    /// Collapses to one when depth sorting is enabled on both the map and the
    /// layer, because each cell then needs independent draw ordering.
    pub fn effective_quadrant_size(&self, layer: usize) -> i32 {
        let y_sorted = self
            .layers
            .get(layer)
            .is_some_and(|l| l.settings.y_sort_enabled);
        if self.y_sort_enabled && y_sorted {
            1
        } else {
            self.quadrant_size
        }
    }

    /// Whether the map sorts its layers' cells by depth
    pub const fn is_y_sort_enabled(&self) -> bool {
        self.y_sort_enabled
    }

    /// Toggle map-level depth sorting, rebuilding every index
    pub fn set_y_sort_enabled(&mut self, enabled: bool) {
        if self.y_sort_enabled == enabled {
            return;
        }
        self.clear_internals();
        self.y_sort_enabled = enabled;
        self.recreate_internals();
    }

    // --- Layer management --------------------------------------------------

    /// Number of layers
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Insert a new empty layer
    ///
    /// Negative positions count from the end, `-1` appending after the last
    /// layer. Returns the index of the new layer.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] when the position is outside
    /// `0..=layer_count`.
    pub fn add_layer(&mut self, position: i32) -> Result<usize> {
        let count = self.layers.len() as i32;
        let position = if position < 0 {
            count + position + 1
        } else {
            position
        };
        if position < 0 || position > count {
            return Err(MapError::IndexOutOfRange {
                layer: position.unsigned_abs() as usize,
                layer_count: self.layers.len(),
            });
        }

        self.clear_internals();
        self.layers
            .insert(position as usize, Layer::new(self.quadrant_size));
        self.recreate_internals();
        Ok(position as usize)
    }

    /// Move a layer to a new position
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad source index or a
    /// target position outside `0..=layer_count`.
    pub fn move_layer(&mut self, layer: usize, to_position: usize) -> Result<()> {
        self.check_layer(layer)?;
        if to_position > self.layers.len() {
            return Err(MapError::IndexOutOfRange {
                layer: to_position,
                layer_count: self.layers.len(),
            });
        }

        self.clear_internals();
        let moved = self.layers.remove(layer);
        let target = if to_position > layer {
            to_position - 1
        } else {
            to_position
        };
        self.layers.insert(target, moved);
        self.recreate_internals();
        Ok(())
    }

    /// Remove a layer and its cells
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad layer index.
    pub fn remove_layer(&mut self, layer: usize) -> Result<()> {
        self.check_layer(layer)?;
        self.clear_internals();
        self.layers.remove(layer);
        self.recreate_internals();
        self.used_rect_dirty = true;
        Ok(())
    }

    /// Settings of a layer
    pub fn layer_settings(&self, layer: usize) -> Option<&LayerSettings> {
        self.layers.get(layer).map(|l| &l.settings)
    }

    /// Rename a layer
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad layer index.
    pub fn set_layer_name(&mut self, layer: usize, name: impl Into<String>) -> Result<()> {
        self.check_layer(layer)?;
        if let Some(entry) = self.layers.get_mut(layer) {
            entry.settings.name = name.into();
        }
        Ok(())
    }

    /// Toggle a layer, tearing down or rebuilding its derived state
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad layer index.
    pub fn set_layer_enabled(&mut self, layer: usize, enabled: bool) -> Result<()> {
        self.check_layer(layer)?;
        if self
            .layers
            .get(layer)
            .is_some_and(|l| l.settings.enabled == enabled)
        {
            return Ok(());
        }
        self.clear_layer_internals(layer);
        if let Some(entry) = self.layers.get_mut(layer) {
            entry.settings.enabled = enabled;
        }
        self.recreate_layer_internals(layer);
        Ok(())
    }

    /// Set a layer's draw tint
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad layer index.
    pub fn set_layer_modulate(&mut self, layer: usize, modulate: [f32; 4]) -> Result<()> {
        self.check_layer(layer)?;
        if let Some(entry) = self.layers.get_mut(layer) {
            entry.settings.modulate = modulate;
        }
        Ok(())
    }

    /// Toggle per-cell depth sorting for a layer, rebuilding its index
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad layer index.
    pub fn set_layer_y_sort_enabled(&mut self, layer: usize, enabled: bool) -> Result<()> {
        self.check_layer(layer)?;
        if self
            .layers
            .get(layer)
            .is_some_and(|l| l.settings.y_sort_enabled == enabled)
        {
            return Ok(());
        }
        self.clear_layer_internals(layer);
        if let Some(entry) = self.layers.get_mut(layer) {
            entry.settings.y_sort_enabled = enabled;
        }
        self.recreate_layer_internals(layer);
        Ok(())
    }

    /// Set the depth-sort origin of a layer
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad layer index.
    pub fn set_layer_y_sort_origin(&mut self, layer: usize, origin: i32) -> Result<()> {
        self.check_layer(layer)?;
        if let Some(entry) = self.layers.get_mut(layer) {
            entry.settings.y_sort_origin = origin;
        }
        Ok(())
    }

    /// Set the z-index of a layer
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad layer index.
    pub fn set_layer_z_index(&mut self, layer: usize, z_index: i32) -> Result<()> {
        self.check_layer(layer)?;
        if let Some(entry) = self.layers.get_mut(layer) {
            entry.settings.z_index = z_index;
        }
        Ok(())
    }

    // --- Cell edits --------------------------------------------------------

    /// Place, replace or erase a cell
    ///
    /// Invalid references erase. Writing an identical reference is a silent
    /// no-op: no bucket is marked dirty and no flush is scheduled.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad layer index.
    pub fn set_cell(&mut self, layer: usize, coords: [i32; 2], cell: CellRef) -> Result<()> {
        self.check_layer(layer)?;
        let indexed = self.layer_is_indexed(layer);
        let cell = cell.normalized();

        let changed = {
            let Some(entry) = self.layers.get_mut(layer) else {
                return Ok(());
            };
            let Layer {
                cells,
                index,
                ..
            } = entry;
            let existing = cells.get(&coords).copied();

            match (existing, cell.is_valid()) {
                (None, false) => false,
                (Some(old), true) if old == cell => false,
                (Some(_), false) => {
                    cells.remove(&coords);
                    if indexed {
                        index.remove_cell(coords, &mut self.collaborators);
                    }
                    true
                }
                (Some(_), true) => {
                    cells.insert(coords, cell);
                    if indexed {
                        index.touch_cell(coords);
                    }
                    true
                }
                (None, true) => {
                    cells.insert(coords, cell);
                    if indexed {
                        index.insert_cell(layer, coords, &mut self.collaborators);
                    }
                    true
                }
            }
        };

        if changed {
            self.used_rect_dirty = true;
            self.schedule();
        }
        Ok(())
    }

    /// Erase a cell
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad layer index.
    pub fn erase_cell(&mut self, layer: usize, coords: [i32; 2]) -> Result<()> {
        self.set_cell(layer, coords, CellRef::INVALID)
    }

    /// Reference stored at a coordinate
    ///
    /// Returns [`CellRef::INVALID`] when the cell is absent or the layer
    /// index is out of range. With `use_proxies` the reference is resolved
    /// through the catalog's remap table before being returned.
    pub fn get_cell(&self, layer: usize, coords: [i32; 2], use_proxies: bool) -> CellRef {
        let Some(entry) = self.layers.get(layer) else {
            return CellRef::INVALID;
        };
        let Some(&cell) = entry.cells.get(&coords) else {
            return CellRef::INVALID;
        };
        if use_proxies {
            if let Some(catalog) = &self.catalog {
                return catalog.resolve_proxy(cell);
            }
        }
        cell
    }

    /// Occupied coordinates of a layer, sorted
    ///
    /// Empty for a bad layer index.
    pub fn get_used_cells(&self, layer: usize) -> Vec<[i32; 2]> {
        let Some(entry) = self.layers.get(layer) else {
            return Vec::new();
        };
        let mut coords: Vec<[i32; 2]> = entry.cells.keys().copied().collect();
        coords.sort_unstable();
        coords
    }

    /// Occupied coordinates matching a reference filter, sorted
    ///
    /// A `None` component matches anything. Empty for a bad layer index.
    pub fn get_used_cells_by_id(
        &self,
        layer: usize,
        source_id: Option<i32>,
        sub_coord: Option<[i32; 2]>,
        variant: Option<i32>,
    ) -> Vec<[i32; 2]> {
        let Some(entry) = self.layers.get(layer) else {
            return Vec::new();
        };
        let mut coords: Vec<[i32; 2]> = entry
            .cells
            .iter()
            .filter(|(_, cell)| {
                source_id.is_none_or(|id| id == cell.source_id)
                    && sub_coord.is_none_or(|sub| sub == cell.sub_coord)
                    && variant.is_none_or(|v| v == cell.variant)
            })
            .map(|(coords, _)| *coords)
            .collect();
        coords.sort_unstable();
        coords
    }

    /// Bounding rectangle covering every occupied cell across every layer
    ///
    /// Cached; invalidated by any edit. `None` when no layer has any cell.
    /// The size is the inclusive span plus one unit cell.
    pub fn get_used_rect(&mut self) -> Option<CellRect> {
        if self.used_rect_dirty {
            self.recompute_used_rect();
        }
        self.used_rect_cache
    }

    /// Remove every cell from a layer
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad layer index.
    pub fn clear_layer(&mut self, layer: usize) -> Result<()> {
        self.check_layer(layer)?;
        self.clear_layer_internals(layer);
        if let Some(entry) = self.layers.get_mut(layer) {
            entry.cells.clear();
        }
        self.recreate_layer_internals(layer);
        self.used_rect_dirty = true;
        Ok(())
    }

    /// Remove every cell from every layer
    pub fn clear(&mut self) {
        self.clear_internals();
        for layer in &mut self.layers {
            layer.cells.clear();
        }
        self.recreate_internals();
        self.used_rect_dirty = true;
    }

    /// Drop every stored reference the catalog no longer resolves
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MissingCatalog`] when no catalog is attached.
    pub fn fix_invalid_cells(&mut self) -> Result<()> {
        let catalog = self.require_catalog("fix invalid cells")?;
        let mut invalid = Vec::new();
        for (index, layer) in self.layers.iter().enumerate() {
            for (&coords, &cell) in &layer.cells {
                if !catalog.contains(cell) {
                    invalid.push((index, coords));
                }
            }
        }
        for (layer, coords) in invalid {
            self.erase_cell(layer, coords)?;
        }
        Ok(())
    }

    // --- Coordinate queries ------------------------------------------------

    /// World-space center of a cell
    ///
    /// Degenerates to the origin when no catalog is attached, so authoring
    /// tools stay interactive on a half-configured map.
    pub fn cell_to_world(&self, coords: [i32; 2]) -> [f64; 2] {
        self.geometry()
            .map_or([0.0, 0.0], |geometry| geometry.cell_to_world(coords))
    }

    /// Cell containing a world-space position
    ///
    /// Degenerates to the origin cell when no catalog is attached.
    pub fn world_to_cell(&self, position: [f64; 2]) -> [i32; 2] {
        self.geometry()
            .map_or([0, 0], |geometry| geometry.world_to_cell(position))
    }

    /// Whether a direction is meaningful for the current grid shape
    pub fn is_existing_neighbor(&self, direction: CellNeighbor) -> bool {
        self.geometry()
            .is_some_and(|geometry| geometry.is_valid_direction(direction))
    }

    /// Adjacent cell coordinate in a direction
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MissingCatalog`] without a catalog and
    /// [`MapError::InvalidNeighbor`] for a direction the grid shape does not
    /// support.
    pub fn neighbor_cell(&self, coords: [i32; 2], direction: CellNeighbor) -> Result<[i32; 2]> {
        let geometry = self
            .geometry()
            .ok_or(MapError::MissingCatalog {
                operation: "resolve a neighbor cell",
            })?;
        geometry.neighbor(coords, direction)
    }

    /// Side neighbors of a cell
    ///
    /// Empty when no catalog is attached.
    pub fn get_surrounding_cells(&self, coords: [i32; 2]) -> Vec<[i32; 2]> {
        self.geometry()
            .map_or_else(Vec::new, |geometry| geometry.surrounding_cells(coords))
    }

    // --- Patterns ----------------------------------------------------------

    /// Map coordinate a pattern cell lands on when stamped at a position
    ///
    /// Offset grids need parity compensation for the stacked layouts: a
    /// pattern authored starting on an even row shifts by one when stamped
    /// onto an odd row.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MissingCatalog`] without a catalog and
    /// [`MapError::InvalidParameter`] when the pattern has no cell at the
    /// given pattern coordinate.
    pub fn map_pattern(
        &self,
        position: [i32; 2],
        coords_in_pattern: [i32; 2],
        pattern: &MapPattern,
    ) -> Result<[i32; 2]> {
        let geometry = self.geometry().ok_or(MapError::MissingCatalog {
            operation: "map a pattern coordinate",
        })?;
        if !pattern.has_cell(coords_in_pattern) {
            return Err(MapError::InvalidParameter {
                parameter: "coords_in_pattern",
                value: format!("({}, {})", coords_in_pattern[0], coords_in_pattern[1]),
                reason: "pattern has no cell at this coordinate".to_string(),
            });
        }

        let mut output = [
            position[0] + coords_in_pattern[0],
            position[1] + coords_in_pattern[1],
        ];
        if geometry.shape != CellShape::Square {
            let horizontal = matches!(geometry.offset_axis, OffsetAxis::Horizontal);
            match geometry.layout {
                GridLayout::Stacked => {
                    if horizontal && position[1] % 2 != 0 && coords_in_pattern[1] % 2 != 0 {
                        output[0] += 1;
                    } else if !horizontal && position[0] % 2 != 0 && coords_in_pattern[0] % 2 != 0 {
                        output[1] += 1;
                    }
                }
                GridLayout::StackedOffset => {
                    if horizontal && position[1] % 2 != 0 && coords_in_pattern[1] % 2 != 0 {
                        output[0] -= 1;
                    } else if !horizontal && position[0] % 2 != 0 && coords_in_pattern[0] % 2 != 0 {
                        output[1] -= 1;
                    }
                }
                _ => {}
            }
        }
        Ok(output)
    }

    /// Stamp a pattern onto a layer
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad layer index and
    /// [`MapError::MissingCatalog`] without a catalog.
    pub fn set_pattern(
        &mut self,
        layer: usize,
        position: [i32; 2],
        pattern: &MapPattern,
    ) -> Result<()> {
        self.check_layer(layer)?;
        for coords in pattern.used_cells() {
            let target = self.map_pattern(position, coords, pattern)?;
            self.set_cell(layer, target, pattern.get_cell(coords))?;
        }
        Ok(())
    }

    /// Extract the occupied subset of the given coordinates as a pattern
    ///
    /// Pattern coordinates are relative to the componentwise minimum of the
    /// provided coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad layer index.
    pub fn get_pattern(&self, layer: usize, coords: &[[i32; 2]]) -> Result<MapPattern> {
        self.check_layer(layer)?;
        let mut pattern = MapPattern::new();
        let Some(anchor) = coords.iter().copied().reduce(|a, b| {
            [a[0].min(b[0]), a[1].min(b[1])]
        }) else {
            return Ok(pattern);
        };
        for &cell_coords in coords {
            let cell = self.get_cell(layer, cell_coords, false);
            if cell.is_valid() {
                pattern.set_cell(
                    [cell_coords[0] - anchor[0], cell_coords[1] - anchor[1]],
                    cell,
                );
            }
        }
        Ok(pattern)
    }

    // --- Terrain fills -----------------------------------------------------

    /// Paint a terrain over cells, connecting to matching neighbors
    ///
    /// # Errors
    ///
    /// Returns [`MapError::MissingCatalog`], [`MapError::IndexOutOfRange`] or
    /// [`MapError::InvalidTerrainSet`] for bad inputs.
    pub fn set_cells_terrain_connect(
        &mut self,
        layer: usize,
        cells: &[[i32; 2]],
        terrain_set: usize,
        terrain: i32,
        ignore_empty_terrains: bool,
    ) -> Result<()> {
        self.check_layer(layer)?;
        let output =
            solver::fill_connect(self, layer, cells, terrain_set, terrain, ignore_empty_terrains)?;
        self.apply_terrain_output(layer, terrain_set, cells, &output)
    }

    /// Paint a terrain along a path of adjacent cells
    ///
    /// # Errors
    ///
    /// As [`Self::set_cells_terrain_connect`], plus [`MapError::BrokenPath`]
    /// when consecutive path cells are not neighbors.
    pub fn set_cells_terrain_path(
        &mut self,
        layer: usize,
        path: &[[i32; 2]],
        terrain_set: usize,
        terrain: i32,
        ignore_empty_terrains: bool,
    ) -> Result<()> {
        self.check_layer(layer)?;
        let output =
            solver::fill_path(self, layer, path, terrain_set, terrain, ignore_empty_terrains)?;
        self.apply_terrain_output(layer, terrain_set, path, &output)
    }

    fn apply_terrain_output(
        &mut self,
        layer: usize,
        terrain_set: usize,
        painted: &[[i32; 2]],
        output: &BTreeMap<[i32; 2], TerrainPattern>,
    ) -> Result<()> {
        let catalog = self.require_catalog("apply a terrain fill")?;
        for (&coords, pattern) in output {
            let is_painted = painted.contains(&coords);
            if !is_painted && self.terrain_pattern_at(terrain_set, layer, coords) == *pattern {
                // Leave surrounding cells alone when the fill kept their
                // pattern unchanged.
                continue;
            }
            let cell = catalog.representative_cell(terrain_set, pattern);
            self.set_cell(layer, coords, cell)?;
        }
        Ok(())
    }

    /// Terrain pattern of the cell at a coordinate
    ///
    /// The empty pattern when the cell is absent or belongs to another
    /// terrain set.
    pub(crate) fn terrain_pattern_at(
        &self,
        terrain_set: usize,
        layer: usize,
        coords: [i32; 2],
    ) -> TerrainPattern {
        let cell = self.get_cell(layer, coords, false);
        if !cell.is_valid() {
            return TerrainPattern::new();
        }
        self.catalog
            .as_ref()
            .and_then(|catalog| catalog.terrain_pattern_of(terrain_set, cell))
            .unwrap_or_default()
    }

    // --- Buffer import/export ---------------------------------------------

    /// Replace a layer's cells from a binary cell buffer
    ///
    /// Legacy formats are upgraded in memory. A corrupt buffer is rejected
    /// wholesale: the layer keeps its prior cells.
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad layer index and
    /// [`MapError::CorruptData`] for a buffer whose length is not a multiple
    /// of the record width.
    pub fn set_cells_from_buffer(
        &mut self,
        layer: usize,
        data: &[u8],
        format: BufferFormat,
    ) -> Result<()> {
        self.check_layer(layer)?;
        let decoded = buffer::decode_cells(data, format)?;
        self.clear_layer(layer)?;
        for (coords, cell) in decoded {
            self.set_cell(layer, coords, cell)?;
        }
        Ok(())
    }

    /// Export a layer's cells as a binary buffer in the newest format
    ///
    /// # Errors
    ///
    /// Returns [`MapError::IndexOutOfRange`] for a bad layer index.
    pub fn get_cells_as_buffer(&self, layer: usize) -> Result<Vec<u8>> {
        self.check_layer(layer)?;
        let Some(entry) = self.layers.get(layer) else {
            return Ok(Vec::new());
        };
        let mut cells: Vec<([i32; 2], CellRef)> =
            entry.cells.iter().map(|(&c, &r)| (c, r)).collect();
        cells.sort_unstable();
        Ok(buffer::encode_cells(&cells))
    }

    // --- Introspection -----------------------------------------------------

    /// Live buckets of a layer, for debugging and tests
    pub fn quadrants(&self, layer: usize) -> Vec<&Quadrant> {
        self.layers
            .get(layer)
            .map_or_else(Vec::new, |l| l.index.quadrants().collect())
    }

    /// Number of live buckets on a layer
    pub fn quadrant_count(&self, layer: usize) -> usize {
        self.layers.get(layer).map_or(0, |l| l.index.quadrant_count())
    }

    /// Number of buckets awaiting a rebuild on a layer
    pub fn dirty_quadrant_count(&self, layer: usize) -> usize {
        self.layers.get(layer).map_or(0, |l| l.index.dirty_count())
    }

    // --- Internals ---------------------------------------------------------

    fn check_layer(&self, layer: usize) -> Result<()> {
        if layer < self.layers.len() {
            Ok(())
        } else {
            Err(MapError::IndexOutOfRange {
                layer,
                layer_count: self.layers.len(),
            })
        }
    }

    fn require_catalog(&self, operation: &'static str) -> Result<Rc<dyn CellCatalog>> {
        self.catalog
            .clone()
            .ok_or(MapError::MissingCatalog { operation })
    }

    /// Whether a layer maintains a bucket index
    fn layer_is_indexed(&self, layer: usize) -> bool {
        self.catalog.is_some()
            && self
                .layers
                .get(layer)
                .is_some_and(|l| l.settings.enabled)
    }

    fn schedule(&mut self) {
        if self.attached && !self.pending_update {
            self.pending_update = true;
        }
    }

    fn poll_catalog(&mut self) {
        let Some(catalog) = &self.catalog else {
            return;
        };
        let generation = catalog.generation();
        if generation != self.catalog_generation {
            self.catalog_generation = generation;
            self.clear_internals();
            self.recreate_internals();
        }
    }

    fn clear_layer_internals(&mut self, layer: usize) {
        if let Some(entry) = self.layers.get_mut(layer) {
            entry.index.clear(&mut self.collaborators);
        }
    }

    fn clear_internals(&mut self) {
        for layer in &mut self.layers {
            layer.index.clear(&mut self.collaborators);
        }
    }

    fn recreate_layer_internals(&mut self, layer: usize) {
        if !self.layer_is_indexed(layer) {
            return;
        }
        let bucket_size = self.effective_quadrant_size(layer);
        if let Some(entry) = self.layers.get_mut(layer) {
            let Layer {
                cells,
                index,
                ..
            } = entry;
            index.rebuild(layer, bucket_size, cells, &mut self.collaborators);
        }
        self.schedule();
    }

    fn recreate_internals(&mut self) {
        for layer in 0..self.layers.len() {
            self.recreate_layer_internals(layer);
        }
    }

    fn recompute_used_rect(&mut self) {
        let mut rect: Option<CellRect> = None;
        for layer in &self.layers {
            for &coords in layer.cells.keys() {
                match &mut rect {
                    None => rect = Some(CellRect::single(coords)),
                    Some(rect) => rect.expand_to(coords),
                }
            }
        }
        self.used_rect_cache = rect;
        self.used_rect_dirty = false;
    }
}

impl Default for GridMap {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GridMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridMap")
            .field("layers", &self.layers.len())
            .field("quadrant_size", &self.quadrant_size)
            .field("attached", &self.attached)
            .field("pending_update", &self.pending_update)
            .finish_non_exhaustive()
    }
}
