//! Reusable cell patterns for stamping
//!
//! A pattern is a small free-standing group of cells addressed relative to
//! its own origin. Stamping a pattern onto an offset grid has to compensate
//! for row or column parity, which [`crate::map::GridMap::map_pattern`]
//! handles.

use std::collections::HashMap;

use crate::map::cell::CellRef;

/// Free-standing group of cells addressed relative to a local origin
#[derive(Clone, Debug, Default)]
pub struct MapPattern {
    cells: HashMap<[i32; 2], CellRef>,
}

impl MapPattern {
    /// Empty pattern
    pub fn new() -> Self {
        Self::default()
    }

    /// Place or replace a cell of the pattern
    ///
    /// Invalid references erase instead of storing a hole.
    pub fn set_cell(&mut self, coords: [i32; 2], cell: CellRef) {
        let cell = cell.normalized();
        if cell.is_valid() {
            self.cells.insert(coords, cell);
        } else {
            self.cells.remove(&coords);
        }
    }

    /// Reference stored at a pattern coordinate
    pub fn get_cell(&self, coords: [i32; 2]) -> CellRef {
        self.cells.get(&coords).copied().unwrap_or(CellRef::INVALID)
    }

    /// Whether the pattern stores a cell at the coordinate
    pub fn has_cell(&self, coords: [i32; 2]) -> bool {
        self.cells.contains_key(&coords)
    }

    /// Occupied pattern coordinates, sorted
    pub fn used_cells(&self) -> Vec<[i32; 2]> {
        let mut coords: Vec<[i32; 2]> = self.cells.keys().copied().collect();
        coords.sort_unstable();
        coords
    }

    /// Whether the pattern stores no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::MapPattern;
    use crate::map::cell::CellRef;

    #[test]
    fn invalid_references_erase() {
        let mut pattern = MapPattern::new();
        pattern.set_cell([0, 0], CellRef::new(1, [0, 0], 0));
        assert!(pattern.has_cell([0, 0]));
        pattern.set_cell([0, 0], CellRef::INVALID);
        assert!(!pattern.has_cell([0, 0]));
        assert!(pattern.is_empty());
    }
}
