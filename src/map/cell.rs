//! Cell references and cell-space rectangles

/// Reference to one tile in the external cell-set resource
///
/// A cell stores which source (atlas) the tile comes from, the sub-tile
/// coordinate inside that source, and which alternative variant to use.
/// Replaced wholesale on every edit; never mutated in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    /// Identifier of the source atlas, `-1` when empty
    pub source_id: i32,
    /// Sub-tile coordinate inside the source
    pub sub_coord: [i32; 2],
    /// Alternative-variant index
    pub variant: i32,
}

impl CellRef {
    /// The distinguished "no tile here" value
    pub const INVALID: Self = Self {
        source_id: -1,
        sub_coord: [-1, -1],
        variant: -1,
    };

    /// Reference with the given components
    pub const fn new(source_id: i32, sub_coord: [i32; 2], variant: i32) -> Self {
        Self {
            source_id,
            sub_coord,
            variant,
        }
    }

    /// Whether this reference points at an actual tile
    pub const fn is_valid(&self) -> bool {
        self.source_id != Self::INVALID.source_id
            && self.sub_coord[0] != Self::INVALID.sub_coord[0]
            && self.sub_coord[1] != Self::INVALID.sub_coord[1]
            && self.variant != Self::INVALID.variant
    }

    /// Collapse a partially-invalid triple to [`Self::INVALID`]
    ///
    /// A reference with any invalid component cannot address a tile, so it is
    /// treated as fully empty rather than stored half-formed.
    pub const fn normalized(self) -> Self {
        if self.is_valid() { self } else { Self::INVALID }
    }
}

impl Default for CellRef {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Axis-aligned rectangle in cell space
///
/// The size is the inclusive coordinate span plus one unit cell, so a single
/// occupied cell yields a unit rectangle rather than a degenerate point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRect {
    /// Top-left corner (minimum coordinates)
    pub position: [i32; 2],
    /// Extent in cells along each axis
    pub size: [i32; 2],
}

impl CellRect {
    /// Unit rectangle covering a single cell
    pub const fn single(coords: [i32; 2]) -> Self {
        Self {
            position: coords,
            size: [1, 1],
        }
    }

    /// Grow the rectangle so it covers the given cell
    pub fn expand_to(&mut self, coords: [i32; 2]) {
        let max = [
            (self.position[0] + self.size[0]).max(coords[0] + 1),
            (self.position[1] + self.size[1]).max(coords[1] + 1),
        ];
        self.position = [
            self.position[0].min(coords[0]),
            self.position[1].min(coords[1]),
        ];
        self.size = [max[0] - self.position[0], max[1] - self.position[1]];
    }

    /// Whether the rectangle covers the given cell
    pub const fn contains(&self, coords: [i32; 2]) -> bool {
        coords[0] >= self.position[0]
            && coords[0] < self.position[0] + self.size[0]
            && coords[1] >= self.position[1]
            && coords[1] < self.position[1] + self.size[1]
    }
}

#[cfg(test)]
mod tests {
    use super::{CellRect, CellRef};

    #[test]
    fn partial_invalid_collapses_to_invalid() {
        let partial = CellRef::new(3, [-1, -1], 0);
        assert_eq!(partial.normalized(), CellRef::INVALID);
        let valid = CellRef::new(3, [0, 0], 0);
        assert_eq!(valid.normalized(), valid);
    }

    #[test]
    fn rect_expansion_tracks_both_corners() {
        let mut rect = CellRect::single([0, 0]);
        rect.expand_to([2, -1]);
        assert_eq!(rect.position, [0, -1]);
        assert_eq!(rect.size, [3, 2]);
        assert!(rect.contains([1, 0]));
        assert!(!rect.contains([3, 0]));
    }
}
