//! Terrain patterns and the peering bits a grid shape supports
//!
//! A terrain pattern assigns a terrain id to a cell's center and to each of
//! its valid peering bits. Which bits are valid depends on the cell shape and
//! offset axis (the adjacency slots that physically touch another cell) and
//! on the terrain set's matching mode.

use crate::geometry::config::{CellShape, OffsetAxis};
use crate::geometry::neighbor::CellNeighbor;

/// Terrain id marking an unset center or peering bit
pub const EMPTY_TERRAIN: i32 = -1;

/// Which adjacency slots participate in terrain matching for a terrain set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerrainMode {
    /// Match across both corner and side bits
    CornersAndSides,
    /// Match across corner bits only
    Corners,
    /// Match across side bits only
    Sides,
}

impl TerrainMode {
    /// Whether the mode matches across the given bit kind
    pub const fn accepts(self, bit: CellNeighbor) -> bool {
        match self {
            Self::CornersAndSides => true,
            Self::Corners => bit.is_corner(),
            Self::Sides => bit.is_side(),
        }
    }
}

/// Peering bits that physically touch a neighbor for a shape and axis
///
/// Sides and corners interleave so a `CornersAndSides` terrain set uses the
/// whole slice, while the restricted modes filter it through
/// [`TerrainMode::accepts`].
pub const fn peering_bits(shape: CellShape, offset_axis: OffsetAxis) -> &'static [CellNeighbor] {
    match shape {
        CellShape::Square => &[
            CellNeighbor::RightSide,
            CellNeighbor::BottomRightCorner,
            CellNeighbor::BottomSide,
            CellNeighbor::BottomLeftCorner,
            CellNeighbor::LeftSide,
            CellNeighbor::TopLeftCorner,
            CellNeighbor::TopSide,
            CellNeighbor::TopRightCorner,
        ],
        CellShape::Isometric => &[
            CellNeighbor::RightCorner,
            CellNeighbor::BottomRightSide,
            CellNeighbor::BottomCorner,
            CellNeighbor::BottomLeftSide,
            CellNeighbor::LeftCorner,
            CellNeighbor::TopLeftSide,
            CellNeighbor::TopCorner,
            CellNeighbor::TopRightSide,
        ],
        CellShape::HalfOffsetSquare | CellShape::Hexagon => match offset_axis {
            OffsetAxis::Horizontal => &[
                CellNeighbor::RightSide,
                CellNeighbor::BottomRightCorner,
                CellNeighbor::BottomRightSide,
                CellNeighbor::BottomCorner,
                CellNeighbor::BottomLeftSide,
                CellNeighbor::BottomLeftCorner,
                CellNeighbor::LeftSide,
                CellNeighbor::TopLeftCorner,
                CellNeighbor::TopLeftSide,
                CellNeighbor::TopCorner,
                CellNeighbor::TopRightSide,
                CellNeighbor::TopRightCorner,
            ],
            OffsetAxis::Vertical => &[
                CellNeighbor::RightCorner,
                CellNeighbor::BottomRightSide,
                CellNeighbor::BottomRightCorner,
                CellNeighbor::BottomSide,
                CellNeighbor::BottomLeftCorner,
                CellNeighbor::BottomLeftSide,
                CellNeighbor::LeftCorner,
                CellNeighbor::TopLeftSide,
                CellNeighbor::TopLeftCorner,
                CellNeighbor::TopSide,
                CellNeighbor::TopRightCorner,
                CellNeighbor::TopRightSide,
            ],
        },
    }
}

/// Terrain assignment for a cell's center and peering bits
///
/// Unset slots carry [`EMPTY_TERRAIN`]. The derived ordering makes candidate
/// enumeration deterministic wherever patterns are collected into ordered
/// sets.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TerrainPattern {
    terrain: i32,
    peering: [i32; 16],
}

impl TerrainPattern {
    /// Pattern with every slot unset
    pub const fn new() -> Self {
        Self {
            terrain: EMPTY_TERRAIN,
            peering: [EMPTY_TERRAIN; 16],
        }
    }

    /// Pattern with the given center terrain and every peering bit unset
    pub const fn with_terrain(terrain: i32) -> Self {
        Self {
            terrain,
            peering: [EMPTY_TERRAIN; 16],
        }
    }

    /// Pattern with the given terrain at the center and every peering bit
    pub fn filled(terrain: i32, bits: &[CellNeighbor]) -> Self {
        let mut pattern = Self::with_terrain(terrain);
        for &bit in bits {
            pattern.set_peering_bit(bit, terrain);
        }
        pattern
    }

    /// Center terrain id
    pub const fn terrain(&self) -> i32 {
        self.terrain
    }

    /// Replace the center terrain id
    pub const fn set_terrain(&mut self, terrain: i32) {
        self.terrain = terrain;
    }

    /// Terrain id at a peering bit
    pub fn peering_bit(&self, bit: CellNeighbor) -> i32 {
        self.peering.get(bit.index()).copied().unwrap_or(EMPTY_TERRAIN)
    }

    /// Assign a terrain id to a peering bit
    pub fn set_peering_bit(&mut self, bit: CellNeighbor, terrain: i32) {
        if let Some(slot) = self.peering.get_mut(bit.index()) {
            *slot = terrain;
        }
    }
}

impl Default for TerrainPattern {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{EMPTY_TERRAIN, TerrainMode, TerrainPattern, peering_bits};
    use crate::geometry::config::{CellShape, OffsetAxis};
    use crate::geometry::neighbor::CellNeighbor;

    #[test]
    fn square_grid_exposes_eight_bits() {
        let bits = peering_bits(CellShape::Square, OffsetAxis::Horizontal);
        assert_eq!(bits.len(), 8);
        assert_eq!(bits.iter().filter(|bit| bit.is_side()).count(), 4);
        assert_eq!(bits.iter().filter(|bit| bit.is_corner()).count(), 4);
    }

    #[test]
    fn hexagon_grid_exposes_twelve_bits() {
        for axis in [OffsetAxis::Horizontal, OffsetAxis::Vertical] {
            let bits = peering_bits(CellShape::Hexagon, axis);
            assert_eq!(bits.len(), 12);
            assert_eq!(bits.iter().filter(|bit| bit.is_side()).count(), 6);
        }
    }

    #[test]
    fn restricted_modes_filter_bit_kinds() {
        assert!(TerrainMode::Sides.accepts(CellNeighbor::RightSide));
        assert!(!TerrainMode::Sides.accepts(CellNeighbor::RightCorner));
        assert!(TerrainMode::Corners.accepts(CellNeighbor::RightCorner));
        assert!(TerrainMode::CornersAndSides.accepts(CellNeighbor::RightCorner));
    }

    #[test]
    fn unset_pattern_reads_empty_everywhere() {
        let pattern = TerrainPattern::new();
        assert_eq!(pattern.terrain(), EMPTY_TERRAIN);
        for bit in CellNeighbor::ALL {
            assert_eq!(pattern.peering_bit(bit), EMPTY_TERRAIN);
        }
    }
}
