//! Neighbor directions and the per-geometry adjacency tables
//!
//! Directions are shared across all shapes; which ones are meaningful depends
//! on the shape and offset axis. Even discriminants are edge ("side")
//! neighbors and odd discriminants are corner neighbors, a property the
//! terrain solver relies on.

use crate::geometry::config::{CellShape, GridGeometry, GridLayout, OffsetAxis};
use crate::io::error::{MapError, Result};

/// One of the up-to-sixteen adjacency slots around a cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum CellNeighbor {
    /// Edge neighbor to the right
    RightSide = 0,
    /// Corner neighbor to the right
    RightCorner = 1,
    /// Edge neighbor to the bottom right
    BottomRightSide = 2,
    /// Corner neighbor to the bottom right
    BottomRightCorner = 3,
    /// Edge neighbor below
    BottomSide = 4,
    /// Corner neighbor below
    BottomCorner = 5,
    /// Edge neighbor to the bottom left
    BottomLeftSide = 6,
    /// Corner neighbor to the bottom left
    BottomLeftCorner = 7,
    /// Edge neighbor to the left
    LeftSide = 8,
    /// Corner neighbor to the left
    LeftCorner = 9,
    /// Edge neighbor to the top left
    TopLeftSide = 10,
    /// Corner neighbor to the top left
    TopLeftCorner = 11,
    /// Edge neighbor above
    TopSide = 12,
    /// Corner neighbor above
    TopCorner = 13,
    /// Edge neighbor to the top right
    TopRightSide = 14,
    /// Corner neighbor to the top right
    TopRightCorner = 15,
}

impl CellNeighbor {
    /// Every direction, in discriminant order
    pub const ALL: [Self; 16] = [
        Self::RightSide,
        Self::RightCorner,
        Self::BottomRightSide,
        Self::BottomRightCorner,
        Self::BottomSide,
        Self::BottomCorner,
        Self::BottomLeftSide,
        Self::BottomLeftCorner,
        Self::LeftSide,
        Self::LeftCorner,
        Self::TopLeftSide,
        Self::TopLeftCorner,
        Self::TopSide,
        Self::TopCorner,
        Self::TopRightSide,
        Self::TopRightCorner,
    ];

    /// Discriminant as an array index
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Direction for a discriminant, if in range
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Whether this is an edge neighbor
    pub const fn is_side(self) -> bool {
        (self as u8) % 2 == 0
    }

    /// Whether this is a corner neighbor
    pub const fn is_corner(self) -> bool {
        (self as u8) % 2 == 1
    }

    /// The direction pointing back at this one
    pub fn opposite(self) -> Self {
        let index = (self.index() + 8) % 16;
        Self::ALL.get(index).copied().unwrap_or(self)
    }
}

/// Compass slot a direction occupies on a half-offset grid
///
/// The concrete coordinate delta per slot depends only on the layout, the
/// offset axis and (for the stacked layouts) the row or column parity, while
/// the direction naming depends on the shape. Splitting the two keeps the
/// delta tables small.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HexSlot {
    East,
    NorthEast,
    North,
    NorthWest,
    West,
    SouthWest,
    South,
    SouthEast,
}

impl GridGeometry {
    /// Whether a direction is meaningful for the current shape and axis
    pub fn is_valid_direction(&self, direction: CellNeighbor) -> bool {
        match self.shape {
            CellShape::Square => matches!(
                direction,
                CellNeighbor::RightSide
                    | CellNeighbor::BottomRightCorner
                    | CellNeighbor::BottomSide
                    | CellNeighbor::BottomLeftCorner
                    | CellNeighbor::LeftSide
                    | CellNeighbor::TopLeftCorner
                    | CellNeighbor::TopSide
                    | CellNeighbor::TopRightCorner
            ),
            CellShape::Isometric | CellShape::HalfOffsetSquare | CellShape::Hexagon => {
                self.half_offset_slot(direction).is_some()
            }
        }
    }

    /// Adjacent cell coordinate in the given direction
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidNeighbor`] when the direction is not
    /// meaningful for the current shape and offset axis.
    pub fn neighbor(&self, coords: [i32; 2], direction: CellNeighbor) -> Result<[i32; 2]> {
        let delta = match self.shape {
            CellShape::Square => match direction {
                CellNeighbor::RightSide => [1, 0],
                CellNeighbor::BottomRightCorner => [1, 1],
                CellNeighbor::BottomSide => [0, 1],
                CellNeighbor::BottomLeftCorner => [-1, 1],
                CellNeighbor::LeftSide => [-1, 0],
                CellNeighbor::TopLeftCorner => [-1, -1],
                CellNeighbor::TopSide => [0, -1],
                CellNeighbor::TopRightCorner => [1, -1],
                _ => return Err(MapError::InvalidNeighbor { direction }),
            },
            CellShape::Isometric | CellShape::HalfOffsetSquare | CellShape::Hexagon => {
                let slot = self
                    .half_offset_slot(direction)
                    .ok_or(MapError::InvalidNeighbor { direction })?;
                self.half_offset_delta(slot, coords)
            }
        };
        Ok([coords[0] + delta[0], coords[1] + delta[1]])
    }

    /// Side neighbors of a cell, in clockwise order starting from the right
    ///
    /// Four cells for square and isometric shapes, six for the half-offset
    /// square and hexagon shapes.
    pub fn surrounding_cells(&self, coords: [i32; 2]) -> Vec<[i32; 2]> {
        let directions: &[CellNeighbor] = match self.shape {
            CellShape::Square => &[
                CellNeighbor::RightSide,
                CellNeighbor::BottomSide,
                CellNeighbor::LeftSide,
                CellNeighbor::TopSide,
            ],
            CellShape::Isometric => &[
                CellNeighbor::BottomRightSide,
                CellNeighbor::BottomLeftSide,
                CellNeighbor::TopLeftSide,
                CellNeighbor::TopRightSide,
            ],
            CellShape::HalfOffsetSquare | CellShape::Hexagon => {
                match self.offset_axis {
                    OffsetAxis::Horizontal => &[
                        CellNeighbor::RightSide,
                        CellNeighbor::BottomRightSide,
                        CellNeighbor::BottomLeftSide,
                        CellNeighbor::LeftSide,
                        CellNeighbor::TopLeftSide,
                        CellNeighbor::TopRightSide,
                    ],
                    OffsetAxis::Vertical => &[
                        CellNeighbor::BottomRightSide,
                        CellNeighbor::BottomSide,
                        CellNeighbor::BottomLeftSide,
                        CellNeighbor::TopLeftSide,
                        CellNeighbor::TopSide,
                        CellNeighbor::TopRightSide,
                    ],
                }
            }
        };

        directions
            .iter()
            .filter_map(|&direction| self.neighbor(coords, direction).ok())
            .collect()
    }

    /// Map a direction onto its compass slot for the current shape and axis
    ///
    /// Isometric grids name their edge neighbors after the diagonals, so the
    /// cardinal slots carry corner directions there and side directions on
    /// the other half-offset shapes.
    fn half_offset_slot(&self, direction: CellNeighbor) -> Option<HexSlot> {
        let isometric = matches!(self.shape, CellShape::Isometric);
        match self.offset_axis {
            OffsetAxis::Horizontal => match direction {
                CellNeighbor::RightCorner if isometric => Some(HexSlot::East),
                CellNeighbor::RightSide if !isometric => Some(HexSlot::East),
                CellNeighbor::BottomRightSide => Some(HexSlot::SouthEast),
                CellNeighbor::BottomCorner if isometric => Some(HexSlot::South),
                CellNeighbor::BottomLeftSide => Some(HexSlot::SouthWest),
                CellNeighbor::LeftCorner if isometric => Some(HexSlot::West),
                CellNeighbor::LeftSide if !isometric => Some(HexSlot::West),
                CellNeighbor::TopLeftSide => Some(HexSlot::NorthWest),
                CellNeighbor::TopCorner if isometric => Some(HexSlot::North),
                CellNeighbor::TopRightSide => Some(HexSlot::NorthEast),
                _ => None,
            },
            OffsetAxis::Vertical => match direction {
                CellNeighbor::BottomCorner if isometric => Some(HexSlot::South),
                CellNeighbor::BottomSide if !isometric => Some(HexSlot::South),
                CellNeighbor::BottomRightSide => Some(HexSlot::SouthEast),
                CellNeighbor::RightCorner if isometric => Some(HexSlot::East),
                CellNeighbor::TopRightSide => Some(HexSlot::NorthEast),
                CellNeighbor::TopCorner if isometric => Some(HexSlot::North),
                CellNeighbor::TopSide if !isometric => Some(HexSlot::North),
                CellNeighbor::TopLeftSide => Some(HexSlot::NorthWest),
                CellNeighbor::LeftCorner if isometric => Some(HexSlot::West),
                CellNeighbor::BottomLeftSide => Some(HexSlot::SouthWest),
                _ => None,
            },
        }
    }

    /// Coordinate delta for a compass slot on a half-offset grid
    fn half_offset_delta(&self, slot: HexSlot, coords: [i32; 2]) -> [i32; 2] {
        match self.layout {
            GridLayout::Stacked => match self.offset_axis {
                OffsetAxis::Horizontal => {
                    let offset = coords[1] % 2 != 0;
                    match slot {
                        HexSlot::East => [1, 0],
                        HexSlot::SouthEast => [i32::from(offset), 1],
                        HexSlot::South => [0, 2],
                        HexSlot::SouthWest => [i32::from(offset) - 1, 1],
                        HexSlot::West => [-1, 0],
                        HexSlot::NorthWest => [i32::from(offset) - 1, -1],
                        HexSlot::North => [0, -2],
                        HexSlot::NorthEast => [i32::from(offset), -1],
                    }
                }
                OffsetAxis::Vertical => {
                    let offset = coords[0] % 2 != 0;
                    match slot {
                        HexSlot::South => [0, 1],
                        HexSlot::SouthEast => [1, i32::from(offset)],
                        HexSlot::East => [2, 0],
                        HexSlot::NorthEast => [1, i32::from(offset) - 1],
                        HexSlot::North => [0, -1],
                        HexSlot::NorthWest => [-1, i32::from(offset) - 1],
                        HexSlot::West => [-2, 0],
                        HexSlot::SouthWest => [-1, i32::from(offset)],
                    }
                }
            },
            GridLayout::StackedOffset => match self.offset_axis {
                OffsetAxis::Horizontal => {
                    let offset = coords[1] % 2 != 0;
                    match slot {
                        HexSlot::East => [1, 0],
                        HexSlot::SouthEast => [1 - i32::from(offset), 1],
                        HexSlot::South => [0, 2],
                        HexSlot::SouthWest => [-i32::from(offset), 1],
                        HexSlot::West => [-1, 0],
                        HexSlot::NorthWest => [-i32::from(offset), -1],
                        HexSlot::North => [0, -2],
                        HexSlot::NorthEast => [1 - i32::from(offset), -1],
                    }
                }
                OffsetAxis::Vertical => {
                    let offset = coords[0] % 2 != 0;
                    match slot {
                        HexSlot::South => [0, 1],
                        HexSlot::SouthEast => [1, 1 - i32::from(offset)],
                        HexSlot::East => [2, 0],
                        HexSlot::NorthEast => [1, -i32::from(offset)],
                        HexSlot::North => [0, -1],
                        HexSlot::NorthWest => [-1, -i32::from(offset)],
                        HexSlot::West => [-2, 0],
                        HexSlot::SouthWest => [-1, 1 - i32::from(offset)],
                    }
                }
            },
            GridLayout::StairsRight | GridLayout::StairsDown => {
                let along_rows = matches!(self.layout, GridLayout::StairsRight)
                    ^ matches!(self.offset_axis, OffsetAxis::Vertical);
                match (along_rows, self.offset_axis) {
                    (true, OffsetAxis::Horizontal) => match slot {
                        HexSlot::East => [1, 0],
                        HexSlot::SouthEast => [0, 1],
                        HexSlot::South => [-1, 2],
                        HexSlot::SouthWest => [-1, 1],
                        HexSlot::West => [-1, 0],
                        HexSlot::NorthWest => [0, -1],
                        HexSlot::North => [1, -2],
                        HexSlot::NorthEast => [1, -1],
                    },
                    (true, OffsetAxis::Vertical) => match slot {
                        HexSlot::South => [0, 1],
                        HexSlot::SouthEast => [1, 0],
                        HexSlot::East => [2, -1],
                        HexSlot::NorthEast => [1, -1],
                        HexSlot::North => [0, -1],
                        HexSlot::NorthWest => [-1, 0],
                        HexSlot::West => [-2, 1],
                        HexSlot::SouthWest => [-1, 1],
                    },
                    (false, OffsetAxis::Horizontal) => match slot {
                        HexSlot::East => [2, -1],
                        HexSlot::SouthEast => [1, 0],
                        HexSlot::South => [0, 1],
                        HexSlot::SouthWest => [-1, 1],
                        HexSlot::West => [-2, 1],
                        HexSlot::NorthWest => [-1, 0],
                        HexSlot::North => [0, -1],
                        HexSlot::NorthEast => [1, -1],
                    },
                    (false, OffsetAxis::Vertical) => match slot {
                        HexSlot::South => [-1, 2],
                        HexSlot::SouthEast => [0, 1],
                        HexSlot::East => [1, 0],
                        HexSlot::NorthEast => [1, -1],
                        HexSlot::North => [1, -2],
                        HexSlot::NorthWest => [0, -1],
                        HexSlot::West => [-1, 0],
                        HexSlot::SouthWest => [-1, 1],
                    },
                }
            }
            GridLayout::DiamondRight | GridLayout::DiamondDown => {
                let along_rows = matches!(self.layout, GridLayout::DiamondRight)
                    ^ matches!(self.offset_axis, OffsetAxis::Vertical);
                match (along_rows, self.offset_axis) {
                    (true, OffsetAxis::Horizontal) => match slot {
                        HexSlot::East => [1, 1],
                        HexSlot::SouthEast => [0, 1],
                        HexSlot::South => [-1, 1],
                        HexSlot::SouthWest => [-1, 0],
                        HexSlot::West => [-1, -1],
                        HexSlot::NorthWest => [0, -1],
                        HexSlot::North => [1, -1],
                        HexSlot::NorthEast => [1, 0],
                    },
                    (true, OffsetAxis::Vertical) => match slot {
                        HexSlot::South => [1, 1],
                        HexSlot::SouthEast => [1, 0],
                        HexSlot::East => [1, -1],
                        HexSlot::NorthEast => [0, -1],
                        HexSlot::North => [-1, -1],
                        HexSlot::NorthWest => [-1, 0],
                        HexSlot::West => [-1, 1],
                        HexSlot::SouthWest => [0, 1],
                    },
                    (false, OffsetAxis::Horizontal) => match slot {
                        HexSlot::East => [1, -1],
                        HexSlot::SouthEast => [1, 0],
                        HexSlot::South => [1, 1],
                        HexSlot::SouthWest => [0, 1],
                        HexSlot::West => [-1, 1],
                        HexSlot::NorthWest => [-1, 0],
                        HexSlot::North => [-1, -1],
                        HexSlot::NorthEast => [0, -1],
                    },
                    (false, OffsetAxis::Vertical) => match slot {
                        HexSlot::South => [-1, 1],
                        HexSlot::SouthEast => [0, 1],
                        HexSlot::East => [1, 1],
                        HexSlot::NorthEast => [1, 0],
                        HexSlot::North => [1, -1],
                        HexSlot::NorthWest => [0, -1],
                        HexSlot::West => [-1, -1],
                        HexSlot::SouthWest => [-1, 0],
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CellNeighbor;

    #[test]
    fn opposites_are_involutions() {
        for direction in CellNeighbor::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_eq!(direction.is_side(), direction.opposite().is_side());
        }
    }

    #[test]
    fn sides_and_corners_alternate() {
        assert!(CellNeighbor::RightSide.is_side());
        assert!(CellNeighbor::RightCorner.is_corner());
        assert!(CellNeighbor::BottomSide.is_side());
        assert!(CellNeighbor::TopLeftCorner.is_corner());
    }
}
