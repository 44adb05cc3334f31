//! Canonical terrain constraints and the priority-aware constraint set
//!
//! A peering bit is physically shared by two to four cells. Constraints
//! canonicalize every (cell, bit) pair onto one base cell and a small bit
//! index, so conflicting requirements collide on the same key no matter
//! which of the overlapping cells they were derived from. Bit zero is the
//! cell center; bits one and up are the shape-specific shared edges and
//! corners below and to the right of the base cell.

use std::collections::BTreeMap;

use crate::geometry::config::{CellShape, GridGeometry, OffsetAxis};
use crate::geometry::neighbor::CellNeighbor;
use crate::io::error::{MapError, Result};

/// One terrain requirement at a canonical (base cell, bit) slot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerrainConstraint {
    base: [i32; 2],
    bit: u8,
    terrain: i32,
    priority: i32,
}

/// Canonical key of a constraint
pub type ConstraintKey = ([i32; 2], u8);

impl TerrainConstraint {
    /// Constraint on the center of a cell
    pub const fn center(position: [i32; 2], terrain: i32) -> Self {
        Self {
            base: position,
            bit: 0,
            terrain,
            priority: 1,
        }
    }

    /// Constraint on a peering bit of a cell, canonicalized
    ///
    /// # Errors
    ///
    /// Returns [`MapError::InvalidNeighbor`] when the bit does not exist for
    /// the grid shape and offset axis.
    pub fn peering(
        geometry: &GridGeometry,
        position: [i32; 2],
        bit: CellNeighbor,
        terrain: i32,
    ) -> Result<Self> {
        let (canonical_bit, base) = canonicalize(geometry, position, bit)
            .ok_or(MapError::InvalidNeighbor { direction: bit })?;
        Ok(Self {
            base,
            bit: canonical_bit,
            terrain,
            priority: 1,
        })
    }

    /// Canonical key identifying the constrained slot
    pub const fn key(&self) -> ConstraintKey {
        (self.base, self.bit)
    }

    /// Base cell the slot is canonicalized onto
    pub const fn base_cell(&self) -> [i32; 2] {
        self.base
    }

    /// Whether the slot is the cell center rather than a peering bit
    pub const fn is_center_bit(&self) -> bool {
        self.bit == 0
    }

    /// Required terrain id
    pub const fn terrain(&self) -> i32 {
        self.terrain
    }

    /// Replace the required terrain id
    pub const fn set_terrain(&mut self, terrain: i32) {
        self.terrain = terrain;
    }

    /// Weight of the constraint when scoring candidate patterns
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Constraint with a different priority
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Every cell overlapping the slot, with the bit it sees the slot as
    ///
    /// A side bit is shared by two cells, a corner bit by three or four
    /// depending on the shape. Center slots overlap nothing but their own
    /// cell.
    pub fn overlapping_cells(&self, geometry: &GridGeometry) -> Vec<([i32; 2], CellNeighbor)> {
        debug_assert!(
            !self.is_center_bit(),
            "center constraints have no overlapping bits"
        );
        if self.is_center_bit() {
            return Vec::new();
        }

        let base = self.base;
        let at = |direction: CellNeighbor| shifted(geometry, base, direction);

        match geometry.shape {
            CellShape::Square => match self.bit {
                1 => vec![
                    (base, CellNeighbor::RightSide),
                    (at(CellNeighbor::RightSide), CellNeighbor::LeftSide),
                ],
                2 => vec![
                    (base, CellNeighbor::BottomRightCorner),
                    (at(CellNeighbor::RightSide), CellNeighbor::BottomLeftCorner),
                    (
                        at(CellNeighbor::BottomRightCorner),
                        CellNeighbor::TopLeftCorner,
                    ),
                    (at(CellNeighbor::BottomSide), CellNeighbor::TopRightCorner),
                ],
                3 => vec![
                    (base, CellNeighbor::BottomSide),
                    (at(CellNeighbor::BottomSide), CellNeighbor::TopSide),
                ],
                _ => Vec::new(),
            },
            CellShape::Isometric => match self.bit {
                1 => vec![
                    (base, CellNeighbor::BottomRightSide),
                    (at(CellNeighbor::BottomRightSide), CellNeighbor::TopLeftSide),
                ],
                2 => vec![
                    (base, CellNeighbor::BottomCorner),
                    (at(CellNeighbor::BottomRightSide), CellNeighbor::LeftCorner),
                    (at(CellNeighbor::BottomCorner), CellNeighbor::TopCorner),
                    (at(CellNeighbor::BottomLeftSide), CellNeighbor::RightCorner),
                ],
                3 => vec![
                    (base, CellNeighbor::BottomLeftSide),
                    (at(CellNeighbor::BottomLeftSide), CellNeighbor::TopRightSide),
                ],
                _ => Vec::new(),
            },
            CellShape::HalfOffsetSquare | CellShape::Hexagon => match geometry.offset_axis {
                OffsetAxis::Horizontal => match self.bit {
                    1 => vec![
                        (base, CellNeighbor::RightSide),
                        (at(CellNeighbor::RightSide), CellNeighbor::LeftSide),
                    ],
                    2 => vec![
                        (base, CellNeighbor::BottomRightCorner),
                        (at(CellNeighbor::RightSide), CellNeighbor::BottomLeftCorner),
                        (at(CellNeighbor::BottomRightSide), CellNeighbor::TopCorner),
                    ],
                    3 => vec![
                        (base, CellNeighbor::BottomRightSide),
                        (at(CellNeighbor::BottomRightSide), CellNeighbor::TopLeftSide),
                    ],
                    4 => vec![
                        (base, CellNeighbor::BottomCorner),
                        (
                            at(CellNeighbor::BottomRightSide),
                            CellNeighbor::TopLeftCorner,
                        ),
                        (
                            at(CellNeighbor::BottomLeftSide),
                            CellNeighbor::TopRightCorner,
                        ),
                    ],
                    5 => vec![
                        (base, CellNeighbor::BottomLeftSide),
                        (at(CellNeighbor::BottomLeftSide), CellNeighbor::TopRightSide),
                    ],
                    _ => Vec::new(),
                },
                OffsetAxis::Vertical => match self.bit {
                    1 => vec![
                        (base, CellNeighbor::RightCorner),
                        (at(CellNeighbor::TopRightSide), CellNeighbor::BottomLeftCorner),
                        (
                            at(CellNeighbor::BottomRightSide),
                            CellNeighbor::TopLeftCorner,
                        ),
                    ],
                    2 => vec![
                        (base, CellNeighbor::BottomRightSide),
                        (at(CellNeighbor::BottomRightSide), CellNeighbor::TopLeftSide),
                    ],
                    3 => vec![
                        (base, CellNeighbor::BottomRightCorner),
                        (at(CellNeighbor::BottomRightSide), CellNeighbor::LeftCorner),
                        (at(CellNeighbor::BottomSide), CellNeighbor::TopLeftCorner),
                    ],
                    4 => vec![
                        (base, CellNeighbor::BottomSide),
                        (at(CellNeighbor::BottomSide), CellNeighbor::TopSide),
                    ],
                    5 => vec![
                        (base, CellNeighbor::BottomLeftSide),
                        (at(CellNeighbor::BottomLeftSide), CellNeighbor::TopRightSide),
                    ],
                    _ => Vec::new(),
                },
            },
        }
    }
}

// Directions used inside the tables are valid for their shape by
// construction, so a failed lookup can only mean a table bug.
fn shifted(geometry: &GridGeometry, position: [i32; 2], direction: CellNeighbor) -> [i32; 2] {
    let neighbor = geometry.neighbor(position, direction);
    debug_assert!(neighbor.is_ok(), "table direction invalid for shape");
    neighbor.unwrap_or(position)
}

/// Canonical (bit, base cell) for a (cell, peering bit) pair
fn canonicalize(
    geometry: &GridGeometry,
    position: [i32; 2],
    bit: CellNeighbor,
) -> Option<(u8, [i32; 2])> {
    let at = |direction: CellNeighbor| shifted(geometry, position, direction);

    match geometry.shape {
        CellShape::Square => match bit {
            CellNeighbor::RightSide => Some((1, position)),
            CellNeighbor::BottomRightCorner => Some((2, position)),
            CellNeighbor::BottomSide => Some((3, position)),
            CellNeighbor::BottomLeftCorner => Some((2, at(CellNeighbor::LeftSide))),
            CellNeighbor::LeftSide => Some((1, at(CellNeighbor::LeftSide))),
            CellNeighbor::TopLeftCorner => Some((2, at(CellNeighbor::TopLeftCorner))),
            CellNeighbor::TopSide => Some((3, at(CellNeighbor::TopSide))),
            CellNeighbor::TopRightCorner => Some((2, at(CellNeighbor::TopSide))),
            _ => None,
        },
        CellShape::Isometric => match bit {
            CellNeighbor::RightCorner => Some((2, at(CellNeighbor::TopRightSide))),
            CellNeighbor::BottomRightSide => Some((1, position)),
            CellNeighbor::BottomCorner => Some((2, position)),
            CellNeighbor::BottomLeftSide => Some((3, position)),
            CellNeighbor::LeftCorner => Some((2, at(CellNeighbor::TopLeftSide))),
            CellNeighbor::TopLeftSide => Some((1, at(CellNeighbor::TopLeftSide))),
            CellNeighbor::TopCorner => Some((2, at(CellNeighbor::TopCorner))),
            CellNeighbor::TopRightSide => Some((3, at(CellNeighbor::TopRightSide))),
            _ => None,
        },
        CellShape::HalfOffsetSquare | CellShape::Hexagon => match geometry.offset_axis {
            OffsetAxis::Horizontal => match bit {
                CellNeighbor::RightSide => Some((1, position)),
                CellNeighbor::BottomRightCorner => Some((2, position)),
                CellNeighbor::BottomRightSide => Some((3, position)),
                CellNeighbor::BottomCorner => Some((4, position)),
                CellNeighbor::BottomLeftSide => Some((5, position)),
                CellNeighbor::BottomLeftCorner => Some((2, at(CellNeighbor::LeftSide))),
                CellNeighbor::LeftSide => Some((1, at(CellNeighbor::LeftSide))),
                CellNeighbor::TopLeftCorner => Some((4, at(CellNeighbor::TopLeftSide))),
                CellNeighbor::TopLeftSide => Some((3, at(CellNeighbor::TopLeftSide))),
                CellNeighbor::TopCorner => Some((2, at(CellNeighbor::TopLeftSide))),
                CellNeighbor::TopRightSide => Some((5, at(CellNeighbor::TopRightSide))),
                CellNeighbor::TopRightCorner => Some((4, at(CellNeighbor::TopRightSide))),
                _ => None,
            },
            OffsetAxis::Vertical => match bit {
                CellNeighbor::RightCorner => Some((1, position)),
                CellNeighbor::BottomRightSide => Some((2, position)),
                CellNeighbor::BottomRightCorner => Some((3, position)),
                CellNeighbor::BottomSide => Some((4, position)),
                CellNeighbor::BottomLeftCorner => Some((1, at(CellNeighbor::BottomLeftSide))),
                CellNeighbor::BottomLeftSide => Some((5, position)),
                CellNeighbor::LeftCorner => Some((3, at(CellNeighbor::TopLeftSide))),
                CellNeighbor::TopLeftSide => Some((2, at(CellNeighbor::TopLeftSide))),
                CellNeighbor::TopLeftCorner => Some((1, at(CellNeighbor::TopLeftSide))),
                CellNeighbor::TopSide => Some((4, at(CellNeighbor::TopSide))),
                CellNeighbor::TopRightCorner => Some((3, at(CellNeighbor::TopSide))),
                CellNeighbor::TopRightSide => Some((5, at(CellNeighbor::TopRightSide))),
                _ => None,
            },
        },
    }
}

/// Ordered set of constraints keyed by their canonical slot
///
/// A plain insertion keeps an existing entry unless the incoming constraint
/// carries a strictly higher priority, so user intent (priority 10) is never
/// overwritten by content-derived inference (priority 1). The solver's
/// feedback step uses [`ConstraintSet::replace`] to overwrite
/// unconditionally.
#[derive(Clone, Debug, Default)]
pub struct ConstraintSet {
    entries: BTreeMap<ConstraintKey, (i32, i32)>,
}

impl ConstraintSet {
    /// Empty set
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert, keeping an existing entry of equal or higher priority
    pub fn insert(&mut self, constraint: TerrainConstraint) {
        self.entries
            .entry(constraint.key())
            .and_modify(|(terrain, priority)| {
                if constraint.priority() > *priority {
                    *terrain = constraint.terrain();
                    *priority = constraint.priority();
                }
            })
            .or_insert((constraint.terrain(), constraint.priority()));
    }

    /// Insert, overwriting any existing entry for the slot
    pub fn replace(&mut self, constraint: TerrainConstraint) {
        self.entries
            .insert(constraint.key(), (constraint.terrain(), constraint.priority()));
    }

    /// Required (terrain, priority) at a slot, if constrained
    pub fn find(&self, key: ConstraintKey) -> Option<(i32, i32)> {
        self.entries.get(&key).copied()
    }

    /// Number of constrained slots
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no slot is constrained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate constraints in canonical key order
    pub fn iter(&self) -> impl Iterator<Item = TerrainConstraint> + '_ {
        self.entries
            .iter()
            .map(|(&(base, bit), &(terrain, priority))| TerrainConstraint {
                base,
                bit,
                terrain,
                priority,
            })
    }
}
