//! Grid geometry configuration
//!
//! A [`GridGeometry`] value is immutable per map instance and parameterizes
//! every coordinate function in this crate. The half-offset shapes (square,
//! hexagon, isometric) share one projection family and differ only in how
//! much consecutive rows or columns visually overlap.

/// Shape of an individual cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellShape {
    /// Axis-aligned squares on a regular lattice
    Square,
    /// Diamonds with a 0.5 row/column overlap
    Isometric,
    /// Half-offset squares with no overlap
    HalfOffsetSquare,
    /// Hexagons with a 0.75 row/column overlap
    Hexagon,
}

impl CellShape {
    /// Whether alternating rows or columns are shifted by half a cell
    pub const fn is_half_offset(self) -> bool {
        !matches!(self, Self::Square)
    }

    /// How much of a cell the next row or column covers along the offset axis
    ///
    /// Purely geometric: 1.0 for half-offset squares, 0.75 for hexagons and
    /// 0.5 for isometric diamonds.
    pub const fn overlap_ratio(self) -> f64 {
        match self {
            Self::Square | Self::HalfOffsetSquare => 1.0,
            Self::Hexagon => 0.75,
            Self::Isometric => 0.5,
        }
    }
}

/// Axis along which alternating rows or columns are offset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OffsetAxis {
    /// Odd rows shift along x
    Horizontal,
    /// Odd columns shift along y
    Vertical,
}

/// Coordinate-layout convention for offset grids
///
/// All six layouts address the same physical cells; they only disagree on
/// which integer pair names which cell. [`crate::geometry::layout`] converts
/// between them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GridLayout {
    /// Rows stack vertically, odd rows shifted right
    Stacked,
    /// Rows stack vertically, even rows shifted right
    StackedOffset,
    /// Coordinates follow the staircase running right
    StairsRight,
    /// Coordinates follow the staircase running down
    StairsDown,
    /// Diamond-shaped axes running right
    DiamondRight,
    /// Diamond-shaped axes running down
    DiamondDown,
}

/// Immutable geometry parameters for one map
///
/// Owned by the external cell-set resource; every coordinate function is a
/// pure function of this configuration plus the coordinates themselves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    /// Shape of the individual cells
    pub shape: CellShape,
    /// Axis along which alternating rows or columns are offset
    pub offset_axis: OffsetAxis,
    /// Coordinate-layout convention
    pub layout: GridLayout,
    /// Cell extents in world units
    pub cell_size: [f64; 2],
}

impl GridGeometry {
    /// Plain square geometry with the given cell size
    pub const fn square(cell_size: [f64; 2]) -> Self {
        Self {
            shape: CellShape::Square,
            offset_axis: OffsetAxis::Horizontal,
            layout: GridLayout::Stacked,
            cell_size,
        }
    }

    /// Overlap ratio applied along the offset axis
    pub const fn overlap_ratio(&self) -> f64 {
        self.shape.overlap_ratio()
    }
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self::square([16.0, 16.0])
    }
}
