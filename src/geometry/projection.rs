//! Projection between cell coordinates and world-space positions
//!
//! The forward projection applies a layout-dependent skew, an overlap-ratio
//! scale along the offset axis, and a translation to the cell center. The
//! inverse reverses the scales, then runs a "smart floor": the candidate cell
//! is found by flooring, and two cross-product sign tests against the
//! diagonals bounding the cell's top (or left) edge decide whether the point
//! actually belongs to a neighboring cell.

use crate::geometry::config::{GridGeometry, GridLayout, OffsetAxis};
use crate::math::integer::posmod;
use crate::math::plane::{cross, sub};

// Nudges exact cell boundaries into the cell on the floor for square grids.
const FP_ADJUST: f64 = 0.000_05;

impl GridGeometry {
    /// World-space center of a cell
    pub fn cell_to_world(&self, coords: [i32; 2]) -> [f64; 2] {
        let mut x = f64::from(coords[0]);
        let mut y = f64::from(coords[1]);

        if self.shape.is_half_offset() {
            match self.offset_axis {
                OffsetAxis::Horizontal => match self.layout {
                    GridLayout::Stacked => {
                        if posmod(coords[1], 2) != 0 {
                            x += 0.5;
                        }
                    }
                    GridLayout::StackedOffset => {
                        if posmod(coords[1], 2) != 1 {
                            x += 0.5;
                        }
                    }
                    GridLayout::StairsRight => {
                        x += y / 2.0;
                    }
                    GridLayout::StairsDown => {
                        (x, y) = (x / 2.0, y * 2.0 + x);
                    }
                    GridLayout::DiamondRight => {
                        (x, y) = ((x + y) / 2.0, y - x);
                    }
                    GridLayout::DiamondDown => {
                        (x, y) = ((x - y) / 2.0, y + x);
                    }
                },
                OffsetAxis::Vertical => match self.layout {
                    GridLayout::Stacked => {
                        if posmod(coords[0], 2) != 0 {
                            y += 0.5;
                        }
                    }
                    GridLayout::StackedOffset => {
                        if posmod(coords[0], 2) != 1 {
                            y += 0.5;
                        }
                    }
                    GridLayout::StairsRight => {
                        (x, y) = (x * 2.0 + y, y / 2.0);
                    }
                    GridLayout::StairsDown => {
                        y += x / 2.0;
                    }
                    GridLayout::DiamondRight => {
                        (x, y) = (x + y, (y - x) / 2.0);
                    }
                    GridLayout::DiamondDown => {
                        (x, y) = (x - y, (y + x) / 2.0);
                    }
                },
            }
        }

        match self.offset_axis {
            OffsetAxis::Horizontal => y *= self.overlap_ratio(),
            OffsetAxis::Vertical => x *= self.overlap_ratio(),
        }

        [
            (x + 0.5) * self.cell_size[0],
            (y + 0.5) * self.cell_size[1],
        ]
    }

    /// Cell containing a world-space position
    ///
    /// Exact inverse of [`Self::cell_to_world`]: cell centers round-trip for
    /// every integer coordinate, and points strictly inside a cell's polygon
    /// map back to that cell.
    pub fn world_to_cell(&self, position: [f64; 2]) -> [i32; 2] {
        let ratio = self.overlap_ratio();
        let mut x = position[0] / self.cell_size[0];
        let mut y = position[1] / self.cell_size[1];

        match self.offset_axis {
            OffsetAxis::Horizontal => y /= ratio,
            OffsetAxis::Vertical => x /= ratio,
        }

        if !self.shape.is_half_offset() {
            return [
                (x + FP_ADJUST).floor() as i32,
                (y + FP_ADJUST).floor() as i32,
            ];
        }

        match self.offset_axis {
            OffsetAxis::Horizontal => self.smart_floor_horizontal([x, y], ratio),
            OffsetAxis::Vertical => self.smart_floor_vertical([x, y], ratio),
        }
    }

    fn smart_floor_horizontal(&self, raw: [f64; 2], ratio: f64) -> [i32; 2] {
        let offset_row = posmod(raw[1].floor() as i64, 2) == 1;
        let floored = if offset_row != matches!(self.layout, GridLayout::StackedOffset) {
            [(raw[0] + 0.5).floor() - 0.5, raw[1].floor()]
        } else {
            [raw[0].floor(), raw[1].floor()]
        };

        // Against the diagonals bounding the cell's top edge.
        let in_cell = sub(raw, floored);
        let in_top_left =
            cross(sub(in_cell, [0.5, 0.0]), [-0.5, 1.0 / ratio - 1.0]) <= 0.0;
        let in_top_right =
            cross(sub(in_cell, [0.5, 0.0]), [0.5, 1.0 / ratio - 1.0]) > 0.0;

        match self.layout {
            GridLayout::Stacked => {
                let base = [floored[0].floor() as i32, floored[1] as i32];
                let odd = posmod(base[1], 2) != 0;
                if in_top_left {
                    [base[0] + if odd { 0 } else { -1 }, base[1] - 1]
                } else if in_top_right {
                    [base[0] + i32::from(odd), base[1] - 1]
                } else {
                    base
                }
            }
            GridLayout::StackedOffset => {
                let base = [floored[0].floor() as i32, floored[1] as i32];
                let odd = posmod(base[1], 2) != 0;
                if in_top_left {
                    [base[0] - i32::from(odd), base[1] - 1]
                } else if in_top_right {
                    [base[0] + if odd { 0 } else { 1 }, base[1] - 1]
                } else {
                    base
                }
            }
            GridLayout::StairsRight => {
                let base = [
                    (floored[0] - floored[1] / 2.0).floor() as i32,
                    floored[1].floor() as i32,
                ];
                if in_top_left {
                    [base[0], base[1] - 1]
                } else if in_top_right {
                    [base[0] + 1, base[1] - 1]
                } else {
                    base
                }
            }
            GridLayout::StairsDown => {
                let base = [
                    (floored[0] * 2.0).floor() as i32,
                    (floored[1] / 2.0 - floored[0]).floor() as i32,
                ];
                if in_top_left {
                    [base[0] - 1, base[1]]
                } else if in_top_right {
                    [base[0] + 1, base[1] - 1]
                } else {
                    base
                }
            }
            GridLayout::DiamondRight => {
                let base = [
                    (floored[0] - floored[1] / 2.0).floor() as i32,
                    (floored[1] / 2.0 + floored[0]).floor() as i32,
                ];
                if in_top_left {
                    [base[0], base[1] - 1]
                } else if in_top_right {
                    [base[0] + 1, base[1]]
                } else {
                    base
                }
            }
            GridLayout::DiamondDown => {
                let base = [
                    (floored[0] + floored[1] / 2.0).floor() as i32,
                    (floored[1] / 2.0 - floored[0]).floor() as i32,
                ];
                if in_top_left {
                    [base[0] - 1, base[1]]
                } else if in_top_right {
                    [base[0], base[1] - 1]
                } else {
                    base
                }
            }
        }
    }

    fn smart_floor_vertical(&self, raw: [f64; 2], ratio: f64) -> [i32; 2] {
        let offset_column = posmod(raw[0].floor() as i64, 2) == 1;
        let floored = if offset_column != matches!(self.layout, GridLayout::StackedOffset) {
            [raw[0].floor(), (raw[1] + 0.5).floor() - 0.5]
        } else {
            [raw[0].floor(), raw[1].floor()]
        };

        // Against the diagonals bounding the cell's left edge.
        let in_cell = sub(raw, floored);
        let in_top_left =
            cross(sub(in_cell, [0.0, 0.5]), [1.0 / ratio - 1.0, -0.5]) > 0.0;
        let in_bottom_left =
            cross(sub(in_cell, [0.0, 0.5]), [1.0 / ratio - 1.0, 0.5]) <= 0.0;

        match self.layout {
            GridLayout::Stacked => {
                let base = [floored[0] as i32, floored[1].floor() as i32];
                let odd = posmod(base[0], 2) != 0;
                if in_top_left {
                    [base[0] - 1, base[1] + if odd { 0 } else { -1 }]
                } else if in_bottom_left {
                    [base[0] - 1, base[1] + i32::from(odd)]
                } else {
                    base
                }
            }
            GridLayout::StackedOffset => {
                let base = [floored[0] as i32, floored[1].floor() as i32];
                let odd = posmod(base[0], 2) != 0;
                if in_top_left {
                    [base[0] - 1, base[1] - i32::from(odd)]
                } else if in_bottom_left {
                    [base[0] - 1, base[1] + if odd { 0 } else { 1 }]
                } else {
                    base
                }
            }
            GridLayout::StairsRight => {
                let base = [
                    (floored[0] / 2.0 - floored[1]).floor() as i32,
                    (floored[1] * 2.0).floor() as i32,
                ];
                if in_top_left {
                    [base[0], base[1] - 1]
                } else if in_bottom_left {
                    [base[0] - 1, base[1] + 1]
                } else {
                    base
                }
            }
            GridLayout::StairsDown => {
                let base = [
                    floored[0].floor() as i32,
                    (floored[1] - floored[0] / 2.0).floor() as i32,
                ];
                if in_top_left {
                    [base[0] - 1, base[1]]
                } else if in_bottom_left {
                    [base[0] - 1, base[1] + 1]
                } else {
                    base
                }
            }
            GridLayout::DiamondRight => {
                let base = [
                    (floored[0] / 2.0 - floored[1]).floor() as i32,
                    (floored[1] + floored[0] / 2.0).floor() as i32,
                ];
                if in_top_left {
                    [base[0], base[1] - 1]
                } else if in_bottom_left {
                    [base[0] - 1, base[1]]
                } else {
                    base
                }
            }
            GridLayout::DiamondDown => {
                let base = [
                    (floored[0] / 2.0 + floored[1]).floor() as i32,
                    (floored[1] - floored[0] / 2.0).floor() as i32,
                ];
                if in_top_left {
                    [base[0] - 1, base[1]]
                } else if in_bottom_left {
                    [base[0], base[1] + 1]
                } else {
                    base
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::geometry::config::{CellShape, GridGeometry, GridLayout, OffsetAxis};

    #[test]
    fn square_projection_scales_to_cell_centers() {
        let geometry = GridGeometry::square([16.0, 16.0]);
        assert_eq!(geometry.cell_to_world([0, 0]), [8.0, 8.0]);
        assert_eq!(geometry.cell_to_world([2, -1]), [40.0, -8.0]);
        assert_eq!(geometry.world_to_cell([8.0, 8.0]), [0, 0]);
        assert_eq!(geometry.world_to_cell([40.0, -8.0]), [2, -1]);
    }

    #[test]
    fn isometric_neighbors_offset_along_the_overlap_axis() {
        let geometry = GridGeometry {
            shape: CellShape::Isometric,
            offset_axis: OffsetAxis::Horizontal,
            layout: GridLayout::Stacked,
            cell_size: [64.0, 32.0],
        };
        let origin = geometry.cell_to_world([0, 0]);
        let right = geometry.cell_to_world([1, 0]);
        let below = geometry.cell_to_world([0, 1]);
        // One step in x stays on the same row; one step in y moves half a
        // cell down due to the 0.5 isometric overlap.
        assert!((right[1] - origin[1]).abs() < f64::EPSILON);
        assert!((below[1] - origin[1] - 0.5 * 32.0).abs() < f64::EPSILON);
    }
}
