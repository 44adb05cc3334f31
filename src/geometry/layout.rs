//! Conversion of cell coordinates between layout conventions
//!
//! All six layouts name the same physical cells. Conversion normalizes the
//! coordinate to the stacked layout, then re-derives the target layout. Used
//! for cross-format compatibility, not on any hot path.

use crate::geometry::config::{GridLayout, OffsetAxis};

/// Convert a coordinate authored under one layout into another
///
/// The vertical offset axis is handled by transposing in and out, so the
/// arithmetic below only deals with the horizontal conventions. Integer
/// division here intentionally truncates toward zero; the negative halves of
/// each axis carry explicit corrections.
pub fn transform_layout(
    coords: [i32; 2],
    offset_axis: OffsetAxis,
    from: GridLayout,
    to: GridLayout,
) -> [i32; 2] {
    let mut x = coords[0];
    let mut y = coords[1];
    if matches!(offset_axis, OffsetAxis::Vertical) {
        (x, y) = (y, x);
    }

    // Normalize to the stacked layout.
    match from {
        GridLayout::Stacked => {}
        GridLayout::StackedOffset => {
            if y % 2 != 0 {
                x -= 1;
            }
        }
        GridLayout::StairsRight | GridLayout::StairsDown => {
            let along_rows = matches!(from, GridLayout::StairsRight)
                ^ matches!(offset_axis, OffsetAxis::Vertical);
            if along_rows {
                x = if y < 0 && y % 2 != 0 {
                    x + y / 2 - 1
                } else {
                    x + y / 2
                };
            } else {
                (x, y) = if x < 0 && x % 2 != 0 {
                    (x / 2 - 1, x + y * 2)
                } else {
                    (x / 2, x + y * 2)
                };
            }
        }
        GridLayout::DiamondRight | GridLayout::DiamondDown => {
            let along_rows = matches!(from, GridLayout::DiamondRight)
                ^ matches!(offset_axis, OffsetAxis::Vertical);
            if along_rows {
                (x, y) = if (x + y) < 0 && (x - y) % 2 != 0 {
                    ((x + y) / 2 - 1, y - x)
                } else {
                    ((x + y) / 2, y - x)
                };
            } else {
                (x, y) = if (x - y) < 0 && (x + y) % 2 != 0 {
                    ((x - y) / 2 - 1, x + y)
                } else {
                    ((x - y) / 2, x + y)
                };
            }
        }
    }

    // Re-derive the target layout.
    match to {
        GridLayout::Stacked => {}
        GridLayout::StackedOffset => {
            if y % 2 != 0 {
                x += 1;
            }
        }
        GridLayout::StairsRight | GridLayout::StairsDown => {
            let along_rows = matches!(to, GridLayout::StairsRight)
                ^ matches!(offset_axis, OffsetAxis::Vertical);
            if along_rows {
                x = if y < 0 && y % 2 != 0 {
                    x - y / 2 + 1
                } else {
                    x - y / 2
                };
            } else if y % 2 != 0 {
                (x, y) = if y < 0 {
                    (2 * x + 1, -x + y / 2 - 1)
                } else {
                    (2 * x + 1, -x + y / 2)
                };
            } else {
                (x, y) = (2 * x, -x + y / 2);
            }
        }
        GridLayout::DiamondRight | GridLayout::DiamondDown => {
            let along_rows = matches!(to, GridLayout::DiamondRight)
                ^ matches!(offset_axis, OffsetAxis::Vertical);
            if along_rows {
                if y % 2 != 0 {
                    (x, y) = if y > 0 {
                        (x - y / 2, x + y / 2 + 1)
                    } else {
                        (x - y / 2 + 1, x + y / 2)
                    };
                } else {
                    (x, y) = (x - y / 2, x + y / 2);
                }
            } else if y % 2 != 0 {
                (x, y) = if y < 0 {
                    (x + y / 2, -x + y / 2 - 1)
                } else {
                    (x + y / 2 + 1, -x + y / 2)
                };
            } else {
                (x, y) = (x + y / 2, -x + y / 2);
            }
        }
    }

    if matches!(offset_axis, OffsetAxis::Vertical) {
        (x, y) = (y, x);
    }

    [x, y]
}

#[cfg(test)]
mod tests {
    use super::transform_layout;
    use crate::geometry::config::{GridLayout, OffsetAxis};

    const LAYOUTS: [GridLayout; 6] = [
        GridLayout::Stacked,
        GridLayout::StackedOffset,
        GridLayout::StairsRight,
        GridLayout::StairsDown,
        GridLayout::DiamondRight,
        GridLayout::DiamondDown,
    ];

    #[test]
    fn identity_for_equal_layouts() {
        for layout in LAYOUTS {
            for axis in [OffsetAxis::Horizontal, OffsetAxis::Vertical] {
                assert_eq!(transform_layout([3, -5], axis, layout, layout), [3, -5]);
            }
        }
    }

    #[test]
    fn stacked_offset_shifts_odd_rows() {
        let axis = OffsetAxis::Horizontal;
        assert_eq!(
            transform_layout([2, 1], axis, GridLayout::Stacked, GridLayout::StackedOffset),
            [3, 1]
        );
        assert_eq!(
            transform_layout([2, 2], axis, GridLayout::Stacked, GridLayout::StackedOffset),
            [2, 2]
        );
    }
}
