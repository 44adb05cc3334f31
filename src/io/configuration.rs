//! Runtime constants and configurable defaults

// Bucketing
/// Default quadrant size, in cells per side
pub const DEFAULT_QUADRANT_SIZE: i32 = 16;

// Terrain solver constraint priorities
/// Priority of constraints asserted by the paint action itself
pub const PAINT_PRIORITY: i32 = 10;
/// Priority of constraints fed back from patterns chosen earlier in a fill
pub const PROPAGATED_PRIORITY: i32 = 5;
/// Priority of constraints inferred from existing map content
pub const INFERRED_PRIORITY: i32 = 1;

// Cell buffer formats
/// Record width of the current buffer format, in bytes
pub const CELL_RECORD_BYTES: usize = 12;
/// Record width of the oldest legacy format, in bytes
pub const LEGACY_V1_RECORD_BYTES: usize = 8;
/// Record width of the second legacy format, in bytes
pub const LEGACY_V2_RECORD_BYTES: usize = 12;
/// Format tag written by every export
pub const CURRENT_FORMAT_VERSION: u32 = 3;

// Map documents
/// Magic bytes opening a map-document file
pub const DOCUMENT_MAGIC: [u8; 4] = *b"GMAP";

// CLI defaults
/// Fixed seed for reproducible demo-map generation
pub const DEFAULT_SEED: u64 = 42;
/// Default side length of a generated demo map, in cells
pub const DEFAULT_GENERATE_SIZE: usize = 64;
/// Smoothing passes applied to the generated height field
pub const GENERATE_SMOOTHING_PASSES: usize = 2;

// Snapshot rendering
/// Pixels per cell in occupancy snapshots
pub const SNAPSHOT_CELL_PIXELS: u32 = 4;
/// Color cycle for sources in occupancy snapshots
pub const SOURCE_PALETTE: [[u8; 4]; 8] = [
    [87, 166, 74, 255],
    [77, 137, 196, 255],
    [201, 146, 64, 255],
    [168, 84, 158, 255],
    [196, 88, 77, 255],
    [84, 178, 166, 255],
    [178, 168, 74, 255],
    [129, 129, 129, 255],
];
