//! Layered 2D grid map with quadrant-batched incremental rebuilds
//!
//! The crate stores per-cell tile references across ordered layers, groups
//! cells into fixed-size spatial buckets ("quadrants"), and rebuilds only the
//! buckets an edit touched while keeping injected rendering, physics and
//! navigation collaborators in sync. On top of the store it ships the
//! authoring operations a map editor needs: terrain auto-tiling, pattern
//! stamping, and coordinate transforms across square, isometric and
//! half-offset grid geometries.

#![forbid(unsafe_code)]

/// Narrow interface to the external cell-set resource
pub mod catalog;
/// Coordinate projections, neighbor algebra and layout conversions
pub mod geometry;
/// Input/output operations, persistence formats and error handling
pub mod io;
/// Cell stores, layers, patterns and the map facade
pub mod map;
/// Integer and planar helpers shared by the coordinate math
pub mod math;
/// Spatial bucketing and the incremental-rebuild engine
pub mod quadrant;
/// Terrain constraint derivation and best-pattern selection
pub mod terrain;

pub use io::error::{MapError, Result};
pub use map::GridMap;
