//! Cell stores, layers, patterns and the map facade
//!
//! This module contains the map content functionality including:
//! - Cell references and cell-space rectangles
//! - Layer settings and per-layer cell storage
//! - Reusable cell patterns for stamping
//! - The [`GridMap`] facade tying storage, geometry and buckets together

/// Cell references and cell-space rectangles
pub mod cell;
/// Layer settings and per-layer cell storage
pub mod layer;
/// The public map facade
pub mod map;
/// Reusable cell patterns for stamping
pub mod pattern;

pub use cell::{CellRect, CellRef};
pub use layer::LayerSettings;
pub use map::GridMap;
pub use pattern::MapPattern;
