//! Terrain auto-tiling: peering bits, constraints and the pattern solver
//!
//! This module contains the terrain functionality including:
//! - Terrain patterns assigning terrain ids to a cell's center and edges
//! - Canonicalized constraints shared between overlapping cells
//! - The fill solver scoring candidate patterns against a constraint set

/// Canonical terrain constraints and the priority-aware constraint set
pub mod constraint;
/// Best-pattern selection for connect, path and pattern fills
pub mod solver;
/// Terrain patterns, terrain modes and valid peering bits per shape
pub mod pattern;

pub use constraint::{ConstraintSet, TerrainConstraint};
pub use pattern::{TerrainMode, TerrainPattern};
