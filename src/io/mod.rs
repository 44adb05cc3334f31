//! Input/output operations, persistence formats and error handling
//!
//! This module contains the io-related functionality including:
//! - The crate-wide error type and result alias
//! - The binary cell-buffer codec with legacy format upgrades
//! - The map-document container, CLI, progress display and PNG snapshots

/// Binary cell-buffer codec and legacy format upgrades
pub mod buffer;
/// Command-line interface over map documents
pub mod cli;
/// Runtime constants and configurable defaults
pub mod configuration;
/// Map-document container serializing the full property surface
pub mod document;
/// Error types for map operations
pub mod error;
/// Progress display for batch CLI operations
pub mod progress;
/// Occupancy-snapshot PNG export
pub mod visualization;
