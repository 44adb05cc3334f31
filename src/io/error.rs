//! Error types for map operations

use std::fmt;
use std::path::PathBuf;

use crate::geometry::neighbor::CellNeighbor;

/// Main error type for all map operations
#[derive(Debug)]
pub enum MapError {
    /// Layer index outside the layer array
    IndexOutOfRange {
        /// The offending layer index
        layer: usize,
        /// Number of layers on the map
        layer_count: usize,
    },

    /// Neighbor direction not meaningful for the current grid shape
    InvalidNeighbor {
        /// The rejected direction
        direction: CellNeighbor,
    },

    /// Terrain set index outside the catalog's terrain sets
    InvalidTerrainSet {
        /// The offending terrain set index
        terrain_set: usize,
        /// Number of terrain sets in the catalog
        terrain_set_count: usize,
    },

    /// Two consecutive path cells are not neighbors
    BrokenPath {
        /// Cell the step started from
        from: [i32; 2],
        /// Cell that is not adjacent to `from`
        to: [i32; 2],
    },

    /// Operation requires an attached cell catalog
    MissingCatalog {
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Cell buffer length is not a multiple of the record width
    ///
    /// The import is rejected wholesale; no cell of a corrupt buffer is
    /// applied.
    CorruptData {
        /// Buffer length in bytes
        length: usize,
        /// Expected record width in bytes
        record_bytes: usize,
    },

    /// Malformed map-document container
    Document {
        /// What was wrong with the document
        reason: String,
    },

    /// File system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Failed to save a snapshot image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfRange { layer, layer_count } => {
                write!(f, "Layer index {layer} is out of bounds (layers: {layer_count})")
            }
            Self::InvalidNeighbor { direction } => {
                write!(f, "Neighbor direction {direction:?} is not valid for this grid shape")
            }
            Self::InvalidTerrainSet {
                terrain_set,
                terrain_set_count,
            } => {
                write!(
                    f,
                    "Terrain set {terrain_set} is out of bounds (terrain sets: {terrain_set_count})"
                )
            }
            Self::BrokenPath { from, to } => {
                write!(
                    f,
                    "Invalid terrain path: ({}, {}) is not a neighbor of ({}, {})",
                    to[0], to[1], from[0], from[1]
                )
            }
            Self::MissingCatalog { operation } => {
                write!(f, "Cannot {operation} without a cell catalog attached")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::CorruptData {
                length,
                record_bytes,
            } => {
                write!(
                    f,
                    "Corrupted cell buffer: {length} bytes is not a multiple of the {record_bytes}-byte record"
                )
            }
            Self::Document { reason } => {
                write!(f, "Malformed map document: {reason}")
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FileSystem { source, .. } => Some(source),
            Self::ImageExport { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Convenience type alias for map results
pub type Result<T> = std::result::Result<T, MapError>;

/// Create a file system error carrying its path and operation
pub fn file_error(path: &std::path::Path, operation: &'static str, source: std::io::Error) -> MapError {
    MapError::FileSystem {
        path: path.to_path_buf(),
        operation,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::MapError;

    #[test]
    fn messages_carry_the_failing_values() {
        let err = MapError::IndexOutOfRange {
            layer: 7,
            layer_count: 2,
        };
        let message = err.to_string();
        assert!(message.contains('7'));
        assert!(message.contains('2'));

        let err = MapError::CorruptData {
            length: 13,
            record_bytes: 12,
        };
        assert!(err.to_string().contains("13"));
    }
}
