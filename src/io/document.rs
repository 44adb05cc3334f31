//! Map-document container serializing the full property surface
//!
//! A document carries the map-level format tag plus, per layer, the complete
//! settings block and the raw cell buffer. It is the persistence surface the
//! CLI works with; an engine would bind the same fields to its own property
//! system instead.

use std::fs;
use std::path::Path;

use crate::io::buffer::{self, BufferFormat};
use crate::io::configuration::{CURRENT_FORMAT_VERSION, DOCUMENT_MAGIC};
use crate::io::error::{MapError, Result, file_error};
use crate::map::cell::CellRef;
use crate::map::layer::LayerSettings;
use crate::map::map::GridMap;

/// Settings and cells of one serialized layer
#[derive(Clone, Debug, Default)]
pub struct LayerRecord {
    /// The layer's full settings block
    pub settings: LayerSettings,
    /// Occupied cells, sorted by coordinate
    pub cells: Vec<([i32; 2], CellRef)>,
}

/// Serializable snapshot of a map's persistent state
#[derive(Clone, Debug)]
pub struct MapDocument {
    /// Buffer format tag; exports always carry the newest
    pub format: u32,
    /// Layers in draw order
    pub layers: Vec<LayerRecord>,
}

impl MapDocument {
    /// Snapshot a map's layers and cells
    pub fn from_map(map: &GridMap) -> Self {
        let mut layers = Vec::with_capacity(map.layer_count());
        for index in 0..map.layer_count() {
            let settings = map.layer_settings(index).cloned().unwrap_or_default();
            let mut cells: Vec<([i32; 2], CellRef)> = map
                .get_used_cells(index)
                .into_iter()
                .map(|coords| (coords, map.get_cell(index, coords, false)))
                .collect();
            cells.sort_unstable();
            layers.push(LayerRecord { settings, cells });
        }
        Self {
            format: CURRENT_FORMAT_VERSION,
            layers,
        }
    }

    /// Apply the document to a map, replacing its layers and cells
    ///
    /// # Errors
    ///
    /// Propagates layer-management errors; a document with zero layers
    /// leaves the map with one empty layer.
    pub fn apply_to(&self, map: &mut GridMap) -> Result<()> {
        while map.layer_count() > 1 {
            map.remove_layer(map.layer_count() - 1)?;
        }
        map.clear_layer(0)?;
        while map.layer_count() < self.layers.len() {
            map.add_layer(-1)?;
        }

        for (index, record) in self.layers.iter().enumerate() {
            map.set_layer_name(index, record.settings.name.clone())?;
            map.set_layer_enabled(index, record.settings.enabled)?;
            map.set_layer_modulate(index, record.settings.modulate)?;
            map.set_layer_y_sort_enabled(index, record.settings.y_sort_enabled)?;
            map.set_layer_y_sort_origin(index, record.settings.y_sort_origin)?;
            map.set_layer_z_index(index, record.settings.z_index)?;
            for &(coords, cell) in &record.cells {
                map.set_cell(index, coords, cell)?;
            }
        }
        Ok(())
    }

    /// Serialize to the binary container layout
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&DOCUMENT_MAGIC);
        data.extend_from_slice(&self.format.to_le_bytes());
        data.extend_from_slice(&(self.layers.len() as u32).to_le_bytes());

        for layer in &self.layers {
            let name = layer.settings.name.as_bytes();
            data.extend_from_slice(&(name.len() as u16).to_le_bytes());
            data.extend_from_slice(name);
            data.push(u8::from(layer.settings.enabled));
            for channel in layer.settings.modulate {
                data.extend_from_slice(&channel.to_le_bytes());
            }
            data.push(u8::from(layer.settings.y_sort_enabled));
            data.extend_from_slice(&layer.settings.y_sort_origin.to_le_bytes());
            data.extend_from_slice(&layer.settings.z_index.to_le_bytes());
            data.extend_from_slice(&(layer.cells.len() as u32).to_le_bytes());
            data.extend_from_slice(&buffer::encode_cells(&layer.cells));
        }
        data
    }

    /// Parse the binary container layout
    ///
    /// # Errors
    ///
    /// Returns [`MapError::Document`] for bad magic, an unknown format tag
    /// or a truncated payload, and [`MapError::CorruptData`] for a malformed
    /// embedded cell buffer.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);

        let magic = reader.take(4)?;
        if magic != DOCUMENT_MAGIC {
            return Err(MapError::Document {
                reason: "bad magic bytes".to_string(),
            });
        }
        let format = reader.read_u32()?;
        if format > CURRENT_FORMAT_VERSION {
            return Err(MapError::Document {
                reason: format!("unknown format tag {format}"),
            });
        }

        let layer_count = reader.read_u32()? as usize;
        let mut layers = Vec::with_capacity(layer_count);
        for _ in 0..layer_count {
            let name_len = reader.read_u16()? as usize;
            let name = String::from_utf8(reader.take(name_len)?.to_vec()).map_err(|_| {
                MapError::Document {
                    reason: "layer name is not valid UTF-8".to_string(),
                }
            })?;
            let enabled = reader.read_u8()? != 0;
            let mut modulate = [0.0f32; 4];
            for channel in &mut modulate {
                *channel = reader.read_f32()?;
            }
            let y_sort_enabled = reader.read_u8()? != 0;
            let y_sort_origin = reader.read_i32()?;
            let z_index = reader.read_i32()?;

            let cell_count = reader.read_u32()? as usize;
            let byte_len = cell_count
                .checked_mul(BufferFormat::Current.record_bytes())
                .ok_or_else(truncated)?;
            let cells = buffer::decode_cells(reader.take(byte_len)?, BufferFormat::Current)?;

            layers.push(LayerRecord {
                settings: LayerSettings {
                    name,
                    enabled,
                    modulate,
                    y_sort_enabled,
                    y_sort_origin,
                    z_index,
                },
                cells,
            });
        }

        Ok(Self { format, layers })
    }

    /// Read and parse a document file
    ///
    /// # Errors
    ///
    /// Returns [`MapError::FileSystem`] on read failure plus everything
    /// [`Self::decode`] can return.
    pub fn read_file(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|err| file_error(path, "read", err))?;
        Self::decode(&data)
    }

    /// Serialize and write a document file
    ///
    /// # Errors
    ///
    /// Returns [`MapError::FileSystem`] on write failure.
    pub fn write_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.encode()).map_err(|err| file_error(path, "write", err))
    }
}

// Cursor over the container bytes with bounds-checked reads.
struct Reader<'a> {
    data: &'a [u8],
    at: usize,
}

impl<'a> Reader<'a> {
    const fn new(data: &'a [u8]) -> Self {
        Self { data, at: 0 }
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self.at.checked_add(count).ok_or_else(truncated)?;
        let slice = self.data.get(self.at..end).ok_or_else(truncated)?;
        self.at = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?.first().copied().unwrap_or(0))
    }

    fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes(pair(bytes)))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(quad(bytes)))
    }

    fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes(quad(bytes)))
    }

    fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.take(4)?;
        Ok(f32::from_le_bytes(quad(bytes)))
    }
}

fn truncated() -> MapError {
    MapError::Document {
        reason: "truncated payload".to_string(),
    }
}

fn pair(bytes: &[u8]) -> [u8; 2] {
    [
        bytes.first().copied().unwrap_or(0),
        bytes.get(1).copied().unwrap_or(0),
    ]
}

fn quad(bytes: &[u8]) -> [u8; 4] {
    [
        bytes.first().copied().unwrap_or(0),
        bytes.get(1).copied().unwrap_or(0),
        bytes.get(2).copied().unwrap_or(0),
        bytes.get(3).copied().unwrap_or(0),
    ]
}

#[cfg(test)]
mod tests {
    use super::MapDocument;
    use crate::map::map::GridMap;

    #[test]
    fn documents_round_trip_through_bytes() {
        let mut map = GridMap::new();
        let _ = map.add_layer(-1);
        let _ = map.set_layer_name(1, "props");
        let _ = map.set_layer_z_index(1, 4);
        let _ = map.set_cell(0, [2, 3], crate::map::cell::CellRef::new(1, [0, 0], 0));
        let _ = map.set_cell(1, [-4, 9], crate::map::cell::CellRef::new(2, [1, 1], 1));

        let document = MapDocument::from_map(&map);
        let decoded = MapDocument::decode(&document.encode());
        let Ok(decoded) = decoded else {
            unreachable!("encoded document failed to decode");
        };
        assert_eq!(decoded.layers.len(), 2);
        assert_eq!(
            decoded.layers.first().map(|l| l.cells.clone()),
            document.layers.first().map(|l| l.cells.clone())
        );
        assert_eq!(
            decoded.layers.get(1).map(|l| l.settings.clone()),
            document.layers.get(1).map(|l| l.settings.clone())
        );
    }

    #[test]
    fn bad_magic_is_rejected() {
        assert!(MapDocument::decode(b"NOPE\0\0\0\0").is_err());
    }
}
