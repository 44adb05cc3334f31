//! Binary cell-buffer codec with legacy format upgrades
//!
//! Buffers are flat sequences of fixed-width little-endian records. Two
//! legacy layouts remain importable and are upgraded in memory on load;
//! export always emits the newest layout. A buffer whose length is not a
//! multiple of its record width is rejected before any cell is produced.
//!
//! Current records (12 bytes):
//! `x:i16, y:i16, source:u16, sub_x:u16, sub_y:u16, variant:u16`.
//!
//! Legacy v1 records (8 bytes) pack the source id and three transform flags
//! into one `u32`; legacy v2 records (12 bytes) add the sub-tile coordinate.

use crate::io::configuration::{
    CELL_RECORD_BYTES, LEGACY_V1_RECORD_BYTES, LEGACY_V2_RECORD_BYTES,
};
use crate::io::error::{MapError, Result};
use crate::map::cell::CellRef;

// Transform flags occupied the top three bits of the legacy source word.
const LEGACY_FLIP_H: u32 = 1 << 29;
const LEGACY_FLIP_V: u32 = 1 << 30;
const LEGACY_TRANSPOSE: u32 = 1 << 31;
const LEGACY_SOURCE_MASK: u32 = LEGACY_FLIP_H - 1;

/// On-disk layout of a cell buffer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferFormat {
    /// 8-byte records predating sub-tile coordinates and variants
    LegacyV1,
    /// 12-byte records predating the variant field
    LegacyV2,
    /// 12-byte records of the current layout
    Current,
}

impl BufferFormat {
    /// Record width in bytes
    pub const fn record_bytes(self) -> usize {
        match self {
            Self::LegacyV1 => LEGACY_V1_RECORD_BYTES,
            Self::LegacyV2 => LEGACY_V2_RECORD_BYTES,
            Self::Current => CELL_RECORD_BYTES,
        }
    }
}

/// Decode a cell buffer, upgrading legacy records to the current model
///
/// # Errors
///
/// Returns [`MapError::CorruptData`] when the buffer length is not a
/// multiple of the format's record width. Nothing is decoded in that case.
pub fn decode_cells(data: &[u8], format: BufferFormat) -> Result<Vec<([i32; 2], CellRef)>> {
    let record_bytes = format.record_bytes();
    if data.len() % record_bytes != 0 {
        return Err(MapError::CorruptData {
            length: data.len(),
            record_bytes,
        });
    }

    let mut cells = Vec::with_capacity(data.len() / record_bytes);
    for record in data.chunks_exact(record_bytes) {
        let coords = [
            i32::from(read_i16(record, 0)),
            i32::from(read_i16(record, 2)),
        ];
        let cell = match format {
            BufferFormat::Current => CellRef::new(
                i32::from(read_u16(record, 4)),
                [
                    i32::from(read_u16(record, 6)),
                    i32::from(read_u16(record, 8)),
                ],
                i32::from(read_u16(record, 10)),
            ),
            BufferFormat::LegacyV1 | BufferFormat::LegacyV2 => {
                let word = read_u32(record, 4);
                let sub = if format == BufferFormat::LegacyV2 {
                    [
                        i32::from(read_u16(record, 8)),
                        i32::from(read_u16(record, 10)),
                    ]
                } else {
                    [0, 0]
                };
                CellRef::new(
                    (word & LEGACY_SOURCE_MASK) as i32,
                    sub,
                    legacy_variant(word),
                )
            }
        };
        cells.push((coords, cell));
    }
    Ok(cells)
}

/// Encode cells in the current format
///
/// Callers pass cells pre-sorted when a deterministic buffer is needed.
pub fn encode_cells(cells: &[([i32; 2], CellRef)]) -> Vec<u8> {
    let mut data = Vec::with_capacity(cells.len() * CELL_RECORD_BYTES);
    for &(coords, cell) in cells {
        data.extend_from_slice(&(coords[0] as i16).to_le_bytes());
        data.extend_from_slice(&(coords[1] as i16).to_le_bytes());
        data.extend_from_slice(&(cell.source_id as u16).to_le_bytes());
        data.extend_from_slice(&(cell.sub_coord[0] as u16).to_le_bytes());
        data.extend_from_slice(&(cell.sub_coord[1] as u16).to_le_bytes());
        data.extend_from_slice(&(cell.variant as u16).to_le_bytes());
    }
    data
}

// The legacy transform flags fold into the variant index the same way the
// alternative-tile migration did: h, then v, then transpose.
const fn legacy_variant(word: u32) -> i32 {
    let flip_h = ((word & LEGACY_FLIP_H) != 0) as i32;
    let flip_v = ((word & LEGACY_FLIP_V) != 0) as i32;
    let transpose = ((word & LEGACY_TRANSPOSE) != 0) as i32;
    flip_h | (flip_v << 1) | (transpose << 2)
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    let lo = bytes.get(at).copied().unwrap_or(0);
    let hi = bytes.get(at + 1).copied().unwrap_or(0);
    u16::from_le_bytes([lo, hi])
}

fn read_i16(bytes: &[u8], at: usize) -> i16 {
    read_u16(bytes, at) as i16
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from(read_u16(bytes, at)) | (u32::from(read_u16(bytes, at + 2)) << 16)
}

#[cfg(test)]
mod tests {
    use super::{BufferFormat, decode_cells, encode_cells};
    use crate::map::cell::CellRef;

    #[test]
    fn current_format_round_trips() {
        let cells = vec![
            ([-3, 7], CellRef::new(1, [2, 3], 0)),
            ([0, 0], CellRef::new(4, [0, 1], 2)),
        ];
        let data = encode_cells(&cells);
        assert_eq!(data.len(), 24);
        let decoded = decode_cells(&data, BufferFormat::Current);
        assert!(decoded.is_ok_and(|d| d == cells));
    }

    #[test]
    fn legacy_v1_upgrades_flags_into_the_variant() {
        // x = -1, y = 2, source = 5 with flip-v set.
        let mut data = Vec::new();
        data.extend_from_slice(&(-1i16).to_le_bytes());
        data.extend_from_slice(&2i16.to_le_bytes());
        data.extend_from_slice(&(5u32 | (1 << 30)).to_le_bytes());

        let decoded = decode_cells(&data, BufferFormat::LegacyV1);
        assert!(decoded.is_ok_and(|cells| cells
            == vec![([-1, 2], CellRef::new(5, [0, 0], 2))]));
    }

    #[test]
    fn legacy_v2_preserves_the_sub_coordinate() {
        let mut data = Vec::new();
        data.extend_from_slice(&3i16.to_le_bytes());
        data.extend_from_slice(&4i16.to_le_bytes());
        data.extend_from_slice(&9u32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&2u16.to_le_bytes());

        let decoded = decode_cells(&data, BufferFormat::LegacyV2);
        assert!(decoded.is_ok_and(|cells| cells
            == vec![([3, 4], CellRef::new(9, [1, 2], 0))]));
    }

    #[test]
    fn truncated_buffers_are_rejected_wholesale() {
        let cells = vec![([0, 0], CellRef::new(1, [0, 0], 0))];
        let mut data = encode_cells(&cells);
        data.pop();
        assert!(decode_cells(&data, BufferFormat::Current).is_err());
    }
}
