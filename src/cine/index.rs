//! Frame offset table.
//!
//! The file header points at a table of `image_count` entries, one per
//! stored frame in capture order. Each entry is a little-endian
//! `(offset: u64, length: u32)` pair locating that frame's image block.

use std::io::{Read, Seek, SeekFrom};

use tracing::debug;

use crate::cine::error::{CineError, Result};
use crate::cine::headers::FileHeader;

pub const INDEX_ENTRY_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameIndexEntry {
    /// Absolute byte offset of the frame's image block.
    pub offset: u64,
    /// Byte length of the pixel payload inside that block.
    pub length: u32,
}

/// Reads and validates the offset table.
///
/// Offsets must be strictly increasing and every `offset + length`
/// must stay inside the file; violations surface as `CorruptIndex`
/// and are never repaired. The table is built once at open and is
/// immutable afterwards.
pub fn load_index<R: Read + Seek>(
    source: &mut R,
    header: &FileHeader,
    file_len: u64,
) -> Result<Vec<FrameIndexEntry>> {
    let count = header.image_count as usize;
    let table_bytes = count * INDEX_ENTRY_SIZE;
    let table_off = header.off_image_offsets as u64;

    if table_off + table_bytes as u64 > file_len {
        return Err(CineError::CorruptIndex {
            entry: 0,
            detail: format!(
                "index table of {count} entries at byte {table_off} extends past \
                 end of file ({file_len} bytes)"
            ),
        });
    }

    source.seek(SeekFrom::Start(table_off))?;
    let mut buf = vec![0u8; table_bytes];
    source.read_exact(&mut buf)?;

    let mut entries = Vec::with_capacity(count);
    let mut prev_offset = 0u64;
    for (i, chunk) in buf.chunks_exact(INDEX_ENTRY_SIZE).enumerate() {
        let offset = u64::from_le_bytes(chunk[0..8].try_into().unwrap());
        let length = u32::from_le_bytes(chunk[8..12].try_into().unwrap());

        match offset.checked_add(length as u64) {
            Some(end) if end <= file_len => {}
            _ => {
                return Err(CineError::CorruptIndex {
                    entry: i as u32,
                    detail: format!(
                        "frame block {offset}+{length} exceeds file length {file_len}"
                    ),
                });
            }
        }
        if i > 0 && offset <= prev_offset {
            return Err(CineError::CorruptIndex {
                entry: i as u32,
                detail: format!(
                    "offset {offset} does not increase over previous entry at {prev_offset}"
                ),
            });
        }
        prev_offset = offset;
        entries.push(FrameIndexEntry { offset, length });
    }

    debug!("loaded frame index: {} entries", entries.len());
    Ok(entries)
}
