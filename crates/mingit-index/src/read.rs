//! Index file reading (v2 only).

use bstr::BString;
use mingit_hash::ObjectId;
use mingit_object::FileMode;

use crate::{Index, IndexEntry, IndexError};

/// Magic bytes at the start of every index file.
const INDEX_SIGNATURE: &[u8; 4] = b"DIRC";

/// Offset of the mode field within the 62-byte fixed entry prefix.
const ENTRY_MODE_OFFSET: usize = 24;
/// Offset of the OID field.
const ENTRY_OID_OFFSET: usize = 40;
/// Offset of the flags field.
const ENTRY_FLAGS_OFFSET: usize = 60;
/// Size of the fixed prefix (stat data + OID + flags).
const ENTRY_PREFIX_SIZE: usize = 62;

/// Parse an index file from raw bytes.
///
/// Trailing data after the declared entries (extensions, checksum) is
/// ignored; the index is consumed read-only.
pub fn parse_index(data: &[u8]) -> Result<Index, IndexError> {
    if data.len() < 12 {
        return Err(IndexError::InvalidHeader("index file too short".into()));
    }

    if &data[0..4] != INDEX_SIGNATURE {
        return Err(IndexError::InvalidHeader(format!(
            "bad signature: expected DIRC, got {:?}",
            &data[0..4]
        )));
    }

    let version = read_u32(&data[4..]);
    if version != 2 {
        return Err(IndexError::UnsupportedVersion(version));
    }

    let entry_count = read_u32(&data[8..]) as usize;

    let mut entries = Vec::with_capacity(entry_count);
    let mut cursor = 12;

    for _ in 0..entry_count {
        let (entry, new_cursor) = parse_entry(data, cursor)?;
        entries.push(entry);
        cursor = new_cursor;
    }

    Ok(Index { entries })
}

/// Parse a single entry starting at `start`.
///
/// The entry layout is a 62-byte fixed prefix, the path bytes, then NUL
/// padding out to `(62 + name_len + 8) & !7` total bytes; at least one
/// NUL always terminates the path.
fn parse_entry(data: &[u8], start: usize) -> Result<(IndexEntry, usize), IndexError> {
    if start + ENTRY_PREFIX_SIZE > data.len() {
        return Err(IndexError::InvalidEntry {
            offset: start,
            reason: "entry prefix out of bounds".into(),
        });
    }

    let mode_raw = read_u32(&data[start + ENTRY_MODE_OFFSET..]);

    let oid = ObjectId::from_bytes(&data[start + ENTRY_OID_OFFSET..start + ENTRY_OID_OFFSET + 20])
        .map_err(|_| IndexError::InvalidEntry {
            offset: start,
            reason: "invalid OID".into(),
        })?;

    let flags = read_u16(&data[start + ENTRY_FLAGS_OFFSET..]);
    let name_len_field = (flags & 0x0fff) as usize;

    let path_start = start + ENTRY_PREFIX_SIZE;
    let name_len = if name_len_field < 0x0fff {
        name_len_field
    } else {
        // Overlong path: the field saturates and the real length comes from
        // the NUL terminator.
        data[path_start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| IndexError::InvalidEntry {
                offset: start,
                reason: "unterminated path".into(),
            })?
    };

    if path_start + name_len > data.len() {
        return Err(IndexError::InvalidEntry {
            offset: start,
            reason: "path out of bounds".into(),
        });
    }
    let path = BString::from(&data[path_start..path_start + name_len]);

    let entry_size = (ENTRY_PREFIX_SIZE + name_len + 8) & !7;
    let end = start + entry_size;
    if end > data.len() {
        return Err(IndexError::InvalidEntry {
            offset: start,
            reason: "entry padding out of bounds".into(),
        });
    }

    Ok((
        IndexEntry {
            path,
            oid,
            mode: FileMode::from_raw(mode_raw),
        },
        end,
    ))
}

fn read_u32(data: &[u8]) -> u32 {
    u32::from_be_bytes([data[0], data[1], data[2], data[3]])
}

fn read_u16(data: &[u8]) -> u16 {
    u16::from_be_bytes([data[0], data[1]])
}
