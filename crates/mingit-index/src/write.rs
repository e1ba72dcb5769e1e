//! Empty index emission for `init`.

use std::path::Path;

use mingit_hash::Hasher;

use crate::IndexError;

/// Write an empty v2 index file: the 12-byte header followed by its SHA-1.
///
/// With zero entries there is no body, so the checksum over the preceding
/// bytes covers exactly the header.
pub fn write_empty(path: impl AsRef<Path>) -> Result<(), IndexError> {
    let mut buf = Vec::with_capacity(32);
    buf.extend_from_slice(b"DIRC");
    buf.extend_from_slice(&2u32.to_be_bytes());
    buf.extend_from_slice(&0u32.to_be_bytes());

    let checksum = Hasher::digest(&buf)?;
    buf.extend_from_slice(checksum.as_bytes());

    std::fs::write(path, buf)?;
    Ok(())
}
