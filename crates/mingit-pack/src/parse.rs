//! Streaming packfile decoding.
//!
//! A fetched pack arrives as one in-memory byte buffer with no companion
//! index, so entries are walked in file order. There is no length field
//! for an entry's zlib stream: the decompressor itself reports how many
//! compressed bytes it consumed, and the cursor advances exactly past the
//! deflate block onto the next entry header.

use std::io::Read;

use flate2::bufread::ZlibDecoder;
use mingit_hash::{Hasher, ObjectId};
use mingit_object::ObjectType;

use crate::entry::parse_entry_header;
use crate::{
    PackEntryType, PackError, PACK_HEADER_SIZE, PACK_SIGNATURE, PACK_TRAILER_SIZE, PACK_VERSION,
};

/// What a decoded entry is, after its header and body have been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEntryKind {
    /// A full object of the given type.
    Base(ObjectType),
    /// Delta whose base lives at an absolute offset earlier in this pack.
    OfsDelta { base_offset: u64 },
    /// Delta whose base is identified by OID.
    RefDelta { base_oid: ObjectId },
}

/// One decoded pack entry: a full object payload or a delta stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Absolute offset of the entry header in the pack.
    pub offset: u64,
    pub kind: RawEntryKind,
    /// Decompressed payload: object content for bases, the instruction
    /// stream for deltas.
    pub data: Vec<u8>,
}

/// A fully decoded pack: every entry decompressed, checksum verified.
#[derive(Debug)]
pub struct ParsedPack {
    pub num_objects: u32,
    pub entries: Vec<RawEntry>,
}

/// Decode a complete packfile from memory.
///
/// Validates the `PACK` header and version, decompresses exactly
/// `num_objects` entries, requires the cursor to land on the trailer
/// boundary, and verifies the trailing SHA-1 over everything before it.
pub fn parse_pack(data: &[u8]) -> Result<ParsedPack, PackError> {
    if data.len() < PACK_HEADER_SIZE + PACK_TRAILER_SIZE {
        return Err(PackError::InvalidHeader("pack too small".into()));
    }
    if &data[0..4] != PACK_SIGNATURE {
        return Err(PackError::InvalidHeader("bad PACK signature".into()));
    }
    let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
    if version != PACK_VERSION {
        return Err(PackError::UnsupportedVersion(version));
    }
    let num_objects = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);

    verify_checksum(data)?;

    let content_end = data.len() - PACK_TRAILER_SIZE;
    let mut entries = Vec::with_capacity(num_objects as usize);
    let mut offset = PACK_HEADER_SIZE as u64;

    for _ in 0..num_objects {
        if offset as usize >= content_end {
            return Err(PackError::CorruptEntry(offset));
        }

        let header = parse_entry_header(&data[offset as usize..content_end], offset)?;

        let kind = match header.entry_type {
            PackEntryType::Commit => RawEntryKind::Base(ObjectType::Commit),
            PackEntryType::Tree => RawEntryKind::Base(ObjectType::Tree),
            PackEntryType::Blob => RawEntryKind::Base(ObjectType::Blob),
            PackEntryType::Tag => RawEntryKind::Base(ObjectType::Tag),
            PackEntryType::OfsDelta { base_offset } => RawEntryKind::OfsDelta { base_offset },
            PackEntryType::RefDelta { base_oid } => RawEntryKind::RefDelta { base_oid },
        };

        let (payload, consumed) = inflate_entry(
            &data[header.data_offset as usize..content_end],
            header.uncompressed_size,
            offset,
        )?;

        entries.push(RawEntry {
            offset,
            kind,
            data: payload,
        });

        offset = header.data_offset + consumed as u64;
    }

    if offset as usize != content_end {
        return Err(PackError::TrailingGarbage {
            trailing: content_end - offset as usize,
            count: num_objects,
        });
    }

    Ok(ParsedPack {
        num_objects,
        entries,
    })
}

/// Inflate one entry's zlib stream, returning the payload and the exact
/// number of compressed bytes consumed.
fn inflate_entry(
    compressed: &[u8],
    expected_size: usize,
    entry_offset: u64,
) -> Result<(Vec<u8>, usize), PackError> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut payload = Vec::with_capacity(expected_size);
    decoder
        .read_to_end(&mut payload)
        .map_err(|_| PackError::CorruptEntry(entry_offset))?;

    if payload.len() != expected_size {
        return Err(PackError::CorruptEntry(entry_offset));
    }

    Ok((payload, decoder.total_in() as usize))
}

/// Verify the trailing SHA-1 over everything before it.
fn verify_checksum(data: &[u8]) -> Result<(), PackError> {
    let trailer_start = data.len() - PACK_TRAILER_SIZE;
    let expected = ObjectId::from_bytes(&data[trailer_start..])?;

    let mut hasher = Hasher::new();
    hasher.update(&data[..trailer_start]);
    let actual = hasher.finalize()?;

    if actual != expected {
        return Err(PackError::ChecksumMismatch { expected, actual });
    }
    Ok(())
}
