//! Packfile reading and delta resolution.
//!
//! A packfile is the wire format for network transfer: a 12-byte header,
//! a sequence of zlib-compressed entries (full objects or deltas against
//! a base), and a trailing SHA-1 checksum. This crate parses the stream,
//! applies copy/insert deltas, and persists every reconstructed object
//! into the loose store.

pub mod delta;
pub mod entry;
mod parse;
mod unpack;

pub use parse::{parse_pack, ParsedPack, RawEntry, RawEntryKind};
pub use unpack::unpack_into;

use mingit_hash::ObjectId;
use mingit_object::ObjectType;

/// Errors that can occur during pack operations.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("invalid pack header: {0}")]
    InvalidHeader(String),

    #[error("unsupported pack version: {0}")]
    UnsupportedVersion(u32),

    #[error("corrupt pack entry at offset {0}")]
    CorruptEntry(u64),

    #[error("pack checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: ObjectId, actual: ObjectId },

    #[error("{trailing} bytes of trailing garbage after {count} pack entries")]
    TrailingGarbage { trailing: usize, count: u32 },

    #[error("invalid delta at offset {offset}: {reason}")]
    InvalidDelta { offset: u64, reason: String },

    #[error("delta base not found: {0}")]
    MissingBase(ObjectId),

    #[error("delta chain too deep (>{max_depth} levels) at offset {offset}")]
    DeltaChainTooDeep { offset: u64, max_depth: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Object(#[from] mingit_object::ObjectError),

    #[error(transparent)]
    Loose(#[from] mingit_loose::LooseError),

    #[error(transparent)]
    Hash(#[from] mingit_hash::HashError),
}

/// Type of a packed object entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackEntryType {
    Commit,
    Tree,
    Blob,
    Tag,
    /// Delta with a backward offset to its base in the same pack.
    /// `base_offset` is already resolved to an absolute pack offset.
    OfsDelta { base_offset: u64 },
    /// Delta referencing its base by OID.
    RefDelta { base_oid: ObjectId },
}

impl PackEntryType {
    /// Convert a non-delta pack entry type to an ObjectType.
    pub fn to_object_type(self) -> Option<ObjectType> {
        match self {
            Self::Commit => Some(ObjectType::Commit),
            Self::Tree => Some(ObjectType::Tree),
            Self::Blob => Some(ObjectType::Blob),
            Self::Tag => Some(ObjectType::Tag),
            Self::OfsDelta { .. } | Self::RefDelta { .. } => None,
        }
    }

    /// Type number as used in pack entry headers.
    pub fn type_number(&self) -> u8 {
        match self {
            Self::Commit => 1,
            Self::Tree => 2,
            Self::Blob => 3,
            Self::Tag => 4,
            Self::OfsDelta { .. } => 6,
            Self::RefDelta { .. } => 7,
        }
    }
}

/// Pack format constants.
pub const PACK_SIGNATURE: &[u8; 4] = b"PACK";
pub const PACK_VERSION: u32 = 2;
pub const PACK_HEADER_SIZE: usize = 12;
pub const PACK_TRAILER_SIZE: usize = 20;

/// Maximum delta chain depth before we bail out.
pub const MAX_DELTA_CHAIN_DEPTH: usize = 50;
