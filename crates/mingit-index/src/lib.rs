//! Index (staging area) reading and index-to-tree building.
//!
//! The index is consumed read-only: parsing the v2 binary format into a
//! flat entry list, and building the tree object DAG from it. The only
//! write this crate performs is the empty index emitted by `init`.

mod read;
mod tree_build;
mod write;

use std::path::Path;

use bstr::BString;
use mingit_hash::ObjectId;
use mingit_loose::LooseObjectStore;
use mingit_object::FileMode;

pub use write::write_empty;

/// Errors from index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("invalid index header: {0}")]
    InvalidHeader(String),

    #[error("unsupported index version: {0}")]
    UnsupportedVersion(u32),

    #[error("invalid index entry at offset {offset}: {reason}")]
    InvalidEntry { offset: usize, reason: String },

    #[error("malformed path in index: {0}")]
    MalformedPath(BString),

    #[error("duplicate index entry: {0}")]
    DuplicateEntry(BString),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Loose(#[from] mingit_loose::LooseError),

    #[error(transparent)]
    Hash(#[from] mingit_hash::HashError),
}

/// One staged file: path, blob OID, and file mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub path: BString,
    pub oid: ObjectId,
    pub mode: FileMode,
}

/// A parsed index file: an ordered list of staged entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    entries: Vec<IndexEntry>,
}

impl Index {
    /// Parse an index from raw bytes.
    pub fn parse(data: &[u8]) -> Result<Self, IndexError> {
        read::parse_index(data)
    }

    /// Read and parse an index file from disk.
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let data = std::fs::read(path)?;
        Self::parse(&data)
    }

    /// The staged entries, in file order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build and persist the tree DAG for the staged entries; returns the
    /// root tree OID.
    pub fn write_tree(&self, store: &LooseObjectStore) -> Result<ObjectId, IndexError> {
        tree_build::write_tree(&self.entries, store)
    }
}
