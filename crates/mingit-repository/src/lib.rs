//! Repository layout, initialization, refs, and worktree checkout.

mod checkout;
mod init;
pub mod refs;

use std::path::{Path, PathBuf};

use mingit_hash::ObjectId;
use mingit_loose::LooseObjectStore;

pub use refs::HeadRef;

/// Errors from repository-level operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    #[error("object not found: {0}")]
    MissingObject(ObjectId),

    #[error("object {oid} is a {actual}, expected {expected}")]
    UnexpectedObjectType {
        oid: ObjectId,
        actual: &'static str,
        expected: &'static str,
    },

    #[error("invalid HEAD: {0}")]
    InvalidHead(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Loose(#[from] mingit_loose::LooseError),

    #[error(transparent)]
    Object(#[from] mingit_object::ObjectError),

    #[error(transparent)]
    Index(#[from] mingit_index::IndexError),

    #[error(transparent)]
    Hash(#[from] mingit_hash::HashError),
}

/// A handle to a repository: its `.git` directory and working tree.
#[derive(Debug)]
pub struct Repository {
    git_dir: PathBuf,
    work_tree: PathBuf,
    store: LooseObjectStore,
}

impl Repository {
    /// Open the repository whose working tree is `work_tree`.
    ///
    /// Fails if `<work_tree>/.git` does not exist.
    pub fn open(work_tree: impl AsRef<Path>) -> Result<Self, RepoError> {
        let work_tree = work_tree.as_ref().to_path_buf();
        let git_dir = work_tree.join(".git");
        if !git_dir.is_dir() {
            return Err(RepoError::NotARepository(work_tree));
        }
        Ok(Self::from_git_dir(git_dir, work_tree))
    }

    /// Initialize a new repository at `work_tree` and open it.
    pub fn init(work_tree: impl AsRef<Path>) -> Result<Self, RepoError> {
        init::init_repository(work_tree.as_ref())?;
        Self::open(work_tree)
    }

    fn from_git_dir(git_dir: PathBuf, work_tree: PathBuf) -> Self {
        let store = LooseObjectStore::open(git_dir.join("objects"));
        Self {
            git_dir,
            work_tree,
            store,
        }
    }

    /// The `.git` directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// The working tree root.
    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    /// The loose object store under `.git/objects`.
    pub fn store(&self) -> &LooseObjectStore {
        &self.store
    }

    /// Path of the index file.
    pub fn index_path(&self) -> PathBuf {
        self.git_dir.join("index")
    }

    /// Read `HEAD`.
    pub fn head(&self) -> Result<HeadRef, RepoError> {
        refs::read_head(&self.git_dir)
    }

    /// Write a loose ref (e.g. `refs/heads/master`) pointing at `oid`.
    pub fn write_ref(&self, name: &str, oid: &ObjectId) -> Result<(), RepoError> {
        refs::write_ref(&self.git_dir, name, oid)
    }

    /// Materialize the tree of `commit_oid` into the working tree.
    pub fn checkout(&self, commit_oid: &ObjectId) -> Result<(), RepoError> {
        checkout::checkout_commit(self, commit_oid)
    }
}
