//! Loose refs and HEAD.
//!
//! Refs are single-line files holding a 40-hex OID; HEAD is either a
//! symbolic ref (`ref: refs/heads/master`) or detached (a bare OID).
//! Writes go through a temp file and rename so readers never observe a
//! partial ref.

use std::fs;
use std::path::Path;

use mingit_hash::ObjectId;

use crate::RepoError;

/// The two shapes of `HEAD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadRef {
    /// `ref: <refname>`: HEAD names a branch.
    Symbolic(String),
    /// A bare OID: detached HEAD.
    Detached(ObjectId),
}

/// Read and parse `HEAD`.
pub fn read_head(git_dir: &Path) -> Result<HeadRef, RepoError> {
    let raw = fs::read_to_string(git_dir.join("HEAD"))?;
    let line = raw.trim_end();

    if let Some(target) = line.strip_prefix("ref: ") {
        if target.is_empty() {
            return Err(RepoError::InvalidHead(raw));
        }
        return Ok(HeadRef::Symbolic(target.to_string()));
    }

    match ObjectId::from_hex(line) {
        Ok(oid) => Ok(HeadRef::Detached(oid)),
        Err(_) => Err(RepoError::InvalidHead(raw)),
    }
}

/// Resolve `HEAD` to an OID, following a symbolic ref one level.
///
/// Returns `Ok(None)` when HEAD names a branch that does not exist yet
/// (a fresh repository before its first commit).
pub fn resolve_head(git_dir: &Path) -> Result<Option<ObjectId>, RepoError> {
    match read_head(git_dir)? {
        HeadRef::Detached(oid) => Ok(Some(oid)),
        HeadRef::Symbolic(refname) => read_ref(git_dir, &refname),
    }
}

/// Read a loose ref. Returns `Ok(None)` if the ref does not exist.
pub fn read_ref(git_dir: &Path, name: &str) -> Result<Option<ObjectId>, RepoError> {
    validate_ref_name(name)?;
    let path = git_dir.join(name);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(RepoError::Io(e)),
    };
    let oid = ObjectId::from_hex(raw.trim_end())
        .map_err(|_| RepoError::InvalidRefName(format!("{name}: bad content")))?;
    Ok(Some(oid))
}

/// Write a loose ref pointing at `oid` (temp file + rename).
pub fn write_ref(git_dir: &Path, name: &str, oid: &ObjectId) -> Result<(), RepoError> {
    validate_ref_name(name)?;
    let path = git_dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_file_name(format!(
        "{}.lock",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("ref")
    ));
    fs::write(&tmp, format!("{}\n", oid.to_hex()))?;
    match fs::rename(&tmp, &path) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(RepoError::Io(e))
        }
    }
}

/// Point `HEAD` at a branch.
pub fn write_symbolic_head(git_dir: &Path, refname: &str) -> Result<(), RepoError> {
    validate_ref_name(refname)?;
    fs::write(git_dir.join("HEAD"), format!("ref: {refname}\n"))?;
    Ok(())
}

/// Reject ref names that would escape the git dir or collide with the
/// lock files used for atomic writes.
fn validate_ref_name(name: &str) -> Result<(), RepoError> {
    let bad = name.is_empty()
        || name.starts_with('/')
        || name.ends_with('/')
        || name.contains("..")
        || name.ends_with(".lock")
        || name.split('/').any(|c| c.is_empty());
    if bad {
        return Err(RepoError::InvalidRefName(name.to_string()));
    }
    Ok(())
}
