//! Materializing a commit's tree into the working tree.

use std::fs;
use std::path::Path;

use bstr::ByteSlice;
use mingit_hash::ObjectId;
use mingit_object::{Object, Tree};

use crate::{RepoError, Repository};

/// Load `commit_oid`, then write its full tree under the repository's
/// working tree: directories for subtrees, files for blobs.
pub fn checkout_commit(repo: &Repository, commit_oid: &ObjectId) -> Result<(), RepoError> {
    let commit = match repo.store().read(commit_oid)? {
        Some(Object::Commit(c)) => c,
        Some(other) => {
            return Err(RepoError::UnexpectedObjectType {
                oid: *commit_oid,
                actual: other.object_type().as_str(),
                expected: "commit",
            })
        }
        None => return Err(RepoError::MissingObject(*commit_oid)),
    };

    let tree = load_tree(repo, &commit.tree)?;
    write_tree_contents(repo, &tree, repo.work_tree())
}

fn load_tree(repo: &Repository, oid: &ObjectId) -> Result<Tree, RepoError> {
    match repo.store().read(oid)? {
        Some(Object::Tree(t)) => Ok(t),
        Some(other) => Err(RepoError::UnexpectedObjectType {
            oid: *oid,
            actual: other.object_type().as_str(),
            expected: "tree",
        }),
        None => Err(RepoError::MissingObject(*oid)),
    }
}

fn write_tree_contents(repo: &Repository, tree: &Tree, dir: &Path) -> Result<(), RepoError> {
    for entry in tree.iter() {
        let path = dir.join(entry.name.to_os_str_lossy());

        if entry.mode.is_tree() {
            fs::create_dir_all(&path)?;
            let subtree = load_tree(repo, &entry.oid)?;
            write_tree_contents(repo, &subtree, &path)?;
            continue;
        }

        // A gitlink references a commit in another repository; leave an
        // empty directory, as an uninitialized submodule would be.
        if entry.mode.is_gitlink() {
            fs::create_dir_all(&path)?;
            continue;
        }

        let blob = match repo.store().read(&entry.oid)? {
            Some(Object::Blob(b)) => b,
            Some(other) => {
                return Err(RepoError::UnexpectedObjectType {
                    oid: entry.oid,
                    actual: other.object_type().as_str(),
                    expected: "blob",
                })
            }
            None => return Err(RepoError::MissingObject(entry.oid)),
        };

        if entry.mode.is_symlink() {
            write_symlink(&blob.data, &path)?;
        } else {
            fs::write(&path, &blob.data)?;
            #[cfg(unix)]
            if entry.mode.raw() == 0o100755 {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
            }
        }
    }
    Ok(())
}

#[cfg(unix)]
fn write_symlink(target: &[u8], path: &Path) -> Result<(), RepoError> {
    use std::os::unix::ffi::OsStrExt;
    let target = std::ffi::OsStr::from_bytes(target);
    if path.exists() {
        fs::remove_file(path)?;
    }
    std::os::unix::fs::symlink(target, path)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_symlink(target: &[u8], path: &Path) -> Result<(), RepoError> {
    // Degrade to a plain file holding the link target.
    fs::write(path, target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bstr::BString;
    use mingit_object::{FileMode, ObjectType, Signature, TreeEntry};

    fn scratch_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    fn commit_of_tree(repo: &Repository, tree_oid: ObjectId) -> ObjectId {
        let sig = Signature {
            name: BString::from("X"),
            email: BString::from("x@e"),
            timestamp: 1700000000,
            tz_offset: 0,
        };
        let commit =
            mingit_object::Commit::new(tree_oid, vec![], sig.clone(), sig, BString::from("c\n"));
        repo.store()
            .write_raw(ObjectType::Commit, &commit.serialize_content())
            .unwrap()
    }

    #[test]
    fn checkout_nested_tree() {
        let (dir, repo) = scratch_repo();
        let store = repo.store();

        let blob_a = store.write_raw(ObjectType::Blob, b"alpha\n").unwrap();
        let blob_b = store.write_raw(ObjectType::Blob, b"beta\n").unwrap();

        let src = Tree {
            entries: vec![TreeEntry {
                mode: FileMode::Regular,
                name: BString::from("inner.txt"),
                oid: blob_b,
            }],
        };
        let src_oid = store
            .write_raw(ObjectType::Tree, &src.serialize_content())
            .unwrap();

        let root = Tree {
            entries: vec![
                TreeEntry {
                    mode: FileMode::Regular,
                    name: BString::from("top.txt"),
                    oid: blob_a,
                },
                TreeEntry {
                    mode: FileMode::Tree,
                    name: BString::from("src"),
                    oid: src_oid,
                },
            ],
        };
        let root_oid = store
            .write_raw(ObjectType::Tree, &root.serialize_content())
            .unwrap();

        let commit_oid = commit_of_tree(&repo, root_oid);
        repo.checkout(&commit_oid).unwrap();

        assert_eq!(fs::read(dir.path().join("top.txt")).unwrap(), b"alpha\n");
        assert_eq!(
            fs::read(dir.path().join("src").join("inner.txt")).unwrap(),
            b"beta\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn checkout_preserves_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, repo) = scratch_repo();
        let store = repo.store();

        let blob = store.write_raw(ObjectType::Blob, b"#!/bin/sh\n").unwrap();
        let root = Tree {
            entries: vec![TreeEntry {
                mode: FileMode::Executable,
                name: BString::from("run.sh"),
                oid: blob,
            }],
        };
        let root_oid = store
            .write_raw(ObjectType::Tree, &root.serialize_content())
            .unwrap();

        let commit_oid = commit_of_tree(&repo, root_oid);
        repo.checkout(&commit_oid).unwrap();

        let mode = fs::metadata(dir.path().join("run.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_ne!(mode & 0o111, 0, "executable bit not set");
    }

    #[cfg(unix)]
    #[test]
    fn checkout_materializes_symlink() {
        let (dir, repo) = scratch_repo();
        let store = repo.store();

        let blob = store.write_raw(ObjectType::Blob, b"target.txt").unwrap();
        let root = Tree {
            entries: vec![TreeEntry {
                mode: FileMode::Symlink,
                name: BString::from("link"),
                oid: blob,
            }],
        };
        let root_oid = store
            .write_raw(ObjectType::Tree, &root.serialize_content())
            .unwrap();

        let commit_oid = commit_of_tree(&repo, root_oid);
        repo.checkout(&commit_oid).unwrap();

        let link = dir.path().join("link");
        let meta = fs::symlink_metadata(&link).unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(fs::read_link(&link).unwrap().to_str().unwrap(), "target.txt");
    }

    #[test]
    fn checkout_missing_commit_fails() {
        let (_dir, repo) = scratch_repo();
        let oid = ObjectId::from_hex("3333333333333333333333333333333333333333").unwrap();
        assert!(matches!(
            repo.checkout(&oid).unwrap_err(),
            RepoError::MissingObject(_)
        ));
    }

    #[test]
    fn checkout_non_commit_fails() {
        let (_dir, repo) = scratch_repo();
        let blob = repo
            .store()
            .write_raw(ObjectType::Blob, b"not a commit")
            .unwrap();
        assert!(matches!(
            repo.checkout(&blob).unwrap_err(),
            RepoError::UnexpectedObjectType { .. }
        ));
    }

    #[test]
    fn checkout_missing_blob_fails() {
        let (_dir, repo) = scratch_repo();
        let store = repo.store();

        let absent = ObjectId::from_hex("4444444444444444444444444444444444444444").unwrap();
        let root = Tree {
            entries: vec![TreeEntry {
                mode: FileMode::Regular,
                name: BString::from("ghost.txt"),
                oid: absent,
            }],
        };
        let root_oid = store
            .write_raw(ObjectType::Tree, &root.serialize_content())
            .unwrap();
        let commit_oid = commit_of_tree(&repo, root_oid);

        assert!(matches!(
            repo.checkout(&commit_oid).unwrap_err(),
            RepoError::MissingObject(_)
        ));
    }
}
