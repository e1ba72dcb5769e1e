//! Building the tree object DAG from a flat index.
//!
//! Index entries are full paths; trees are per-directory. The builder
//! assembles an in-memory directory tree (arena of nodes, children keyed
//! by name), then emits tree objects depth-first post-order so every
//! child OID is known before its parent tree is serialized. Identical
//! subtrees deduplicate through the store's idempotent writes.

use std::collections::BTreeMap;

use bstr::{BString, ByteSlice};
use mingit_hash::ObjectId;
use mingit_loose::LooseObjectStore;
use mingit_object::{FileMode, ObjectType};

use crate::{IndexEntry, IndexError};

/// A node in the in-memory directory tree. Directory nodes get their OID
/// filled in as their subtree is emitted.
struct Node {
    is_dir: bool,
    mode: FileMode,
    oid: Option<ObjectId>,
    /// name → arena index; BTreeMap keeps children in byte-sorted order.
    children: BTreeMap<BString, usize>,
}

impl Node {
    fn dir() -> Self {
        Self {
            is_dir: true,
            mode: FileMode::Tree,
            oid: None,
            children: BTreeMap::new(),
        }
    }

    fn file(oid: ObjectId, mode: FileMode) -> Self {
        Self {
            is_dir: false,
            mode,
            oid: Some(oid),
            children: BTreeMap::new(),
        }
    }
}

/// Build and persist the tree DAG for the given entries; returns the root
/// tree OID. All intermediate trees are written through `store`.
pub fn write_tree(
    entries: &[IndexEntry],
    store: &LooseObjectStore,
) -> Result<ObjectId, IndexError> {
    let mut nodes = vec![Node::dir()]; // index 0 is the root

    for entry in entries {
        insert(&mut nodes, entry)?;
    }

    emit(&mut nodes, 0, store)
}

/// Walk the entry's path, creating directory nodes on demand, and record
/// the file node at the leaf.
fn insert(nodes: &mut Vec<Node>, entry: &IndexEntry) -> Result<(), IndexError> {
    let components: Vec<&[u8]> = entry.path.split_str("/").collect();
    if components.iter().any(|c| c.is_empty()) {
        return Err(IndexError::MalformedPath(entry.path.clone()));
    }

    let mut current = 0usize;
    let (leaf, dirs) = components.split_last().expect("split produced a component");

    for &dir in dirs {
        let name = BString::from(dir);
        match nodes[current].children.get(&name) {
            Some(&child) => {
                if !nodes[child].is_dir {
                    // A file already occupies this path segment.
                    return Err(IndexError::DuplicateEntry(entry.path.clone()));
                }
                current = child;
            }
            None => {
                let child = nodes.len();
                nodes.push(Node::dir());
                nodes[current].children.insert(name, child);
                current = child;
            }
        }
    }

    let leaf_name = BString::from(*leaf);
    if nodes[current].children.contains_key(&leaf_name) {
        return Err(IndexError::DuplicateEntry(entry.path.clone()));
    }
    let child = nodes.len();
    nodes.push(Node::file(entry.oid, entry.mode));
    nodes[current].children.insert(leaf_name, child);

    Ok(())
}

/// Emit the tree object for `idx`, depth-first post-order.
fn emit(
    nodes: &mut Vec<Node>,
    idx: usize,
    store: &LooseObjectStore,
) -> Result<ObjectId, IndexError> {
    let children: Vec<(BString, usize)> = nodes[idx]
        .children
        .iter()
        .map(|(name, &child)| (name.clone(), child))
        .collect();

    let mut payload = Vec::new();
    for (name, child) in children {
        let oid = if nodes[child].is_dir {
            emit(nodes, child, store)?
        } else {
            nodes[child].oid.expect("file node carries its blob oid")
        };

        payload.extend_from_slice(&nodes[child].mode.as_bytes());
        payload.push(b' ');
        payload.extend_from_slice(&name);
        payload.push(0);
        payload.extend_from_slice(oid.as_bytes());
    }

    let oid = store.write_raw(ObjectType::Tree, &payload)?;
    nodes[idx].oid = Some(oid);
    Ok(oid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, oid_hex: &str, mode: u32) -> IndexEntry {
        IndexEntry {
            path: BString::from(path),
            oid: ObjectId::from_hex(oid_hex).unwrap(),
            mode: FileMode::from_raw(mode),
        }
    }

    const D_A: &str = "ce013625030ba8dba906f756967f9e9ca394464a";
    const D_B: &str = "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391";

    fn scratch() -> (tempfile::TempDir, LooseObjectStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectStore::open(dir.path());
        (dir, store)
    }

    #[test]
    fn root_digest_independent_of_entry_order() {
        let (_d1, store1) = scratch();
        let (_d2, store2) = scratch();

        let forward = vec![
            entry("a.txt", D_A, 0o100644),
            entry("b.txt", D_B, 0o100644),
        ];
        let reversed = vec![
            entry("b.txt", D_B, 0o100644),
            entry("a.txt", D_A, 0o100644),
        ];

        let oid1 = write_tree(&forward, &store1).unwrap();
        let oid2 = write_tree(&reversed, &store2).unwrap();
        assert_eq!(oid1, oid2);
    }

    #[test]
    fn nested_paths_produce_subtrees() {
        let (_dir, store) = scratch();

        let entries = vec![
            entry("src/a.txt", D_A, 0o100644),
            entry("src/b.txt", D_B, 0o100644),
            entry("README.md", D_A, 0o100644),
        ];

        let root_oid = write_tree(&entries, &store).unwrap();
        let root = match store.read(&root_oid).unwrap().unwrap() {
            mingit_object::Object::Tree(t) => t,
            other => panic!("expected tree, got {:?}", other.object_type()),
        };

        assert_eq!(root.len(), 2);
        assert_eq!(root.entries[0].name, "README.md");
        assert_eq!(root.entries[1].name, "src");
        assert!(root.entries[1].mode.is_tree());

        let src = match store.read(&root.entries[1].oid).unwrap().unwrap() {
            mingit_object::Object::Tree(t) => t,
            other => panic!("expected tree, got {:?}", other.object_type()),
        };
        assert_eq!(src.entries[0].name, "a.txt");
        assert_eq!(src.entries[1].name, "b.txt");
    }

    #[test]
    fn subtree_written_before_parent() {
        // The root tree embeds the subtree's OID, so the subtree object must
        // already exist when the root is written; reading the root's entry
        // back out of the store proves the ordering held.
        let (_dir, store) = scratch();
        let entries = vec![entry("deep/nested/file", D_A, 0o100644)];
        let root_oid = write_tree(&entries, &store).unwrap();

        let mut oid = root_oid;
        for expected in ["deep", "nested"] {
            let tree = match store.read(&oid).unwrap().unwrap() {
                mingit_object::Object::Tree(t) => t,
                _ => panic!("expected tree"),
            };
            assert_eq!(tree.entries[0].name, expected);
            assert!(store.contains(&tree.entries[0].oid));
            oid = tree.entries[0].oid;
        }
    }

    #[test]
    fn identical_subtrees_share_one_object() {
        let (dir, store) = scratch();
        let entries = vec![
            entry("left/same.txt", D_A, 0o100644),
            entry("right/same.txt", D_A, 0o100644),
        ];
        write_tree(&entries, &store).unwrap();

        // Root + one shared subtree = two tree objects total.
        let mut tree_count = 0;
        for fan in std::fs::read_dir(dir.path()).unwrap() {
            let fan = fan.unwrap();
            let prefix = fan.file_name().to_string_lossy().into_owned();
            for obj in std::fs::read_dir(fan.path()).unwrap() {
                let hex = format!("{}{}", prefix, obj.unwrap().file_name().to_string_lossy());
                let oid = ObjectId::from_hex(&hex).unwrap();
                if let Some((ObjectType::Tree, _)) = store.read_header(&oid).unwrap() {
                    tree_count += 1;
                }
            }
        }
        assert_eq!(tree_count, 2);
    }

    #[test]
    fn empty_index_writes_empty_tree() {
        let (_dir, store) = scratch();
        let oid = write_tree(&[], &store).unwrap();
        assert_eq!(oid.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    }

    #[test]
    fn executable_mode_serialized() {
        let (_dir, store) = scratch();
        let entries = vec![entry("run.sh", D_A, 0o100755)];
        let root_oid = write_tree(&entries, &store).unwrap();

        let tree = match store.read(&root_oid).unwrap().unwrap() {
            mingit_object::Object::Tree(t) => t,
            _ => panic!("expected tree"),
        };
        assert_eq!(tree.entries[0].mode, FileMode::Executable);
    }

    #[test]
    fn duplicate_leaf_rejected() {
        let (_dir, store) = scratch();
        let entries = vec![
            entry("a.txt", D_A, 0o100644),
            entry("a.txt", D_B, 0o100644),
        ];
        assert!(matches!(
            write_tree(&entries, &store).unwrap_err(),
            IndexError::DuplicateEntry(_)
        ));
    }

    #[test]
    fn file_colliding_with_directory_rejected() {
        let (_dir, store) = scratch();
        let entries = vec![
            entry("a", D_A, 0o100644),
            entry("a/b.txt", D_B, 0o100644),
        ];
        assert!(matches!(
            write_tree(&entries, &store).unwrap_err(),
            IndexError::DuplicateEntry(_)
        ));
    }

    #[test]
    fn empty_path_component_rejected() {
        let (_dir, store) = scratch();
        for bad in ["/leading", "mid//dle", "trailing/"] {
            let entries = vec![entry(bad, D_A, 0o100644)];
            assert!(
                matches!(
                    write_tree(&entries, &store).unwrap_err(),
                    IndexError::MalformedPath(_)
                ),
                "path {bad:?} should be rejected"
            );
        }
    }
}
