//! Resolving a parsed pack into the loose object store.
//!
//! Base objects persist immediately in file order. Deltas are buffered
//! and resolved in passes: an `OFS_DELTA` finds its base by absolute pack
//! offset, a `REF_DELTA` against anything already persisted (from this
//! pack or before). Every resolved object carries its delta-chain depth;
//! a chain growing past the bound is rejected.

use std::collections::HashMap;

use mingit_hash::ObjectId;
use mingit_loose::LooseObjectStore;
use mingit_object::ObjectType;

use crate::delta::apply_delta;
use crate::parse::{parse_pack, RawEntry, RawEntryKind};
use crate::{PackError, MAX_DELTA_CHAIN_DEPTH};

/// An object persisted during this unpack, with the length of the delta
/// chain that produced it (0 for full objects).
#[derive(Clone, Copy)]
struct Resolved {
    obj_type: ObjectType,
    oid: ObjectId,
    depth: usize,
}

/// Parse `pack` and persist every contained object into `store`.
///
/// Returns the OIDs of all persisted objects, exactly one per entry
/// declared in the pack header. A reconstructed delta is framed with the
/// type of its ultimate base (a delta of a tree is a tree).
pub fn unpack_into(pack: &[u8], store: &LooseObjectStore) -> Result<Vec<ObjectId>, PackError> {
    let parsed = parse_pack(pack)?;

    let mut oids = Vec::with_capacity(parsed.num_objects as usize);
    // Lookup tables for delta bases: by pack offset for OFS_DELTA, by
    // OID for REF_DELTA chains within this pack.
    let mut by_offset: HashMap<u64, Resolved> = HashMap::new();
    let mut depth_by_oid: HashMap<ObjectId, usize> = HashMap::new();
    let mut pending: Vec<RawEntry> = Vec::new();

    for entry in parsed.entries {
        match entry.kind {
            RawEntryKind::Base(obj_type) => {
                let oid = store.write_raw(obj_type, &entry.data)?;
                by_offset.insert(
                    entry.offset,
                    Resolved {
                        obj_type,
                        oid,
                        depth: 0,
                    },
                );
                depth_by_oid.insert(oid, 0);
                oids.push(oid);
            }
            RawEntryKind::OfsDelta { .. } | RawEntryKind::RefDelta { .. } => {
                pending.push(entry);
            }
        }
    }

    // Passes repeat until fixpoint: a delta resolves once its base has
    // been persisted, which may itself happen mid-pass or a pass later.
    while !pending.is_empty() {
        let mut unresolved = Vec::new();
        let mut progressed = false;

        for entry in pending {
            let base = match &entry.kind {
                RawEntryKind::OfsDelta { base_offset } => by_offset.get(base_offset).copied(),
                RawEntryKind::RefDelta { base_oid } => {
                    store.read_header(base_oid)?.map(|(obj_type, _)| Resolved {
                        obj_type,
                        oid: *base_oid,
                        // Objects that predate this pack are full objects.
                        depth: depth_by_oid.get(base_oid).copied().unwrap_or(0),
                    })
                }
                RawEntryKind::Base(_) => unreachable!("bases were persisted in the first pass"),
            };

            match base {
                Some(base) => {
                    let depth = base.depth + 1;
                    if depth > MAX_DELTA_CHAIN_DEPTH {
                        return Err(PackError::DeltaChainTooDeep {
                            offset: entry.offset,
                            max_depth: MAX_DELTA_CHAIN_DEPTH,
                        });
                    }

                    let (_, base_content) = store
                        .read_raw(&base.oid)?
                        .ok_or(PackError::MissingBase(base.oid))?;
                    let target = apply_delta(&base_content, &entry.data)?;
                    let oid = store.write_raw(base.obj_type, &target)?;

                    by_offset.insert(
                        entry.offset,
                        Resolved {
                            obj_type: base.obj_type,
                            oid,
                            depth,
                        },
                    );
                    depth_by_oid.insert(oid, depth);
                    oids.push(oid);
                    progressed = true;
                }
                None => unresolved.push(entry),
            }
        }

        if !progressed && !unresolved.is_empty() {
            return Err(match &unresolved[0].kind {
                RawEntryKind::RefDelta { base_oid } => PackError::MissingBase(*base_oid),
                _ => PackError::CorruptEntry(unresolved[0].offset),
            });
        }

        pending = unresolved;
    }

    Ok(oids)
}
