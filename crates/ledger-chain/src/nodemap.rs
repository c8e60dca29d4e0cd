use std::collections::HashMap;

use ledger_core::{NodeId, ParentAction};

use crate::state::{JoinRecord, NodeMapEntry, ParentUpdateRecord};

/// Fold the accumulated join/parent-update event stream into a node map
/// (spec.md §4.2, Design Notes §9). A pure function: same inputs always
/// yield the same map, which is what lets `replace_chain` rebuild it from
/// scratch instead of patching it incrementally.
///
/// `NODE_JOIN` events are consumed in chain order; only the first
/// occurrence of a given node id establishes the node (invariant #7 —
/// duplicate joins are ignored).
///
/// `NODE_PARENT_UPDATE` events are consumed sorted by `timestamp`, ties
/// broken by `seq` (the transaction's position in chain-replay order).
/// Design Notes §9 raises this as an open question and resolves it in
/// favor of timestamp order: sort key is `timestamp`, not chain order,
/// and `seq` exists only to make the sort stable when two updates share a
/// timestamp.
pub fn build(
    joins: &[JoinRecord],
    parent_updates: &[ParentUpdateRecord],
) -> HashMap<NodeId, NodeMapEntry> {
    let mut map: HashMap<NodeId, NodeMapEntry> = HashMap::new();

    for j in joins {
        map.entry(j.node_id.clone()).or_insert_with(|| NodeMapEntry {
            name: j.name.clone(),
            public_key: j.public_key.clone(),
            parent_ids: j.parent_id.clone().into_iter().collect(),
            child_count: 0,
            created_at: j.created_at,
            recovery_phrase_hash: j.recovery_phrase_hash.clone(),
        });
    }

    let mut updates: Vec<&ParentUpdateRecord> = parent_updates.iter().collect();
    updates.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.seq.cmp(&b.seq)));

    for u in updates {
        let Some(entry) = map.get_mut(&u.node_id) else {
            continue;
        };
        match u.action {
            ParentAction::Add => {
                if let Some(p) = &u.parent_id {
                    if !entry.parent_ids.contains(p) {
                        entry.parent_ids.push(p.clone());
                    }
                }
            }
            ParentAction::Remove => {
                if let Some(p) = &u.parent_id {
                    entry.parent_ids.retain(|x| x != p);
                }
            }
            ParentAction::Set => {
                entry.parent_ids = u.parent_id.clone().into_iter().collect();
            }
        }
    }

    let mut child_counts: HashMap<NodeId, u64> = HashMap::new();
    for entry in map.values() {
        for parent in &entry.parent_ids {
            *child_counts.entry(parent.clone()).or_insert(0) += 1;
        }
    }
    for (id, entry) in map.iter_mut() {
        entry.child_count = child_counts.get(id).copied().unwrap_or(0);
    }

    map
}
