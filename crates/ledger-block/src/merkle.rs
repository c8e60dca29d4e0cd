use ledger_core::{BlockHash, Event};
use ledger_crypto::hash_to_block_hash;
use serde::{Deserialize, Serialize};

/// Hash a single transaction into its Merkle leaf value: SHA-256 over the
/// canonical encoding of the full signed event (spec.md §4.6).
pub fn leaf_hash(event: &Event) -> BlockHash {
    let bytes = ledger_core::canonical::to_canonical_bytes(event);
    hash_to_block_hash(&bytes)
}

/// Root of an empty body. Distinct from any real leaf hash by construction
/// (hashes an empty byte string rather than zero bytes).
fn empty_root() -> BlockHash {
    hash_to_block_hash(&[])
}

/// One step of a Merkle sibling path: the sibling's hash, and whether that
/// sibling sits to the left of the node being folded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub sibling: BlockHash,
    pub sibling_is_left: bool,
}

/// A sibling-path Merkle proof for a single leaf.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MerkleProof {
    pub leaf_index: usize,
    pub steps: Vec<ProofStep>,
}

fn combine(left: &BlockHash, right: &BlockHash) -> BlockHash {
    let mut bytes = Vec::with_capacity(64);
    bytes.extend_from_slice(left.as_bytes());
    bytes.extend_from_slice(right.as_bytes());
    hash_to_block_hash(&bytes)
}

/// Fold one tree level into the next, duplicating the trailing node when
/// the level has an odd width (the conventional odd-leaf rule — see
/// `crate::merkle` module docs for why this must match proof generation).
fn fold_level(level: &[BlockHash]) -> Vec<BlockHash> {
    let mut next = Vec::with_capacity(level.len().div_ceil(2));
    let mut i = 0;
    while i < level.len() {
        let left = &level[i];
        let right = if i + 1 < level.len() {
            &level[i + 1]
        } else {
            &level[i]
        };
        next.push(combine(left, right));
        i += 2;
    }
    next
}

/// Compute the Merkle root over a block's transaction list.
pub fn merkle_root(transactions: &[Event]) -> BlockHash {
    if transactions.is_empty() {
        return empty_root();
    }
    let mut level: Vec<BlockHash> = transactions.iter().map(leaf_hash).collect();
    while level.len() > 1 {
        level = fold_level(&level);
    }
    level.into_iter().next().expect("non-empty level reduces to one root")
}

/// Produce the sibling-path proof from `leaf_index`'s transaction to the
/// root. Returns `None` if the index is out of range.
pub fn build_proof(transactions: &[Event], leaf_index: usize) -> Option<MerkleProof> {
    if leaf_index >= transactions.len() {
        return None;
    }
    let mut level: Vec<BlockHash> = transactions.iter().map(leaf_hash).collect();
    let mut index = leaf_index;
    let mut steps = Vec::new();

    while level.len() > 1 {
        let pair_index = if index % 2 == 0 { index + 1 } else { index - 1 };
        let sibling_is_left = index % 2 == 1;
        let sibling = if pair_index < level.len() {
            level[pair_index].clone()
        } else {
            level[index].clone()
        };
        steps.push(ProofStep {
            sibling,
            sibling_is_left,
        });
        level = fold_level(&level);
        index /= 2;
    }

    Some(MerkleProof { leaf_index, steps })
}

/// Reconstruct the root implied by `proof` starting from `leaf`, and
/// compare it to `expected_root`. This is the light-client side of
/// spec.md §4.6/§4.9 — it never touches the full transaction body.
pub fn verify_proof(leaf: &BlockHash, proof: &MerkleProof, expected_root: &BlockHash) -> bool {
    let mut current = leaf.clone();
    for step in &proof.steps {
        current = if step.sibling_is_left {
            combine(&step.sibling, &current)
        } else {
            combine(&current, &step.sibling)
        };
    }
    &current == expected_root
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{tags, KarmaEarnPayload, NodeId};

    fn make_event(i: u64) -> Event {
        Event::unsigned(
            1000 + i as i64,
            NodeId::new(format!("node_{i:016x}")),
            tags::KARMA_EARN,
            KarmaEarnPayload {
                recipient: NodeId::new("node_aaaaaaaaaaaaaaaa"),
                amount: i,
                activity: "test".into(),
            },
        )
    }

    #[test]
    fn single_transaction_proof_verifies() {
        let txs = vec![make_event(1)];
        let root = merkle_root(&txs);
        let proof = build_proof(&txs, 0).unwrap();
        assert!(verify_proof(&leaf_hash(&txs[0]), &proof, &root));
    }

    #[test]
    fn every_leaf_in_odd_sized_body_verifies() {
        let txs: Vec<Event> = (0..5).map(make_event).collect();
        let root = merkle_root(&txs);
        for i in 0..txs.len() {
            let proof = build_proof(&txs, i).unwrap();
            assert!(verify_proof(&leaf_hash(&txs[i]), &proof, &root));
        }
    }

    #[test]
    fn proof_does_not_verify_under_different_root() {
        let txs: Vec<Event> = (0..4).map(make_event).collect();
        let other_txs: Vec<Event> = (10..14).map(make_event).collect();
        let other_root = merkle_root(&other_txs);
        let proof = build_proof(&txs, 1).unwrap();
        assert!(!verify_proof(&leaf_hash(&txs[1]), &proof, &other_root));
    }

    #[test]
    fn out_of_range_index_returns_none() {
        let txs = vec![make_event(1)];
        assert!(build_proof(&txs, 5).is_none());
    }
}
