use ledger_core::{BlockHash, Event, NodeId, Timestamp};
use ledger_crypto::hash_to_block_hash;
use serde::{Deserialize, Serialize};

use crate::merkle::merkle_root;

/// Block header fields (spec.md §3.1). `previousHash` is `None` only for
/// the index-0 genesis block.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockHeader {
    pub index: u64,
    pub timestamp: Timestamp,
    pub previous_hash: Option<BlockHash>,
    pub merkle_root: BlockHash,
    pub proposer: NodeId,
    pub nonce: u64,
}

impl BlockHeader {
    /// Deterministic SHA-256 hash over the canonical encoding of every
    /// header field (spec.md §4.1, §6.1).
    pub fn compute_hash(&self) -> BlockHash {
        let bytes = ledger_core::canonical::to_canonical_bytes(self);
        hash_to_block_hash(&bytes)
    }
}

/// A full block: header plus an ordered transaction body. Typically one
/// transaction per block, but the body must support many (spec.md §3.1).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub hash: BlockHash,
    pub transactions: Vec<Event>,
}

impl Block {
    /// Assemble a block from its constituent parts, computing the Merkle
    /// root over transaction hashes and the header hash. This is the only
    /// path that produces a `Block` — the header hash is always consistent
    /// with its contents by construction.
    pub fn assemble(
        index: u64,
        timestamp: Timestamp,
        previous_hash: Option<BlockHash>,
        proposer: NodeId,
        nonce: u64,
        transactions: Vec<Event>,
    ) -> Self {
        let root = merkle_root(&transactions);
        let header = BlockHeader {
            index,
            timestamp,
            previous_hash,
            merkle_root: root,
            proposer,
            nonce,
        };
        let hash = header.compute_hash();
        Block {
            header,
            hash,
            transactions,
        }
    }

    /// Recompute the header hash and Merkle root, returning whether both
    /// still match the stored `hash`/`merkle_root` — the integrity check
    /// spec.md §3.2 invariant #2 requires.
    pub fn verify_integrity(&self) -> bool {
        let recomputed_root = merkle_root(&self.transactions);
        if recomputed_root != self.header.merkle_root {
            return false;
        }
        self.header.compute_hash() == self.hash
    }
}
