use ledger_core::{BlockHash, NodeId, NODE_ID_HEX_PREFIX_LEN, NODE_ID_PREFIX};
use sha2::{Digest, Sha256};

/// Compute SHA-256 of arbitrary bytes → 32-byte array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// `node_id = "node_" || hex(SHA-256(raw_public_key))[0:16]` (spec.md §4.1).
pub fn node_id_from_pubkey(pubkey_bytes: &[u8]) -> NodeId {
    let digest = sha256(pubkey_bytes);
    let hex_digest = hex::encode(digest);
    NodeId::new(format!(
        "{}{}",
        NODE_ID_PREFIX,
        &hex_digest[..NODE_ID_HEX_PREFIX_LEN]
    ))
}

/// Hash arbitrary canonical bytes into a `BlockHash`. Used for block headers
/// and for hashing individual transactions into Merkle leaves.
pub fn hash_to_block_hash(data: &[u8]) -> BlockHash {
    BlockHash::from_bytes(sha256(data))
}
