use ledger_block::{build_proof, leaf_hash, BlockHeader, MerkleProof};
use ledger_core::{BlockHash, Event, LedgerError};

use crate::engine::Chain;

/// A transaction located within the chain together with its Merkle proof
/// (spec.md §4.6). `transaction_id` used for lookup is the hex-rendered
/// leaf hash of the canonical event — the chain has no separate id field
/// for transactions, so the deterministic hash over its signed content
/// doubles as its identifier.
pub struct TransactionProof {
    pub block_index: u64,
    pub block_hash: BlockHash,
    pub header: BlockHeader,
    pub transaction_index: usize,
    pub transaction: Event,
    pub proof: MerkleProof,
}

/// Locate the transaction identified by `transaction_id` (and optionally
/// narrowed to `block_index`), and produce its sibling-path Merkle proof.
pub fn prove_transaction(
    chain: &Chain,
    block_index: Option<u64>,
    transaction_id: &str,
) -> Result<TransactionProof, LedgerError> {
    let candidates: Box<dyn Iterator<Item = &ledger_block::Block>> = match block_index {
        Some(index) => {
            let offset = index.checked_sub(chain.pruned_before());
            let block = offset
                .and_then(|o| chain.blocks().get(o as usize))
                .ok_or(LedgerError::UnknownBlockIndex(index))?;
            Box::new(std::iter::once(block))
        }
        None => Box::new(chain.blocks().iter()),
    };

    for block in candidates {
        for (i, tx) in block.transactions.iter().enumerate() {
            if leaf_hash(tx).to_hex() == transaction_id {
                let proof = build_proof(&block.transactions, i)
                    .expect("index came from iterating this exact transaction list");
                return Ok(TransactionProof {
                    block_index: block.header.index,
                    block_hash: block.hash.clone(),
                    header: block.header.clone(),
                    transaction_index: i,
                    transaction: tx.clone(),
                    proof,
                });
            }
        }
    }

    Err(LedgerError::UnknownTransaction(transaction_id.to_string()))
}

/// Light-client-side verification (spec.md §4.6, §4.9): reconstruct the
/// root from `proof` starting at `leaf`, and compare to the header's
/// `merkleRoot`. Assumes the header chain has already been validated
/// separately.
pub fn verify_transaction_proof(leaf: &BlockHash, proof: &MerkleProof, header: &BlockHeader) -> bool {
    ledger_block::verify_proof(leaf, proof, &header.merkle_root)
}
