//! A header-only chain client (spec.md §4.9): tracks validated block
//! headers without ever storing full transaction bodies, and trusts an
//! individual transaction only after verifying a Merkle proof against the
//! relevant header's `merkleRoot`.

use std::collections::BTreeMap;

use ledger_block::{BlockHeader, MerkleProof};
use ledger_core::{BlockHash, LedgerError};
use tracing::warn;

#[derive(Debug, Default)]
pub struct LightClient {
    headers: BTreeMap<u64, BlockHeader>,
    /// Computed hash of the current tip header, tracked separately since
    /// `BlockHeader` doesn't carry its own hash.
    tip_hash: Option<BlockHash>,
}

impl LightClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> u64 {
        self.headers.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn header(&self, index: u64) -> Option<&BlockHeader> {
        self.headers.get(&index)
    }

    pub fn tip(&self) -> Option<&BlockHeader> {
        self.headers.values().next_back()
    }

    /// Append a contiguous run of headers to the tracked chain, validating
    /// linkage (spec.md §3.2 invariant #1, headers-only variant) before
    /// accepting any of them: each header's own computed hash must chain
    /// into the next header's `previousHash`. Rejects the whole batch on
    /// the first violation, leaving prior state untouched.
    pub fn ingest_headers(&mut self, new_headers: Vec<BlockHeader>) -> Result<(), LedgerError> {
        if new_headers.is_empty() {
            return Ok(());
        }
        let mut expected_index = self.tip().map(|h| h.index + 1).unwrap_or(0);
        let mut expected_previous_hash = self.tip_hash.clone();

        for header in &new_headers {
            if header.index != expected_index {
                return Err(LedgerError::IndexMismatch {
                    expected: expected_index,
                    got: header.index,
                });
            }
            if expected_index == 0 {
                if header.previous_hash.is_some() {
                    return Err(LedgerError::InvalidBlock(
                        "genesis header must not carry a previousHash".into(),
                    ));
                }
            } else if header.previous_hash != expected_previous_hash {
                return Err(LedgerError::PreviousHashMismatch);
            }
            expected_index += 1;
            expected_previous_hash = Some(header.compute_hash());
        }

        let new_tip_hash = expected_previous_hash;
        for header in new_headers {
            self.headers.insert(header.index, header);
        }
        self.tip_hash = new_tip_hash;
        Ok(())
    }

    /// Verify that `leaf` (the hash of some transaction) is included under
    /// `header[block_index].merkleRoot` via `proof`. Rejects if the header
    /// is absent or the reconstructed root differs.
    pub fn verify_transaction(
        &self,
        block_index: u64,
        leaf: &BlockHash,
        proof: &MerkleProof,
    ) -> Result<bool, LedgerError> {
        let Some(header) = self.header(block_index) else {
            warn!(block_index, "light client has no header for this index");
            return Err(LedgerError::UnknownBlockIndex(block_index));
        };
        Ok(ledger_block::verify_proof(leaf, proof, &header.merkle_root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_block::{build_proof, leaf_hash, Block};
    use ledger_core::{tags, Event, GenesisPayload, KarmaEarnPayload, NodeId};

    fn chain_of(n: u64) -> Vec<Block> {
        let mut blocks = Vec::new();
        let genesis_tx = Event::unsigned(0, NodeId::new("node_g"), tags::GENESIS, GenesisPayload {
            unique_marker: "m".into(),
        });
        let genesis = Block::assemble(0, 0, None, NodeId::new("node_g"), 0, vec![genesis_tx]);
        let mut previous = genesis.clone();
        blocks.push(genesis);
        for i in 1..n {
            let tx = Event::unsigned(i as i64, NodeId::new("node_g"), tags::KARMA_EARN, KarmaEarnPayload {
                recipient: NodeId::new("nA"),
                amount: i,
                activity: "x".into(),
            });
            let block = Block::assemble(i, i as i64, Some(previous.hash.clone()), NodeId::new("node_g"), 0, vec![tx]);
            previous = block.clone();
            blocks.push(block);
        }
        blocks
    }

    #[test]
    fn ingests_headers_and_verifies_a_transaction() {
        let blocks = chain_of(3);
        let mut client = LightClient::new();
        client
            .ingest_headers(blocks.iter().map(|b| b.header.clone()).collect())
            .unwrap();
        assert_eq!(client.len(), 3);

        let block = &blocks[2];
        let proof = build_proof(&block.transactions, 0).unwrap();
        let leaf = leaf_hash(&block.transactions[0]);
        assert!(client.verify_transaction(2, &leaf, &proof).unwrap());
    }

    #[test]
    fn rejects_proof_against_missing_header() {
        let client = LightClient::new();
        let blocks = chain_of(1);
        let proof = build_proof(&blocks[0].transactions, 0).unwrap();
        let leaf = leaf_hash(&blocks[0].transactions[0]);
        assert!(client.verify_transaction(0, &leaf, &proof).is_err());
    }

    #[test]
    fn rejects_noncontiguous_header_batch() {
        let blocks = chain_of(2);
        let mut client = LightClient::new();
        let err = client.ingest_headers(vec![blocks[1].header.clone()]);
        assert!(err.is_err());
    }
}
