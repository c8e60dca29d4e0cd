pub mod block;
pub mod merkle;

pub use block::{Block, BlockHeader};
pub use merkle::{build_proof, leaf_hash, merkle_root, verify_proof, MerkleProof, ProofStep};

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{tags, Event, GenesisPayload, NodeId};

    fn genesis_event(marker: &str) -> Event {
        Event::unsigned(
            1_700_000_000,
            NodeId::new("node_genesis0000000"),
            tags::GENESIS,
            GenesisPayload {
                unique_marker: marker.into(),
            },
        )
    }

    #[test]
    fn genesis_block_has_no_previous_hash() {
        let block = Block::assemble(
            0,
            1_700_000_000,
            None,
            NodeId::new("node_genesis0000000"),
            0,
            vec![genesis_event("alpha")],
        );
        assert!(block.header.previous_hash.is_none());
        assert_eq!(block.header.index, 0);
        assert!(block.verify_integrity());
    }

    #[test]
    fn tampering_with_body_breaks_integrity() {
        let mut block = Block::assemble(
            0,
            1_700_000_000,
            None,
            NodeId::new("node_genesis0000000"),
            0,
            vec![genesis_event("alpha")],
        );
        block.transactions.push(genesis_event("beta"));
        assert!(!block.verify_integrity());
    }

    #[test]
    fn chained_block_hash_is_deterministic() {
        let genesis = Block::assemble(
            0,
            1_700_000_000,
            None,
            NodeId::new("node_genesis0000000"),
            0,
            vec![genesis_event("alpha")],
        );
        let next = Block::assemble(
            1,
            1_700_000_010,
            Some(genesis.hash.clone()),
            NodeId::new("node_genesis0000000"),
            0,
            vec![genesis_event("ignored-here")],
        );
        assert_eq!(next.header.previous_hash, Some(genesis.hash));
        let recomputed = next.header.compute_hash();
        assert_eq!(recomputed, next.hash);
    }
}
