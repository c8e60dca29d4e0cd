pub mod mem;
pub mod sled_store;
pub mod store;

pub use mem::MemStore;
pub use sled_store::SledStore;
pub use store::{metadata_keys, Store};

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_block::Block;
    use ledger_chain::Checkpoint;
    use ledger_core::{tags, Event, GenesisPayload, NodeId};

    fn genesis_block() -> Block {
        let event = Event::unsigned(1, NodeId::new("node_genesis"), tags::GENESIS, GenesisPayload {
            unique_marker: "alpha".into(),
        });
        Block::assemble(0, 1, None, NodeId::new("node_genesis"), 0, vec![event])
    }

    #[tokio::test]
    async fn mem_store_round_trips_a_block() {
        let store = MemStore::new();
        let block = genesis_block();
        store.put_block(&block).await.unwrap();
        let loaded = store.get_block(0).await.unwrap().unwrap();
        assert_eq!(loaded.hash, block.hash);
        assert!(store.get_block(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mem_store_metadata_round_trip() {
        let store = MemStore::new();
        store
            .put_metadata(metadata_keys::KARMA_BALANCES, serde_json::json!({"nA": 5}))
            .await
            .unwrap();
        let loaded = store.get_metadata(metadata_keys::KARMA_BALANCES).await.unwrap().unwrap();
        assert_eq!(loaded["nA"], 5);
    }

    #[tokio::test]
    async fn sled_store_round_trips_blocks_and_checkpoints() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        let block = genesis_block();
        store.put_block(&block).await.unwrap();
        let loaded = store.get_block(0).await.unwrap().unwrap();
        assert_eq!(loaded.hash, block.hash);

        let checkpoint = Checkpoint {
            index: 0,
            hash: block.hash.clone(),
            previous_hash: None,
            timestamp: block.header.timestamp,
            proposer: block.header.proposer.clone(),
        };
        store.put_checkpoint(&checkpoint).await.unwrap();
        let latest = store.latest_checkpoint().await.unwrap().unwrap();
        assert_eq!(latest.index, 0);
    }

    #[tokio::test]
    async fn sled_store_prunes_old_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        let mut previous = genesis_block();
        store.put_block(&previous).await.unwrap();
        for i in 1..5 {
            let event = Event::unsigned(
                i as i64,
                NodeId::new("node_genesis"),
                tags::KARMA_UBI,
                ledger_core::KarmaUbiPayload {
                    recipient: NodeId::new("nA"),
                    amount: 1,
                },
            );
            let block = Block::assemble(i, i as i64, Some(previous.hash.clone()), NodeId::new("node_genesis"), 0, vec![event]);
            store.put_block(&block).await.unwrap();
            previous = block;
        }
        store.delete_blocks_before(3).await.unwrap();
        assert!(store.get_block(2).await.unwrap().is_none());
        assert!(store.get_block(3).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn schema_version_defaults_to_zero_then_persists() {
        let store = MemStore::new();
        assert_eq!(store.schema_version().await.unwrap(), 0);
        store.set_schema_version(1).await.unwrap();
        assert_eq!(store.schema_version().await.unwrap(), 1);
    }
}
