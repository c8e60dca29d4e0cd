use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ledger_block::{Block, BlockHeader};
use ledger_chain::Checkpoint;
use ledger_core::{LedgerError, NodeId};

use crate::store::Store;

/// Pure in-memory `Store`, used by unit tests across the workspace in
/// place of a real `SledStore`.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    blocks: HashMap<u64, Block>,
    headers: HashMap<u64, BlockHeader>,
    checkpoints: HashMap<u64, Checkpoint>,
    keys: HashMap<NodeId, Vec<u8>>,
    metadata: HashMap<String, serde_json::Value>,
    schema_version: u32,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn put_block(&self, block: &Block) -> Result<(), LedgerError> {
        self.inner.lock().unwrap().blocks.insert(block.header.index, block.clone());
        Ok(())
    }

    async fn get_block(&self, index: u64) -> Result<Option<Block>, LedgerError> {
        Ok(self.inner.lock().unwrap().blocks.get(&index).cloned())
    }

    async fn delete_blocks_before(&self, up_to_index: u64) -> Result<(), LedgerError> {
        self.inner.lock().unwrap().blocks.retain(|index, _| *index >= up_to_index);
        Ok(())
    }

    async fn put_header(&self, header: &BlockHeader) -> Result<(), LedgerError> {
        self.inner.lock().unwrap().headers.insert(header.index, header.clone());
        Ok(())
    }

    async fn get_header(&self, index: u64) -> Result<Option<BlockHeader>, LedgerError> {
        Ok(self.inner.lock().unwrap().headers.get(&index).cloned())
    }

    async fn headers_range(&self, from: u64, to: u64) -> Result<Vec<BlockHeader>, LedgerError> {
        let inner = self.inner.lock().unwrap();
        let mut out: Vec<BlockHeader> = inner
            .headers
            .iter()
            .filter(|(index, _)| **index >= from && **index < to)
            .map(|(_, header)| header.clone())
            .collect();
        out.sort_by_key(|h| h.index);
        Ok(out)
    }

    async fn put_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), LedgerError> {
        self.inner.lock().unwrap().checkpoints.insert(checkpoint.index, checkpoint.clone());
        Ok(())
    }

    async fn get_checkpoint(&self, index: u64) -> Result<Option<Checkpoint>, LedgerError> {
        Ok(self.inner.lock().unwrap().checkpoints.get(&index).cloned())
    }

    async fn latest_checkpoint(&self) -> Result<Option<Checkpoint>, LedgerError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .checkpoints
            .values()
            .max_by_key(|c| c.index)
            .cloned())
    }

    async fn put_key_pair(&self, node_id: &NodeId, wrapped: &[u8]) -> Result<(), LedgerError> {
        self.inner.lock().unwrap().keys.insert(node_id.clone(), wrapped.to_vec());
        Ok(())
    }

    async fn get_key_pair(&self, node_id: &NodeId) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.inner.lock().unwrap().keys.get(node_id).cloned())
    }

    async fn put_metadata(&self, key: &str, value: serde_json::Value) -> Result<(), LedgerError> {
        self.inner.lock().unwrap().metadata.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_metadata(&self, key: &str) -> Result<Option<serde_json::Value>, LedgerError> {
        Ok(self.inner.lock().unwrap().metadata.get(key).cloned())
    }

    async fn schema_version(&self) -> Result<u32, LedgerError> {
        Ok(self.inner.lock().unwrap().schema_version)
    }

    async fn set_schema_version(&self, version: u32) -> Result<(), LedgerError> {
        self.inner.lock().unwrap().schema_version = version;
        Ok(())
    }
}
