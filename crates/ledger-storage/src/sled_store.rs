use std::path::Path;

use async_trait::async_trait;
use ledger_block::{Block, BlockHeader};
use ledger_chain::Checkpoint;
use ledger_core::{LedgerError, NodeId};

use crate::store::Store;

/// `sled`-backed `Store`, using a tree-per-concern layout: one named tree
/// per logical object store, plus a `meta` tree for the schema version and
/// the opaque metadata bag. Async entry points wrap the blocking `sled`
/// calls in
/// `tokio::task::spawn_blocking` — `sled::Tree` clones are cheap (an `Arc`
/// internally), so each call clones the tree handle it needs into the
/// blocking closure.
pub struct SledStore {
    _db: sled::Db,
    blocks: sled::Tree,
    headers: sled::Tree,
    checkpoints: sled::Tree,
    keys: sled::Tree,
    meta: sled::Tree,
}

const SCHEMA_VERSION_KEY: &[u8] = b"__schema_version";

impl SledStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let db = sled::open(path).map_err(LedgerError::storage)?;
        let blocks = db.open_tree("blocks").map_err(LedgerError::storage)?;
        let headers = db.open_tree("headers").map_err(LedgerError::storage)?;
        let checkpoints = db.open_tree("checkpoints").map_err(LedgerError::storage)?;
        let keys = db.open_tree("keys").map_err(LedgerError::storage)?;
        let meta = db.open_tree("meta").map_err(LedgerError::storage)?;
        Ok(Self {
            _db: db,
            blocks,
            headers,
            checkpoints,
            keys,
            meta,
        })
    }
}

fn index_key(index: u64) -> [u8; 8] {
    index.to_be_bytes()
}

async fn blocking<F, T>(f: F) -> Result<T, LedgerError>
where
    F: FnOnce() -> Result<T, LedgerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| LedgerError::Storage(e.to_string()))?
}

#[async_trait]
impl Store for SledStore {
    async fn put_block(&self, block: &Block) -> Result<(), LedgerError> {
        let tree = self.blocks.clone();
        let key = index_key(block.header.index);
        let bytes = serde_json::to_vec(block).map_err(|e| LedgerError::Storage(e.to_string()))?;
        blocking(move || {
            tree.insert(key, bytes).map_err(LedgerError::storage)?;
            Ok(())
        })
        .await
    }

    async fn get_block(&self, index: u64) -> Result<Option<Block>, LedgerError> {
        let tree = self.blocks.clone();
        let key = index_key(index);
        blocking(move || {
            let Some(bytes) = tree.get(key).map_err(LedgerError::storage)? else {
                return Ok(None);
            };
            let block = serde_json::from_slice(&bytes).map_err(|e| LedgerError::Storage(e.to_string()))?;
            Ok(Some(block))
        })
        .await
    }

    async fn put_blocks(&self, blocks: &[Block]) -> Result<(), LedgerError> {
        let tree = self.blocks.clone();
        let mut batch = sled::Batch::default();
        for block in blocks {
            let key = index_key(block.header.index);
            let bytes = serde_json::to_vec(block).map_err(|e| LedgerError::Storage(e.to_string()))?;
            batch.insert(&key, bytes);
        }
        blocking(move || {
            tree.apply_batch(batch).map_err(LedgerError::storage)?;
            Ok(())
        })
        .await
    }

    async fn delete_blocks_before(&self, up_to_index: u64) -> Result<(), LedgerError> {
        let tree = self.blocks.clone();
        blocking(move || {
            let keys: Vec<sled::IVec> = tree
                .range(..index_key(up_to_index))
                .filter_map(|r| r.ok())
                .map(|(k, _)| k)
                .collect();
            for key in keys {
                tree.remove(key).map_err(LedgerError::storage)?;
            }
            Ok(())
        })
        .await
    }

    async fn put_header(&self, header: &BlockHeader) -> Result<(), LedgerError> {
        let tree = self.headers.clone();
        let key = index_key(header.index);
        let bytes = serde_json::to_vec(header).map_err(|e| LedgerError::Storage(e.to_string()))?;
        blocking(move || {
            tree.insert(key, bytes).map_err(LedgerError::storage)?;
            Ok(())
        })
        .await
    }

    async fn get_header(&self, index: u64) -> Result<Option<BlockHeader>, LedgerError> {
        let tree = self.headers.clone();
        let key = index_key(index);
        blocking(move || {
            let Some(bytes) = tree.get(key).map_err(LedgerError::storage)? else {
                return Ok(None);
            };
            let header = serde_json::from_slice(&bytes).map_err(|e| LedgerError::Storage(e.to_string()))?;
            Ok(Some(header))
        })
        .await
    }

    async fn headers_range(&self, from: u64, to: u64) -> Result<Vec<BlockHeader>, LedgerError> {
        let tree = self.headers.clone();
        blocking(move || {
            let mut out = Vec::new();
            for item in tree.range(index_key(from)..index_key(to)) {
                let (_, bytes) = item.map_err(LedgerError::storage)?;
                let header = serde_json::from_slice(&bytes).map_err(|e| LedgerError::Storage(e.to_string()))?;
                out.push(header);
            }
            Ok(out)
        })
        .await
    }

    async fn put_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), LedgerError> {
        let tree = self.checkpoints.clone();
        let key = index_key(checkpoint.index);
        let bytes = serde_json::to_vec(checkpoint).map_err(|e| LedgerError::Storage(e.to_string()))?;
        blocking(move || {
            tree.insert(key, bytes).map_err(LedgerError::storage)?;
            Ok(())
        })
        .await
    }

    async fn get_checkpoint(&self, index: u64) -> Result<Option<Checkpoint>, LedgerError> {
        let tree = self.checkpoints.clone();
        let key = index_key(index);
        blocking(move || {
            let Some(bytes) = tree.get(key).map_err(LedgerError::storage)? else {
                return Ok(None);
            };
            let checkpoint = serde_json::from_slice(&bytes).map_err(|e| LedgerError::Storage(e.to_string()))?;
            Ok(Some(checkpoint))
        })
        .await
    }

    async fn latest_checkpoint(&self) -> Result<Option<Checkpoint>, LedgerError> {
        let tree = self.checkpoints.clone();
        blocking(move || match tree.last().map_err(LedgerError::storage)? {
            Some((_, bytes)) => {
                let checkpoint = serde_json::from_slice(&bytes).map_err(|e| LedgerError::Storage(e.to_string()))?;
                Ok(Some(checkpoint))
            }
            None => Ok(None),
        })
        .await
    }

    async fn put_key_pair(&self, node_id: &NodeId, wrapped: &[u8]) -> Result<(), LedgerError> {
        let tree = self.keys.clone();
        let key = node_id.as_str().as_bytes().to_vec();
        let value = wrapped.to_vec();
        blocking(move || {
            tree.insert(key, value).map_err(LedgerError::storage)?;
            Ok(())
        })
        .await
    }

    async fn get_key_pair(&self, node_id: &NodeId) -> Result<Option<Vec<u8>>, LedgerError> {
        let tree = self.keys.clone();
        let key = node_id.as_str().as_bytes().to_vec();
        blocking(move || Ok(tree.get(key).map_err(LedgerError::storage)?.map(|v| v.to_vec()))).await
    }

    async fn put_metadata(&self, key: &str, value: serde_json::Value) -> Result<(), LedgerError> {
        let tree = self.meta.clone();
        let key = key.as_bytes().to_vec();
        let bytes = serde_json::to_vec(&value).map_err(|e| LedgerError::Storage(e.to_string()))?;
        blocking(move || {
            tree.insert(key, bytes).map_err(LedgerError::storage)?;
            Ok(())
        })
        .await
    }

    async fn get_metadata(&self, key: &str) -> Result<Option<serde_json::Value>, LedgerError> {
        let tree = self.meta.clone();
        let key = key.as_bytes().to_vec();
        blocking(move || {
            let Some(bytes) = tree.get(key).map_err(LedgerError::storage)? else {
                return Ok(None);
            };
            let value = serde_json::from_slice(&bytes).map_err(|e| LedgerError::Storage(e.to_string()))?;
            Ok(Some(value))
        })
        .await
    }

    async fn schema_version(&self) -> Result<u32, LedgerError> {
        let tree = self.meta.clone();
        blocking(move || match tree.get(SCHEMA_VERSION_KEY).map_err(LedgerError::storage)? {
            Some(bytes) if bytes.len() == 4 => {
                let mut arr = [0u8; 4];
                arr.copy_from_slice(&bytes);
                Ok(u32::from_be_bytes(arr))
            }
            _ => Ok(0),
        })
        .await
    }

    async fn set_schema_version(&self, version: u32) -> Result<(), LedgerError> {
        let tree = self.meta.clone();
        blocking(move || {
            tree.insert(SCHEMA_VERSION_KEY, &version.to_be_bytes())
                .map_err(LedgerError::storage)?;
            Ok(())
        })
        .await
    }
}
