use async_trait::async_trait;
use ledger_block::{Block, BlockHeader};
use ledger_chain::Checkpoint;
use ledger_core::{LedgerError, NodeId};

/// The persistence interface the chain and network layers depend on
/// (spec.md §6.2): blocks, light-client headers, checkpoints, per-node key
/// pairs, and an opaque string-keyed metadata bag. Every write is
/// idempotent by primary key (block index, metadata key, node id) — callers
/// may retry freely. Metadata values are opaque JSON (`serde_json::Value`)
/// rather than a generic type parameter, so this trait stays object-safe
/// and callers can hold it as `Arc<dyn Store>` (Design Notes §9's injected
/// dependencies).
#[async_trait]
pub trait Store: Send + Sync {
    async fn put_block(&self, block: &Block) -> Result<(), LedgerError>;
    async fn get_block(&self, index: u64) -> Result<Option<Block>, LedgerError>;
    /// Delete all blocks with `index < up_to_index` (the pruner's tail
    /// cleanup, spec.md §4.5).
    async fn delete_blocks_before(&self, up_to_index: u64) -> Result<(), LedgerError>;

    /// Persist several blocks as one unit (spec.md §2 component 6: "all
    /// async, with batch operations") — a sync catching a node up calls
    /// this once for the whole response instead of one round trip per
    /// block. The default just loops `put_block`; backends that support a
    /// real atomic batch (e.g. `sled::Batch`) should override it.
    async fn put_blocks(&self, blocks: &[Block]) -> Result<(), LedgerError> {
        for block in blocks {
            self.put_block(block).await?;
        }
        Ok(())
    }

    async fn put_header(&self, header: &BlockHeader) -> Result<(), LedgerError>;
    async fn get_header(&self, index: u64) -> Result<Option<BlockHeader>, LedgerError>;
    async fn headers_range(&self, from: u64, to: u64) -> Result<Vec<BlockHeader>, LedgerError>;

    async fn put_checkpoint(&self, checkpoint: &Checkpoint) -> Result<(), LedgerError>;
    async fn get_checkpoint(&self, index: u64) -> Result<Option<Checkpoint>, LedgerError>;
    async fn latest_checkpoint(&self) -> Result<Option<Checkpoint>, LedgerError>;

    async fn put_key_pair(&self, node_id: &NodeId, wrapped: &[u8]) -> Result<(), LedgerError>;
    async fn get_key_pair(&self, node_id: &NodeId) -> Result<Option<Vec<u8>>, LedgerError>;

    async fn put_metadata(&self, key: &str, value: serde_json::Value) -> Result<(), LedgerError>;
    async fn get_metadata(&self, key: &str) -> Result<Option<serde_json::Value>, LedgerError>;

    /// Schema version recorded at the store level; migrations only ever
    /// append object stores (spec.md §6.2).
    async fn schema_version(&self) -> Result<u32, LedgerError>;
    async fn set_schema_version(&self, version: u32) -> Result<(), LedgerError>;
}

/// Reserved metadata keys (spec.md §6.2).
pub mod metadata_keys {
    pub const NODE_ROLES: &str = "node_roles";
    pub const INSTITUTIONS: &str = "institutions";
    pub const PENDING_INSTITUTIONS_LIST: &str = "pending_institutions_list";
    pub const KARMA_BALANCES: &str = "karma_balances";
    pub const ACTIVE_PROPOSALS: &str = "active_proposals";

    pub fn proposal(id: &str) -> String {
        format!("proposal_{id}")
    }
    pub fn account(addr: &str) -> String {
        format!("account_{addr}")
    }
    pub fn soulbound(addr: &str) -> String {
        format!("soulbound_{addr}")
    }
    pub fn pending_parent_requests(parent: &str) -> String {
        format!("pending_parent_requests_{parent}")
    }
}
