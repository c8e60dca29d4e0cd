use ledger_block::Block;
use ledger_core::{tags, BlockHash, Event, GenesisPayload, LedgerError, NodeId, Timestamp};
use tracing::{info, warn};

use crate::handlers::dispatch;
use crate::pruner::Checkpoint;
use crate::state::ChainState;

/// Genesis metadata, retained for the lifetime of the chain regardless of
/// pruning — the tiebreaker (spec.md §4.3) needs it even once the actual
/// genesis block has been pruned away.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenesisInfo {
    pub hash: BlockHash,
    pub timestamp: Timestamp,
    pub unique_marker: Option<String>,
}

/// Ordered block list plus derived state (spec.md §3.1). Exclusively owned
/// by its hosting task; `apply`/`replace_chain` are the only mutation
/// entry points, matching the single-owner concurrency model of spec.md
/// §5.
#[derive(Clone, Debug)]
pub struct Chain {
    blocks: Vec<Block>,
    state: ChainState,
    genesis_info: GenesisInfo,
    /// Number of blocks pruned from the front; `blocks[0]`'s real index is
    /// `pruned_before`, not 0, once pruning has happened.
    pruned_before: u64,
    last_checkpoint: Option<Checkpoint>,
}

impl Chain {
    /// Mint a fresh genesis block carrying a unique marker, and start a
    /// new chain from it. `proposer` signs the genesis block; for a
    /// self-hosted first node this is typically its own id before any
    /// `NODE_JOIN` has been applied.
    pub fn new_genesis(timestamp: Timestamp, proposer: NodeId, unique_marker: impl Into<String>) -> Self {
        let marker = unique_marker.into();
        let genesis_event = Event::unsigned(
            timestamp,
            proposer.clone(),
            tags::GENESIS,
            GenesisPayload {
                unique_marker: marker.clone(),
            },
        );
        let genesis_block = Block::assemble(0, timestamp, None, proposer, 0, vec![genesis_event]);
        let genesis_info = GenesisInfo {
            hash: genesis_block.hash.clone(),
            timestamp,
            unique_marker: Some(marker),
        };
        let mut chain = Chain {
            blocks: vec![genesis_block],
            state: ChainState::default(),
            genesis_info,
            pruned_before: 0,
            last_checkpoint: None,
        };
        chain.state.rebuild_node_map();
        chain
    }

    /// Reconstruct a chain from a persisted/received block list without
    /// re-deriving state incrementally — used by storage load and as a
    /// building block for `replace_chain`. Fails on the first structural
    /// violation.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, LedgerError> {
        validate_structure(&blocks)?;
        let genesis_info = genesis_info_from_block(&blocks[0]);
        let mut chain = Chain {
            blocks: Vec::new(),
            state: ChainState::default(),
            genesis_info,
            pruned_before: 0,
            last_checkpoint: None,
        };
        for block in blocks {
            chain.commit_block(block)?;
        }
        Ok(chain)
    }

    /// Resume a previously pruned chain from its persisted pieces: the
    /// genesis metadata (kept forever), the last checkpoint, the
    /// still-retained block suffix, and a `ChainState` snapshot persisted
    /// alongside it. Unlike `from_blocks`, this does not replay anything —
    /// pruned blocks are gone, so the state snapshot is the only source of
    /// truth for everything before the retained suffix. The caller (the
    /// `Store` implementation in `ledger-storage`) is responsible for
    /// having persisted a state snapshot that is actually consistent with
    /// `checkpoint` and `blocks`.
    pub fn resume(
        genesis_info: GenesisInfo,
        pruned_before: u64,
        last_checkpoint: Option<Checkpoint>,
        blocks: Vec<Block>,
        state: ChainState,
    ) -> Result<Self, LedgerError> {
        if let (Some(checkpoint), Some(first)) = (&last_checkpoint, blocks.first()) {
            if !crate::pruner::verify_checkpoint_continuity(first, checkpoint) {
                return Err(LedgerError::CheckpointDiscontinuity(checkpoint.index));
            }
        }
        Ok(Chain {
            blocks,
            state,
            genesis_info,
            pruned_before,
            last_checkpoint,
        })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    pub fn state(&self) -> &ChainState {
        &self.state
    }

    pub fn pruned_before(&self) -> u64 {
        self.pruned_before
    }

    pub(crate) fn set_pruned_before(&mut self, value: u64) {
        self.pruned_before = value;
    }

    pub fn last_checkpoint(&self) -> Option<&Checkpoint> {
        self.last_checkpoint.as_ref()
    }

    pub(crate) fn set_last_checkpoint(&mut self, checkpoint: Checkpoint) {
        self.last_checkpoint = Some(checkpoint);
    }

    /// Total chain length including any pruned prefix.
    pub fn len(&self) -> u64 {
        self.pruned_before + self.blocks.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tip(&self) -> &Block {
        self.blocks.last().expect("chain always retains at least its tip block")
    }

    pub fn genesis_info(&self) -> &GenesisInfo {
        &self.genesis_info
    }

    /// `apply(block)` per spec.md §4.2: validate chain-shape invariants,
    /// recompute and compare the block hash, dispatch every transaction
    /// (handler no-ops never abort the block), and only then commit.
    pub fn apply(&mut self, block: Block) -> Result<(), LedgerError> {
        let expected_index = self.len();
        if block.header.index != expected_index {
            return Err(LedgerError::IndexMismatch {
                expected: expected_index,
                got: block.header.index,
            });
        }
        if expected_index == 0 {
            if block.header.previous_hash.is_some() {
                return Err(LedgerError::InvalidBlock(
                    "genesis block must not carry a previousHash".into(),
                ));
            }
        } else {
            let tip_hash = self.tip().hash.clone();
            if block.header.previous_hash.as_ref() != Some(&tip_hash) {
                return Err(LedgerError::PreviousHashMismatch);
            }
        }
        if !block.verify_integrity() {
            return Err(LedgerError::HashMismatch);
        }
        self.commit_block(block)
    }

    /// Dispatch every transaction in `block` and append it. Assumes
    /// structural validity has already been checked by the caller (either
    /// `apply` or the `from_blocks`/`replace_chain` replay loop).
    fn commit_block(&mut self, block: Block) -> Result<(), LedgerError> {
        for tx in &block.transactions {
            dispatch(&mut self.state, block.header.index, tx);
        }
        self.state.rebuild_node_map();
        self.blocks.push(block);
        Ok(())
    }

    /// Replace the local chain with `candidate` per spec.md §4.3: replay
    /// into a temporary chain first (rejecting on any failure), then
    /// reset derived state to empty and reprocess every transaction in
    /// order. No incremental patching.
    pub fn replace_chain(&mut self, candidate_blocks: Vec<Block>) -> Result<(), LedgerError> {
        let candidate = Chain::from_blocks(candidate_blocks)?;
        *self = candidate;
        Ok(())
    }

    /// Decide whether `candidate`'s blocks should replace the local chain,
    /// applying spec.md §4.3's length rule and, on equal length, the
    /// tiebreaker. Returns `true` if the candidate wins (and the caller
    /// should call `replace_chain`), `false` otherwise. Never mutates.
    pub fn should_adopt(&self, candidate: &Chain) -> Result<bool, LedgerError> {
        if candidate.len() > self.len() {
            return Ok(true);
        }
        if candidate.len() < self.len() {
            return Ok(false);
        }
        if candidate.genesis_info().hash == self.genesis_info().hash {
            return Ok(false);
        }
        tiebreak(self.genesis_info(), candidate.genesis_info())
    }
}

fn genesis_info_from_block(genesis: &Block) -> GenesisInfo {
    let marker = genesis.transactions.first().and_then(|tx| match tx.parse() {
        Some(ledger_core::ParsedPayload::Genesis(p)) => Some(p.unique_marker),
        _ => {
            warn!("genesis block's sole transaction is not a GENESIS event");
            None
        }
    });
    GenesisInfo {
        hash: genesis.hash.clone(),
        timestamp: genesis.header.timestamp,
        unique_marker: marker,
    }
}

/// spec.md §3.2 invariant #1: `block[0].index == 0` with no
/// `previousHash`; every subsequent block's index is contiguous and its
/// `previousHash` matches its predecessor's `hash`.
pub fn validate_structure(blocks: &[Block]) -> Result<(), LedgerError> {
    if blocks.is_empty() {
        return Err(LedgerError::InvalidBlock("empty block sequence".into()));
    }
    if blocks[0].header.index != 0 || blocks[0].header.previous_hash.is_some() {
        return Err(LedgerError::InvalidBlock(
            "block 0 must have index 0 and no previousHash".into(),
        ));
    }
    for (i, block) in blocks.iter().enumerate() {
        if block.header.index != i as u64 {
            return Err(LedgerError::IndexMismatch {
                expected: i as u64,
                got: block.header.index,
            });
        }
        if i > 0 && block.header.previous_hash.as_ref() != Some(&blocks[i - 1].hash) {
            return Err(LedgerError::PreviousHashMismatch);
        }
        if !block.verify_integrity() {
            return Err(LedgerError::HashMismatch);
        }
    }
    Ok(())
}

/// spec.md §4.3's tiebreaker: compare genesis uniqueness markers, then
/// genesis timestamps (earlier wins), then genesis hashes lexically
/// (smaller wins). Returns `true` if `candidate` wins.
fn tiebreak(local: &GenesisInfo, candidate: &GenesisInfo) -> Result<bool, LedgerError> {
    match (&local.unique_marker, &candidate.unique_marker) {
        (Some(_), None) => {
            // Candidate's genesis is clearly older (no marker while local has one): reject.
            info!("rejecting candidate chain: genesis lacks a uniqueness marker");
            Err(LedgerError::DivergentGenesis)
        }
        (None, Some(_)) => Ok(true),
        _ => {
            if local.timestamp != candidate.timestamp {
                Ok(candidate.timestamp < local.timestamp)
            } else {
                Ok(candidate.hash.to_hex() < local.hash.to_hex())
            }
        }
    }
}
