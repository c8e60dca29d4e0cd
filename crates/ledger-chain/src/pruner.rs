use ledger_block::Block;
use ledger_core::{BlockHash, LedgerError, NodeId, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::Chain;

/// Compact summary of a pruned block (spec.md §3.1).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub index: u64,
    pub hash: BlockHash,
    pub previous_hash: Option<BlockHash>,
    pub timestamp: Timestamp,
    pub proposer: NodeId,
}

impl Checkpoint {
    fn from_block(block: &Block) -> Self {
        Checkpoint {
            index: block.header.index,
            hash: block.hash.clone(),
            previous_hash: block.header.previous_hash.clone(),
            timestamp: block.header.timestamp,
            proposer: block.header.proposer.clone(),
        }
    }
}

/// Outcome of a single `prune` call: the checkpoints newly produced (to be
/// persisted by the caller) and the index up to which persistent block
/// storage should now be trimmed.
pub struct PruneOutcome {
    pub new_checkpoints: Vec<Checkpoint>,
    pub pruned_up_to_index: u64,
}

/// Keep the last `keep_blocks` blocks in memory, dropping the oldest
/// prefix. A checkpoint is produced for every dropped block whose index
/// falls on a `checkpoint_interval` boundary (spec.md §4.5). Does not
/// touch persistent storage — the caller (owning the `Store`) is
/// responsible for persisting `new_checkpoints` and deleting blocks up to
/// `pruned_up_to_index`.
pub fn prune(chain: &mut Chain, keep_blocks: u64, checkpoint_interval: u64) -> Result<PruneOutcome, LedgerError> {
    let total = chain.len();
    if total <= keep_blocks {
        return Ok(PruneOutcome {
            new_checkpoints: Vec::new(),
            pruned_up_to_index: chain.pruned_before(),
        });
    }

    let new_pruned_before = total - keep_blocks;
    let already_pruned = chain.pruned_before();
    let drop_count = (new_pruned_before - already_pruned) as usize;

    let mut new_checkpoints = Vec::new();
    {
        let blocks = chain.blocks();
        for block in &blocks[..drop_count] {
            if block.header.index % checkpoint_interval == 0 {
                new_checkpoints.push(Checkpoint::from_block(block));
            }
        }
        // The retained checkpoint must always be the block immediately
        // preceding the first surviving block, whether or not its index
        // lands on a checkpoint_interval boundary — `verify_checkpoint_continuity`
        // compares the first surviving block's previousHash against exactly
        // this checkpoint's hash, and a bulk prune can drop more than one
        // interval's worth of blocks in one call.
        let boundary = &blocks[drop_count - 1];
        if new_checkpoints.last().map(|c| c.index) != Some(boundary.header.index) {
            new_checkpoints.push(Checkpoint::from_block(boundary));
        }
    }

    chain.blocks_mut().drain(..drop_count);
    chain.set_pruned_before(new_pruned_before);
    if let Some(checkpoint) = new_checkpoints.last().cloned() {
        chain.set_last_checkpoint(checkpoint);
    }

    info!(
        dropped = drop_count,
        new_checkpoints = new_checkpoints.len(),
        "pruned chain to {} retained blocks",
        keep_blocks
    );

    Ok(PruneOutcome {
        new_checkpoints,
        pruned_up_to_index: new_pruned_before,
    })
}

/// spec.md §4.5: after pruning, the first surviving block's `previousHash`
/// must equal the last checkpoint's `hash`. Callable standalone after any
/// prune to re-check the invariant (e.g. after loading from storage).
pub fn verify_checkpoint_continuity(first_surviving_block: &Block, last_checkpoint: &Checkpoint) -> bool {
    first_surviving_block.header.previous_hash.as_ref() == Some(&last_checkpoint.hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{tags, Event, NodeId};

    fn append(chain: &mut Chain, index: u64, ts: i64) {
        let previous_hash = chain.tip().hash.clone();
        let event = Event::unsigned(ts, NodeId::new("n"), "SOME_TYPE", serde_json::json!({}));
        let block = Block::assemble(index, ts, Some(previous_hash), NodeId::new("n"), 0, vec![event]);
        chain.apply(block).expect("block should apply");
    }

    #[test]
    fn bulk_prune_crossing_several_checkpoint_intervals_stays_resumable() {
        let mut chain = Chain::new_genesis(0, NodeId::new("n"), "alpha");
        for i in 1..2_000u64 {
            append(&mut chain, i, i as i64);
        }
        assert_eq!(chain.len(), 2_000);

        // keep_blocks=1000/checkpoint_interval=100 means 1000 blocks are
        // dropped at once, crossing ten checkpoint-interval boundaries —
        // the shipped defaults this bug was found under.
        let outcome = prune(&mut chain, 1_000, 100).unwrap();
        assert_eq!(outcome.pruned_up_to_index, 1_000);

        let checkpoint = chain.last_checkpoint().cloned().unwrap();
        let first_surviving = chain.blocks().first().unwrap();
        assert!(verify_checkpoint_continuity(first_surviving, &checkpoint));
    }

    #[test]
    fn single_interval_prune_still_checkpoints_on_boundary() {
        let mut chain = Chain::new_genesis(0, NodeId::new("n"), "alpha");
        for i in 1..250u64 {
            append(&mut chain, i, i as i64);
        }
        let outcome = prune(&mut chain, 100, 100).unwrap();
        assert_eq!(outcome.pruned_up_to_index, 149);
        let checkpoint = chain.last_checkpoint().cloned().unwrap();
        assert_eq!(checkpoint.index, 149);
        let first_surviving = chain.blocks().first().unwrap();
        assert!(verify_checkpoint_continuity(first_surviving, &checkpoint));
    }
}
