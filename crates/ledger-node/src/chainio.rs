//! Chain load/bootstrap and pruning persistence for the node binary
//! (spec.md §3.3's "fresh vs loaded" lifecycle, §4.5's pruning/checkpoint
//! contract). `ledger_chain::Chain` itself never touches a `Store` — this
//! module is the glue that feeds it one at startup and drains it back out
//! periodically.

use std::sync::Arc;

use anyhow::Context;
use ledger_block::Block;
use ledger_chain::{Chain, ChainState, GenesisInfo};
use ledger_core::{BlockHash, LedgerError, NodeId, Timestamp};
use ledger_storage::Store;
use serde::{Deserialize, Serialize};
use tracing::info;

const GENESIS_INFO_METADATA_KEY: &str = "genesis_info";
const PRUNED_BEFORE_METADATA_KEY: &str = "pruned_before";
const CHAIN_STATE_SNAPSHOT_METADATA_KEY: &str = "chain_state_snapshot";

/// `ledger_chain::GenesisInfo` has no `Serialize` impl of its own (it isn't
/// part of any wire format) — this is its on-disk shape, used only by this
/// binary's resume path.
#[derive(Serialize, Deserialize)]
struct GenesisInfoDto {
    hash: BlockHash,
    timestamp: Timestamp,
    unique_marker: Option<String>,
}

/// Load an existing chain from `store`, resuming from a pruned snapshot if
/// one was left behind, replaying the full block sequence if not, or
/// minting a brand-new genesis if the store is empty.
pub async fn load_or_bootstrap(store: &Arc<dyn Store>, local_node_id: &NodeId, genesis_marker: &str) -> anyhow::Result<Chain> {
    if let Some(pruned_before) = store.get_metadata(PRUNED_BEFORE_METADATA_KEY).await? {
        let pruned_before: u64 = serde_json::from_value(pruned_before).context("decoding pruned_before")?;
        if pruned_before > 0 {
            return resume_from_snapshot(store, pruned_before).await;
        }
    }

    match store.get_block(0).await? {
        None => {
            info!(%local_node_id, genesis_marker, "no existing chain found, minting genesis");
            let chain = Chain::new_genesis(chrono::Utc::now().timestamp(), local_node_id.clone(), genesis_marker);
            store.put_block(chain.tip()).await.context("persisting genesis block")?;
            persist_genesis_info(store, &chain).await?;
            Ok(chain)
        }
        Some(genesis) => {
            info!("existing chain found, replaying from storage");
            let blocks = load_contiguous_blocks(store, 0, genesis).await?;
            let count = blocks.len();
            let chain = Chain::from_blocks(blocks).context("replaying stored chain")?;
            info!(blocks = count, "replayed stored chain");
            Ok(chain)
        }
    }
}

async fn load_contiguous_blocks(store: &Arc<dyn Store>, from_index: u64, first: Block) -> Result<Vec<Block>, LedgerError> {
    let mut blocks = vec![first];
    let mut index = from_index + 1;
    while let Some(block) = store.get_block(index).await? {
        blocks.push(block);
        index += 1;
    }
    Ok(blocks)
}

async fn resume_from_snapshot(store: &Arc<dyn Store>, pruned_before: u64) -> anyhow::Result<Chain> {
    let genesis_info = store
        .get_metadata(GENESIS_INFO_METADATA_KEY)
        .await?
        .context("pruned_before is set but genesis_info is missing")?;
    let genesis_info: GenesisInfoDto = serde_json::from_value(genesis_info).context("decoding genesis_info")?;
    let genesis_info = GenesisInfo {
        hash: genesis_info.hash,
        timestamp: genesis_info.timestamp,
        unique_marker: genesis_info.unique_marker,
    };

    let state = store
        .get_metadata(CHAIN_STATE_SNAPSHOT_METADATA_KEY)
        .await?
        .context("pruned_before is set but chain_state_snapshot is missing")?;
    let state: ChainState = serde_json::from_value(state).context("decoding chain_state_snapshot")?;

    let last_checkpoint = store.latest_checkpoint().await?;
    let first_retained = store
        .get_block(pruned_before)
        .await?
        .context("pruned_before points past the oldest retained block")?;
    let blocks = load_contiguous_blocks(store, pruned_before, first_retained).await?;

    let count = blocks.len();
    let chain = Chain::resume(genesis_info, pruned_before, last_checkpoint, blocks, state).context("resuming pruned chain")?;
    info!(pruned_before, retained_blocks = count, "resumed chain from pruned snapshot");
    Ok(chain)
}

async fn persist_genesis_info(store: &Arc<dyn Store>, chain: &Chain) -> anyhow::Result<()> {
    let dto = GenesisInfoDto {
        hash: chain.genesis_info().hash.clone(),
        timestamp: chain.genesis_info().timestamp,
        unique_marker: chain.genesis_info().unique_marker.clone(),
    };
    store
        .put_metadata(GENESIS_INFO_METADATA_KEY, serde_json::to_value(dto)?)
        .await?;
    Ok(())
}

/// Persist every block in `blocks` whose index is `>= already_persisted`.
/// Called after every locally-applied or network-applied block so a
/// restart can replay from storage.
pub async fn persist_new_blocks(store: &Arc<dyn Store>, blocks: &[Block], already_persisted: u64) -> anyhow::Result<u64> {
    let pending: Vec<Block> = blocks.iter().filter(|b| b.header.index >= already_persisted).cloned().collect();
    let Some(persisted) = pending.last().map(|b| b.header.index + 1) else {
        return Ok(already_persisted);
    };
    store.put_blocks(&pending).await?;
    Ok(persisted)
}

/// Prune `chain` down to `keep_blocks`, persisting any new checkpoints,
/// the pruned-chain bookkeeping needed by `resume_from_snapshot`, and
/// trimming the store's own block tail (spec.md §4.5).
pub async fn prune_and_persist(store: &Arc<dyn Store>, chain: &mut Chain, keep_blocks: u64, checkpoint_interval: u64) -> anyhow::Result<()> {
    let outcome = ledger_chain::prune(chain, keep_blocks, checkpoint_interval)?;
    if outcome.new_checkpoints.is_empty() && outcome.pruned_up_to_index == chain.pruned_before() {
        return Ok(());
    }
    for checkpoint in &outcome.new_checkpoints {
        store.put_checkpoint(checkpoint).await?;
    }
    store.delete_blocks_before(outcome.pruned_up_to_index).await?;
    persist_genesis_info(store, chain).await?;
    store
        .put_metadata(PRUNED_BEFORE_METADATA_KEY, serde_json::to_value(outcome.pruned_up_to_index)?)
        .await?;
    store
        .put_metadata(CHAIN_STATE_SNAPSHOT_METADATA_KEY, serde_json::to_value(chain.state())?)
        .await?;
    info!(pruned_up_to_index = outcome.pruned_up_to_index, "chain pruned and checkpointed");
    Ok(())
}
