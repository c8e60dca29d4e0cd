use ledger_block::Block;
use ledger_core::{tags, Event, LedgerError, NodeId, NodeJoinPayload, ParsedPayload, Timestamp};
use tracing::info;

use crate::engine::Chain;

/// Scan `donor_blocks` for `NODE_JOIN` events whose node id is absent from
/// `chain`'s current node map, and append one reconstructed join block per
/// such event to `chain`'s tail (spec.md §4.4). Each reconstructed event
/// carries `timestamp = now` and has its `parentId` cleared if that
/// parent is unknown locally. Returns the newly appended blocks so the
/// caller can broadcast them to peers other than the donor.
///
/// Idempotent: a node id absent on the first call is present afterward,
/// so a second call against the same donor set appends nothing (spec.md
/// §8 testable property #9).
pub fn unique_node_merge(
    chain: &mut Chain,
    donor_blocks: &[Block],
    local_proposer: &NodeId,
    now: Timestamp,
) -> Result<Vec<Block>, LedgerError> {
    let mut appended = Vec::new();

    for donor_block in donor_blocks {
        for tx in &donor_block.transactions {
            let Some(ParsedPayload::NodeJoin(join)) = tx.parse() else {
                continue;
            };
            if chain.state().node_map.contains_key(&join.node_id) {
                continue;
            }

            let parent_id = join
                .parent_id
                .clone()
                .filter(|p| chain.state().node_map.contains_key(p));

            let reconstructed_payload = NodeJoinPayload {
                node_id: join.node_id.clone(),
                name: join.name.clone(),
                public_key: join.public_key.clone(),
                parent_id,
                recovery_phrase_hash: join.recovery_phrase_hash.clone(),
            };
            let event = Event::unsigned(now, join.node_id.clone(), tags::NODE_JOIN, reconstructed_payload);

            let previous_hash = chain.tip().hash.clone();
            let index = chain.len();
            let block = Block::assemble(index, now, Some(previous_hash), local_proposer.clone(), 0, vec![event]);

            info!(node_id = %join.node_id, block_index = index, "merging unique node from donor chain");
            chain.apply(block.clone())?;
            appended.push(block);
        }
    }

    Ok(appended)
}
