//! Participation ("glow") score: a pure derivation from chain state,
//! consumed by the visualization collaborator (spec.md §2 item 10). No
//! network or storage access — every function here takes a `&ChainState`
//! and returns a value, nothing more.

use ledger_chain::ChainState;
use ledger_core::NodeId;
use serde::Serialize;

/// Karma counts toward glow at this fraction — it's the only factor a node
/// can accumulate without bound, so it's weighted down relative to the
/// bounded factors below.
const KARMA_WEIGHT: f64 = 0.01;
/// Each soulbound credential contributes a fixed amount regardless of which
/// institution minted it.
const SOULBOUND_WEIGHT: f64 = 5.0;
/// Each verified child in the node graph contributes a fixed amount —
/// rewards nodes that have vouched others in successfully.
const VERIFIED_CHILD_WEIGHT: f64 = 2.0;

/// Subtotals behind a glow score, so a consumer can explain a number
/// instead of just displaying it (mirrors how a ranked validator view
/// exposes the fields a rank was computed from, not just the rank).
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct GlowBreakdown {
    pub karma_component: f64,
    pub soulbound_component: f64,
    pub verified_children_component: f64,
    pub total: f64,
}

/// Number of this node's children that are themselves present in the node
/// map — i.e. joins that weren't later orphaned by a `NODE_PARENT_UPDATE`
/// removing the link.
fn verified_child_count(state: &ChainState, node_id: &NodeId) -> u64 {
    state
        .node_map
        .values()
        .filter(|entry| entry.parent_ids.iter().any(|p| p == node_id))
        .count() as u64
}

/// Compute the glow score and its breakdown for a single node. Absent
/// nodes (no karma balance, no soulbound tokens, no children) simply score
/// zero across every component.
pub fn glow_score(state: &ChainState, node_id: &NodeId) -> GlowBreakdown {
    let karma = state.karma_balances.get(node_id).copied().unwrap_or(0);
    let soulbound = state
        .soulbound_tokens
        .get(node_id)
        .map(|tokens| tokens.len() as u64)
        .unwrap_or(0);
    let children = verified_child_count(state, node_id);

    let karma_component = karma as f64 * KARMA_WEIGHT;
    let soulbound_component = soulbound as f64 * SOULBOUND_WEIGHT;
    let verified_children_component = children as f64 * VERIFIED_CHILD_WEIGHT;

    GlowBreakdown {
        karma_component,
        soulbound_component,
        verified_children_component,
        total: karma_component + soulbound_component + verified_children_component,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_chain::{NodeMapEntry, SoulboundToken};
    use ledger_core::PublicKeyBytes;

    fn node(state: &mut ChainState, id: &str, parent: Option<&str>) {
        state.node_map.insert(
            NodeId::new(id),
            NodeMapEntry {
                name: id.into(),
                public_key: PublicKeyBytes(vec![0; 32]),
                parent_ids: parent.map(|p| vec![NodeId::new(p)]).unwrap_or_default(),
                child_count: 0,
                created_at: 0,
                recovery_phrase_hash: None,
            },
        );
    }

    #[test]
    fn absent_node_scores_zero() {
        let state = ChainState::default();
        let score = glow_score(&state, &NodeId::new("nobody"));
        assert_eq!(score.total, 0.0);
    }

    #[test]
    fn score_combines_karma_soulbound_and_children() {
        let mut state = ChainState::default();
        state.karma_balances.insert(NodeId::new("nA"), 100);
        state.soulbound_tokens.insert(
            NodeId::new("nA"),
            vec![SoulboundToken {
                issuer: NodeId::new("nB"),
                achievement_id: "x".into(),
                metadata: None,
                minted_at: 1,
                is_transferable: false,
            }],
        );
        node(&mut state, "nA", None);
        node(&mut state, "nC", Some("nA"));

        let score = glow_score(&state, &NodeId::new("nA"));
        assert_eq!(score.karma_component, 1.0);
        assert_eq!(score.soulbound_component, 5.0);
        assert_eq!(score.verified_children_component, 2.0);
        assert_eq!(score.total, 8.0);
    }
}
