use std::collections::{HashMap, HashSet};

use ledger_core::{Karma, NodeId, PublicKeyBytes, Timestamp};
use serde::{Deserialize, Serialize};

/// One of the four roles a node may hold (spec.md §3.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeRole {
    User,
    Institution,
    GovernanceAdmin,
    Root,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstitutionRecord {
    pub name: String,
    pub category: String,
    pub verified_by: NodeId,
    pub verified_at: Timestamp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingInstitution {
    pub name: String,
    pub category: String,
    pub submitted_at: Timestamp,
}

/// A single soulbound credential record. `is_transferable` is always
/// `false` and carried explicitly because it is part of the read-model
/// wire shape (spec.md §3.1) — never mutated after mint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SoulboundToken {
    pub issuer: NodeId,
    pub achievement_id: String,
    pub metadata: Option<serde_json::Value>,
    pub minted_at: Timestamp,
    pub is_transferable: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    pub proposer: NodeId,
    pub title: String,
    pub description: String,
    /// Index of the block the proposal was created in; the voting window
    /// runs `[created_at_block, created_at_block + voting_period_blocks)`.
    pub created_at_block: u64,
    pub voting_period_blocks: u64,
    pub quorum_threshold: u64,
    pub yes: u64,
    pub no: u64,
    pub abstain: u64,
    pub voters: HashSet<NodeId>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccountState {
    pub guardians: Vec<NodeId>,
    pub recovery_threshold: u32,
}

/// A node graph entry as exposed by the node map (spec.md §3.1).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeMapEntry {
    pub name: String,
    pub public_key: PublicKeyBytes,
    pub parent_ids: Vec<NodeId>,
    pub child_count: u64,
    pub created_at: Timestamp,
    pub recovery_phrase_hash: Option<String>,
}

/// A `NODE_JOIN` as folded by the node-map builder. Retained verbatim (not
/// just the derived map) so replace-chain and unique-node merge can
/// re-fold from scratch or diff against a donor's join set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JoinRecord {
    pub node_id: NodeId,
    pub name: String,
    pub public_key: PublicKeyBytes,
    pub parent_id: Option<NodeId>,
    pub recovery_phrase_hash: Option<String>,
    pub created_at: Timestamp,
}

/// A `NODE_PARENT_UPDATE` as folded by the node-map builder. `seq` is the
/// transaction's position in chain-replay order, used only to break ties
/// between updates sharing a `timestamp` — see `nodemap::build` for why
/// the primary sort key is `timestamp`, not `seq`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParentUpdateRecord {
    pub node_id: NodeId,
    pub action: ledger_core::ParentAction,
    pub parent_id: Option<NodeId>,
    pub timestamp: Timestamp,
    pub seq: u64,
}

/// All chain-derived state (spec.md §3.1). Mutated incrementally by
/// `handlers::dispatch` as each transaction in a block applies, except
/// `node_map`, which is rebuilt in full from `joins`/`parent_updates`
/// after every block commits (spec.md §4.2, Design Notes §9).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChainState {
    pub node_roles: HashMap<NodeId, NodeRole>,
    pub institutions: HashMap<NodeId, InstitutionRecord>,
    pub pending_institutions: HashMap<NodeId, PendingInstitution>,
    pub soulbound_tokens: HashMap<NodeId, Vec<SoulboundToken>>,
    pub active_proposals: HashMap<String, Proposal>,
    pub account_states: HashMap<NodeId, AccountState>,
    /// parent -> child -> requested_at.
    pub pending_parent_requests: HashMap<NodeId, HashMap<NodeId, Timestamp>>,
    pub karma_balances: HashMap<NodeId, Karma>,

    pub joins: Vec<JoinRecord>,
    pub parent_updates: Vec<ParentUpdateRecord>,
    /// Monotonic counter incremented once per dispatched transaction,
    /// supplying `ParentUpdateRecord::seq`.
    pub tx_seq: u64,

    pub node_map: HashMap<NodeId, NodeMapEntry>,
}

impl ChainState {
    pub fn is_verified_institution(&self, id: &NodeId) -> bool {
        self.institutions.contains_key(id)
    }

    pub fn get_node_role(&self, id: &NodeId) -> Option<NodeRole> {
        self.node_roles.get(id).copied()
    }

    pub fn is_child_of(&self, child: &NodeId, parent: &NodeId) -> bool {
        self.node_map
            .get(child)
            .map(|e| e.parent_ids.iter().any(|p| p == parent))
            .unwrap_or(false)
    }

    /// Rebuild `node_map` from the accumulated `joins`/`parent_updates`.
    /// Called once after every block commits.
    pub fn rebuild_node_map(&mut self) {
        self.node_map = crate::nodemap::build(&self.joins, &self.parent_updates);
    }
}
