use ledger_core::{
    Event, GovProposalPayload, InstitutionRegisterPayload, InstitutionRevokePayload,
    InstitutionVerifyPayload, KarmaEarnPayload, KarmaTransferPayload, KarmaUbiPayload,
    NodeJoinPayload, NodeParentRequestPayload, NodeParentUpdatePayload, ParsedPayload,
    SocialRecoveryUpdatePayload, SoulboundMintPayload, VoteCastPayload, VoteChoice,
};
use tracing::debug;

use crate::state::{
    AccountState, ChainState, InstitutionRecord, JoinRecord, NodeRole, ParentUpdateRecord,
    PendingInstitution, Proposal, SoulboundToken,
};

/// Whether a handler actually mutated state. Handler preconditions failing
/// is represented here, not as an `Err` — spec.md §4.2 requires a block
/// carrying an unauthorized or malformed transaction to remain valid and
/// commit; only structural block-level failures are `Err`s (see
/// `engine::apply`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerOutcome {
    Applied,
    NoEffect,
}

/// Dispatch one transaction against `state`, mutating it in place.
/// `block_index` is the index of the block this transaction belongs to
/// (used by `GOV_PROPOSAL`/`VOTE_CAST` for the voting-window check).
///
/// `GENESIS` transactions carry no derived-state mutation of their own —
/// chain-shape validation in `engine.rs` is what restricts them to block
/// 0 — so they fall through here as a no-op alongside any transaction
/// type this build cannot parse, exactly matching the "exhaustive match
/// plus forward-compatible catch-all" shape Design Notes §9 calls for.
pub fn dispatch(state: &mut ChainState, block_index: u64, event: &Event) -> HandlerOutcome {
    let outcome = match event.parse() {
        Some(ParsedPayload::Genesis(_)) => HandlerOutcome::NoEffect,
        Some(ParsedPayload::NodeJoin(p)) => node_join(state, &event.sender, event.timestamp, p),
        Some(ParsedPayload::NodeParentRequest(p)) => {
            node_parent_request(state, &event.sender, event.timestamp, p)
        }
        Some(ParsedPayload::NodeParentUpdate(p)) => {
            node_parent_update(state, event.timestamp, p)
        }
        Some(ParsedPayload::InstitutionRegister(p)) => {
            institution_register(state, &event.sender, event.timestamp, p)
        }
        Some(ParsedPayload::InstitutionVerify(p)) => {
            institution_verify(state, &event.sender, event.timestamp, p)
        }
        Some(ParsedPayload::InstitutionRevoke(p)) => institution_revoke(state, &event.sender, p),
        Some(ParsedPayload::SoulboundMint(p)) => {
            soulbound_mint(state, &event.sender, event.timestamp, p)
        }
        Some(ParsedPayload::GovProposal(p)) => {
            gov_proposal(state, &event.sender, block_index, p)
        }
        Some(ParsedPayload::VoteCast(p)) => vote_cast(state, &event.sender, block_index, p),
        Some(ParsedPayload::SocialRecoveryUpdate(p)) => {
            social_recovery_update(state, &event.sender, p)
        }
        Some(ParsedPayload::KarmaEarn(p)) => karma_earn(state, p),
        Some(ParsedPayload::KarmaTransfer(p)) => karma_transfer(state, &event.sender, p),
        Some(ParsedPayload::KarmaUbi(p)) => karma_ubi(state, p),
        None => {
            debug!(event_type = %event.event_type, "unrecognized transaction type, no-op");
            HandlerOutcome::NoEffect
        }
    };
    state.tx_seq += 1;
    outcome
}

fn node_join(
    state: &mut ChainState,
    sender: &ledger_core::NodeId,
    timestamp: ledger_core::Timestamp,
    p: NodeJoinPayload,
) -> HandlerOutcome {
    // Invariant #7: only the first NODE_JOIN for a node id establishes it.
    if state.node_roles.contains_key(&p.node_id) {
        debug!(node_id = %p.node_id, "duplicate NODE_JOIN ignored");
        return HandlerOutcome::NoEffect;
    }
    let _ = sender; // the joining node signs for itself; sender is not separately checked here
    let role = if state.node_roles.is_empty() {
        NodeRole::Root
    } else {
        NodeRole::User
    };
    state.node_roles.insert(p.node_id.clone(), role);
    state.joins.push(JoinRecord {
        node_id: p.node_id,
        name: p.name,
        public_key: p.public_key,
        parent_id: p.parent_id,
        recovery_phrase_hash: p.recovery_phrase_hash,
        created_at: timestamp,
    });
    HandlerOutcome::Applied
}

fn node_parent_request(
    state: &mut ChainState,
    sender: &ledger_core::NodeId,
    timestamp: ledger_core::Timestamp,
    p: NodeParentRequestPayload,
) -> HandlerOutcome {
    state
        .pending_parent_requests
        .entry(p.parent_id)
        .or_default()
        .insert(sender.clone(), timestamp);
    HandlerOutcome::Applied
}

fn node_parent_update(
    state: &mut ChainState,
    timestamp: ledger_core::Timestamp,
    p: NodeParentUpdatePayload,
) -> HandlerOutcome {
    use ledger_core::ParentAction;
    // ADD/REMOVE/SET all require a parent id to act on.
    if p.parent_id.is_none() {
        return HandlerOutcome::NoEffect;
    }
    if matches!(p.action, ParentAction::Add | ParentAction::Set) {
        if let Some(parent_id) = &p.parent_id {
            if let Some(requests) = state.pending_parent_requests.get_mut(parent_id) {
                requests.remove(&p.node_id);
            }
        }
    }
    let seq = state.tx_seq;
    state.parent_updates.push(ParentUpdateRecord {
        node_id: p.node_id,
        action: p.action,
        parent_id: p.parent_id,
        timestamp,
        seq,
    });
    HandlerOutcome::Applied
}

fn institution_register(
    state: &mut ChainState,
    sender: &ledger_core::NodeId,
    timestamp: ledger_core::Timestamp,
    p: InstitutionRegisterPayload,
) -> HandlerOutcome {
    state.pending_institutions.insert(
        sender.clone(),
        PendingInstitution {
            name: p.name,
            category: p.category,
            submitted_at: timestamp,
        },
    );
    HandlerOutcome::Applied
}

fn institution_verify(
    state: &mut ChainState,
    sender: &ledger_core::NodeId,
    timestamp: ledger_core::Timestamp,
    p: InstitutionVerifyPayload,
) -> HandlerOutcome {
    // Invariant #4: only ROOT or GOVERNANCE_ADMIN may decide.
    let authorized = matches!(
        state.get_node_role(sender),
        Some(NodeRole::Root) | Some(NodeRole::GovernanceAdmin)
    );
    if !authorized {
        debug!(sender = %sender, "unauthorized INSTITUTION_VERIFY, no-op");
        return HandlerOutcome::NoEffect;
    }
    let Some(pending) = state.pending_institutions.remove(&p.target_node_id) else {
        debug!(target = %p.target_node_id, "INSTITUTION_VERIFY for unknown pending application, no-op");
        return HandlerOutcome::NoEffect;
    };
    if !p.approved {
        return HandlerOutcome::Applied;
    }
    let category = p.category.unwrap_or(pending.category);
    state.institutions.insert(
        p.target_node_id.clone(),
        InstitutionRecord {
            name: pending.name,
            category,
            verified_by: sender.clone(),
            verified_at: timestamp,
        },
    );
    state
        .node_roles
        .insert(p.target_node_id, NodeRole::Institution);
    HandlerOutcome::Applied
}

fn institution_revoke(
    state: &mut ChainState,
    sender: &ledger_core::NodeId,
    p: InstitutionRevokePayload,
) -> HandlerOutcome {
    // Invariant #4: only ROOT may revoke.
    if state.get_node_role(sender) != Some(NodeRole::Root) {
        debug!(sender = %sender, "unauthorized INSTITUTION_REVOKE, no-op");
        return HandlerOutcome::NoEffect;
    }
    if state.institutions.remove(&p.target_node_id).is_none() {
        return HandlerOutcome::NoEffect;
    }
    // Previously minted soulbound tokens remain present (spec.md §9 open
    // question resolution: the read view does not flag them invalid).
    HandlerOutcome::Applied
}

fn soulbound_mint(
    state: &mut ChainState,
    sender: &ledger_core::NodeId,
    timestamp: ledger_core::Timestamp,
    p: SoulboundMintPayload,
) -> HandlerOutcome {
    // Invariant #5.
    if !state.is_verified_institution(sender) {
        return HandlerOutcome::NoEffect;
    }
    if *sender == p.recipient {
        return HandlerOutcome::NoEffect;
    }
    if !state.node_map.contains_key(&p.recipient) {
        return HandlerOutcome::NoEffect;
    }
    if !state.is_child_of(&p.recipient, sender) {
        return HandlerOutcome::NoEffect;
    }
    state.soulbound_tokens.entry(p.recipient).or_default().push(SoulboundToken {
        issuer: sender.clone(),
        achievement_id: p.achievement_id,
        metadata: p.metadata,
        minted_at: timestamp,
        is_transferable: false,
    });
    HandlerOutcome::Applied
}

fn gov_proposal(
    state: &mut ChainState,
    sender: &ledger_core::NodeId,
    block_index: u64,
    p: GovProposalPayload,
) -> HandlerOutcome {
    if state.active_proposals.contains_key(&p.proposal_id) {
        debug!(proposal_id = %p.proposal_id, "duplicate GOV_PROPOSAL id, no-op");
        return HandlerOutcome::NoEffect;
    }
    state.active_proposals.insert(
        p.proposal_id,
        Proposal {
            proposer: sender.clone(),
            title: p.title,
            description: p.description,
            created_at_block: block_index,
            voting_period_blocks: p.voting_period_blocks,
            quorum_threshold: p.quorum_threshold,
            yes: 0,
            no: 0,
            abstain: 0,
            voters: Default::default(),
        },
    );
    HandlerOutcome::Applied
}

fn vote_cast(
    state: &mut ChainState,
    sender: &ledger_core::NodeId,
    block_index: u64,
    p: VoteCastPayload,
) -> HandlerOutcome {
    let Some(proposal) = state.active_proposals.get_mut(&p.proposal_id) else {
        return HandlerOutcome::NoEffect;
    };
    let window_end = proposal.created_at_block + proposal.voting_period_blocks;
    if block_index >= window_end {
        debug!(proposal_id = %p.proposal_id, "vote outside voting window, no-op");
        return HandlerOutcome::NoEffect;
    }
    // Invariant #9: a voter appears at most once.
    if !proposal.voters.insert(sender.clone()) {
        debug!(sender = %sender, proposal_id = %p.proposal_id, "duplicate vote, no-op");
        return HandlerOutcome::NoEffect;
    }
    match p.choice {
        VoteChoice::Yes => proposal.yes += 1,
        VoteChoice::No => proposal.no += 1,
        VoteChoice::Abstain => proposal.abstain += 1,
    }
    HandlerOutcome::Applied
}

fn social_recovery_update(
    state: &mut ChainState,
    sender: &ledger_core::NodeId,
    p: SocialRecoveryUpdatePayload,
) -> HandlerOutcome {
    // Invariant #8.
    if p.guardians.is_empty() {
        return HandlerOutcome::NoEffect;
    }
    if p.recovery_threshold < 1 || p.recovery_threshold as usize > p.guardians.len() {
        return HandlerOutcome::NoEffect;
    }
    state.account_states.insert(
        sender.clone(),
        AccountState {
            guardians: p.guardians,
            recovery_threshold: p.recovery_threshold,
        },
    );
    HandlerOutcome::Applied
}

fn karma_earn(state: &mut ChainState, p: KarmaEarnPayload) -> HandlerOutcome {
    *state.karma_balances.entry(p.recipient).or_insert(0) += p.amount;
    HandlerOutcome::Applied
}

fn karma_ubi(state: &mut ChainState, p: KarmaUbiPayload) -> HandlerOutcome {
    *state.karma_balances.entry(p.recipient).or_insert(0) += p.amount;
    HandlerOutcome::Applied
}

fn karma_transfer(
    state: &mut ChainState,
    sender: &ledger_core::NodeId,
    p: KarmaTransferPayload,
) -> HandlerOutcome {
    // Invariant #6: reject if sender balance is less than the amount.
    let sender_balance = state.karma_balances.get(sender).copied().unwrap_or(0);
    if sender_balance < p.amount {
        debug!(sender = %sender, amount = p.amount, "KARMA_TRANSFER insufficient funds, no-op");
        return HandlerOutcome::NoEffect;
    }
    *state.karma_balances.get_mut(sender).expect("checked above") -= p.amount;
    *state.karma_balances.entry(p.recipient).or_insert(0) += p.amount;
    HandlerOutcome::Applied
}
