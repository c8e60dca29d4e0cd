//! Per-peer session state machine (spec.md §4.7): `INIT -> HELLO_SENT ->
//! READY -> (SYNCING | IDLE) -> CLOSED`.

use std::time::Instant;

use ledger_core::{BlockHash, NodeId};

use crate::message::NodeType;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerState {
    Init,
    HelloSent,
    Ready,
    Syncing,
    Idle,
    Closed,
}

/// Peer metadata learned from its `HELLO`, refreshed as sync/heartbeat
/// messages arrive.
#[derive(Clone, Debug)]
pub struct PeerInfo {
    pub node_id: NodeId,
    pub public_key: String,
    pub chain_length: u64,
    pub latest_hash: Option<BlockHash>,
    pub protocol_version: u32,
    pub node_type: NodeType,
    pub chain_epoch: u64,
}

/// One peer's session state, owned by the network engine. `last_heartbeat`
/// and `connected_at` drive presence (spec.md §4.7) and health
/// classification (spec.md §4.8).
pub struct PeerSession {
    pub peer_id: NodeId,
    pub state: PeerState,
    pub info: Option<PeerInfo>,
    pub connected_at: Instant,
    pub last_heartbeat: Option<Instant>,
    pub last_activity: Instant,
}

impl PeerSession {
    pub fn new(peer_id: NodeId) -> Self {
        let now = Instant::now();
        Self {
            peer_id,
            state: PeerState::Init,
            info: None,
            connected_at: now,
            last_heartbeat: None,
            last_activity: now,
        }
    }

    pub fn mark_hello_sent(&mut self) {
        self.state = PeerState::HelloSent;
        self.touch();
    }

    pub fn mark_ready(&mut self, info: PeerInfo) {
        self.info = Some(info);
        self.state = PeerState::Ready;
        self.touch();
    }

    pub fn mark_syncing(&mut self) {
        self.state = PeerState::Syncing;
        self.touch();
    }

    pub fn mark_idle(&mut self) {
        if self.state != PeerState::Closed {
            self.state = PeerState::Idle;
        }
        self.touch();
    }

    pub fn mark_closed(&mut self) {
        self.state = PeerState::Closed;
    }

    pub fn record_heartbeat(&mut self) {
        let now = Instant::now();
        self.last_heartbeat = Some(now);
        self.last_activity = now;
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Online per spec.md §4.7: a framed session is open and a heartbeat
    /// has been observed within `inactivity_window`.
    pub fn is_online(&self, inactivity_window: std::time::Duration) -> bool {
        if self.state == PeerState::Closed {
            return false;
        }
        match self.last_heartbeat {
            Some(t) => t.elapsed() <= inactivity_window,
            None => false,
        }
    }
}

/// Glare avoidance (spec.md §4.7): when both peers try to initiate
/// simultaneously, the lexicographically lower node id wins. Returns `true`
/// if `local` should keep its own outbound offer (and the remote one should
/// be dropped in favor of accepting the inbound).
pub fn local_wins_glare(local: &NodeId, remote: &NodeId) -> bool {
    local.as_str() < remote.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_node_id_wins_glare() {
        assert!(local_wins_glare(&NodeId::new("node_a"), &NodeId::new("node_b")));
        assert!(!local_wins_glare(&NodeId::new("node_b"), &NodeId::new("node_a")));
    }

    #[test]
    fn session_transitions_track_expected_states() {
        let mut session = PeerSession::new(NodeId::new("node_peer"));
        assert_eq!(session.state, PeerState::Init);
        session.mark_hello_sent();
        assert_eq!(session.state, PeerState::HelloSent);
        session.mark_ready(PeerInfo {
            node_id: NodeId::new("node_peer"),
            public_key: "x".into(),
            chain_length: 1,
            latest_hash: None,
            protocol_version: 1,
            node_type: NodeType::Full,
            chain_epoch: 0,
        });
        assert_eq!(session.state, PeerState::Ready);
        session.mark_syncing();
        assert_eq!(session.state, PeerState::Syncing);
        session.mark_idle();
        assert_eq!(session.state, PeerState::Idle);
        session.mark_closed();
        assert_eq!(session.state, PeerState::Closed);
        session.mark_idle();
        assert_eq!(session.state, PeerState::Closed, "closed sessions don't return to idle");
    }

    #[test]
    fn offline_without_a_recent_heartbeat() {
        let session = PeerSession::new(NodeId::new("node_peer"));
        assert!(!session.is_online(std::time::Duration::from_secs(15)));
    }
}
