//! The network engine: the orchestrator that drives a `Transport`,
//! tracks per-peer sessions, and applies the sync protocol (spec.md
//! §4.7) against a shared `Chain`. Ledger mutation stays single-owner —
//! every path here takes the chain mutex, does its work, and drops it
//! before touching the transport (spec.md §5).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ledger_block::Block;
use ledger_chain::{merge, Chain};
use ledger_core::{LedgerError, NodeId};
use ledger_readmodel::ReadModelAdapter;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::appmsg::AppMessageQueue;
use crate::config::NetworkConfig;
use crate::connmgr::{priority_score, ConnectionManager, PriorityInputs};
use crate::message::{NodeType, WireMessage};
use crate::session::{local_wins_glare, PeerInfo, PeerSession, PeerState};
use crate::sync::SyncGuard;
use crate::transport::{Transport, TransportEvent};

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub struct NetworkEngine<T: Transport> {
    node_id: NodeId,
    public_key: String,
    chain: Arc<Mutex<Chain>>,
    transport: Arc<T>,
    config: NetworkConfig,
    sessions: Mutex<HashMap<NodeId, PeerSession>>,
    connmgr: Mutex<ConnectionManager>,
    sync_guard: Mutex<SyncGuard>,
    app_queue: Mutex<AppMessageQueue>,
    readmodel: Arc<ReadModelAdapter>,
}

impl<T: Transport> NetworkEngine<T> {
    pub fn new(
        node_id: NodeId,
        public_key: String,
        chain: Arc<Mutex<Chain>>,
        transport: Arc<T>,
        config: NetworkConfig,
        readmodel: Arc<ReadModelAdapter>,
    ) -> Self {
        let connmgr = ConnectionManager::new(config.max_connections, config.min_connections, config.health_check_interval);
        let sync_guard = SyncGuard::new(config.sync_watchdog);
        let app_queue = AppMessageQueue::new(
            config.app_message_max_retries,
            config.app_message_backoff_min,
            config.app_message_backoff_max,
            config.app_message_queue_expiry,
        );
        Self {
            node_id,
            public_key,
            chain,
            transport,
            config,
            sessions: Mutex::new(HashMap::new()),
            connmgr: Mutex::new(connmgr),
            sync_guard: Mutex::new(sync_guard),
            app_queue: Mutex::new(app_queue),
            readmodel,
        }
    }

    /// Drive the engine's event loop until `inbound` closes. Run this in a
    /// dedicated task.
    pub async fn run(&self, mut inbound: mpsc::Receiver<TransportEvent>) {
        while let Some(event) = inbound.recv().await {
            self.handle_event(event).await;
        }
    }

    async fn handle_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::PeerJoined(peer_id) => self.on_peer_joined(peer_id).await,
            TransportEvent::PeerLeft(peer_id) => self.on_peer_left(peer_id).await,
            TransportEvent::Message { from, payload } => self.on_message(from, payload).await,
        }
    }

    async fn on_peer_joined(&self, peer_id: NodeId) {
        // A second `PeerJoined` for a peer we already have a live session
        // with means both sides dialed each other around the same time
        // (spec.md §4.7's glare scenario): the lexicographically lower node
        // id wins and keeps its own outbound offer, the loser drops its
        // offer and accepts the inbound side instead. Either way the
        // redundant connection this event arrived on is torn down.
        let already_connected = {
            let sessions = self.sessions.lock().await;
            matches!(
                sessions.get(&peer_id).map(|s| s.state),
                Some(PeerState::HelloSent | PeerState::Ready | PeerState::Syncing | PeerState::Idle)
            )
        };
        if already_connected {
            if local_wins_glare(&self.node_id, &peer_id) {
                debug!(%peer_id, "glare: keeping our own outbound offer, dropping the redundant connection");
            } else {
                info!(%peer_id, "glare: dropping our pending offer in favor of the peer's connection");
            }
            if let Err(e) = self.transport.disconnect(&peer_id).await {
                warn!(%peer_id, error = %e, "failed to drop redundant glare connection");
            }
            return;
        }

        // Admission is priority-scored (spec.md §4.8): under capacity every
        // candidate is let in, at capacity only one that outranks the
        // current weakest connection is, evicting that weakest connection.
        // Peer info (chain length, node type) isn't known yet at this
        // point — HELLO hasn't been exchanged — so this is a conservative
        // full-node, zero-advantage estimate; `handle_hello` recomputes it
        // with real data once the peer's HELLO arrives.
        let initial_priority = priority_score(&PriorityInputs {
            chain_length_advantage: 0,
            connected_for: Duration::ZERO,
            is_full_node: true,
        });
        let (admitted, evicted) = self.connmgr.lock().await.admit(initial_priority);
        if let Some(evicted_peer) = evicted {
            info!(%evicted_peer, "connection pool full, evicting weaker peer for incoming candidate");
            if let Err(e) = self.transport.disconnect(&evicted_peer).await {
                warn!(peer = %evicted_peer, error = %e, "failed to disconnect evicted peer");
            }
            self.on_peer_left(evicted_peer).await;
        }
        if !admitted {
            debug!(%peer_id, "connection pool full, candidate does not outrank the weakest peer, rejecting");
            if let Err(e) = self.transport.disconnect(&peer_id).await {
                warn!(%peer_id, error = %e, "failed to reject peer over capacity");
            }
            return;
        }

        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(peer_id.clone()).or_insert_with(|| PeerSession::new(peer_id.clone()));
        session.mark_hello_sent();
        drop(sessions);

        let (chain_length, latest_hash) = {
            let chain = self.chain.lock().await;
            (chain.len(), Some(chain.tip().hash.clone()))
        };
        let hello = WireMessage::Hello {
            timestamp: now(),
            node_id: self.node_id.clone(),
            public_key: self.public_key.clone(),
            chain_length,
            latest_hash,
            protocol_version: self.config.protocol_version,
            node_type: NodeType::Full,
            chain_epoch: 0,
        };
        if let Err(e) = self.transport.send_to(&peer_id, &hello).await {
            warn!(%peer_id, error = %e, "failed to send HELLO");
        }

        self.connmgr.lock().await.record(peer_id, initial_priority);
    }

    async fn on_peer_left(&self, peer_id: NodeId) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&peer_id) {
            session.mark_closed();
        }
        drop(sessions);
        self.connmgr.lock().await.remove(&peer_id);
    }

    async fn on_message(&self, from: NodeId, message: WireMessage) {
        match message {
            WireMessage::Hello {
                node_id,
                public_key,
                chain_length,
                latest_hash,
                protocol_version,
                node_type,
                chain_epoch,
                ..
            } => {
                self.handle_hello(from, PeerInfo {
                    node_id,
                    public_key,
                    chain_length,
                    latest_hash,
                    protocol_version,
                    node_type,
                    chain_epoch,
                })
                .await
            }
            WireMessage::SyncRequest { from_index, .. } => self.handle_sync_request(from, from_index).await,
            WireMessage::SyncResponse { blocks, .. } => self.handle_sync_response(from, blocks).await,
            WireMessage::NewBlock { block, .. } => self.handle_new_block(from, block).await,
            WireMessage::HeaderSyncRequest { from_index, to_index, .. } => {
                self.handle_header_sync_request(from, from_index, to_index).await
            }
            WireMessage::HeaderSyncResponse { .. } => {
                debug!(%from, "header sync response received; light-client-side handling lives in ledger-lightclient");
            }
            WireMessage::MerkleProofRequest {
                block_index,
                transaction_id,
                ..
            } => self.handle_merkle_proof_request(from, block_index, transaction_id).await,
            WireMessage::MerkleProofResponse { .. } => {
                debug!(%from, "merkle proof response received; verification lives in ledger-lightclient");
            }
            WireMessage::Heartbeat { is_online, .. } => self.handle_heartbeat(from, is_online).await,
            WireMessage::ParentRequest { child_id, parent_id, .. } => {
                info!(%from, %child_id, %parent_id, "parent request received; caller decides whether to submit NODE_PARENT_UPDATE");
            }
            WireMessage::ParentResponse {
                child_id, parent_id, approved, ..
            } => {
                info!(%from, %child_id, %parent_id, approved, "parent response received");
            }
        }
    }

    /// Send an application message to `target`, queueing it instead if the
    /// peer isn't currently `Ready`/`Idle`/`Syncing` (spec.md §4.7's
    /// queued PARENT_REQUEST/RESPONSE delivery contract).
    async fn send_or_queue(&self, target: NodeId, message: WireMessage) {
        let connected = matches!(
            self.sessions.lock().await.get(&target).map(|s| s.state),
            Some(crate::session::PeerState::Ready | crate::session::PeerState::Idle | crate::session::PeerState::Syncing)
        );
        if connected {
            if let Err(e) = self.transport.send_to(&target, &message).await {
                warn!(%target, error = %e, "delivery failed, queueing for retry");
                self.app_queue.lock().await.enqueue(target, message);
            }
        } else {
            self.app_queue.lock().await.enqueue(target, message);
        }
    }

    /// Request that `parent_id` approve `child_id` joining as its child.
    pub async fn request_parent(&self, child_id: NodeId, parent_id: NodeId) {
        let message = WireMessage::ParentRequest {
            timestamp: now(),
            child_id,
            parent_id: parent_id.clone(),
        };
        self.send_or_queue(parent_id, message).await;
    }

    /// Reply to a pending parent request.
    pub async fn respond_to_parent_request(&self, child_id: NodeId, parent_id: NodeId, approved: bool) {
        let message = WireMessage::ParentResponse {
            timestamp: now(),
            child_id: child_id.clone(),
            parent_id,
            approved,
        };
        self.send_or_queue(child_id, message).await;
    }

    /// Flush any application messages queued for a peer that just became
    /// reachable again. `AppMessageQueue::drain_for` only supports a
    /// synchronous delivery callback, so this collects the due messages
    /// first and sends them afterward, re-queueing any that fail.
    async fn flush_queue_for(&self, target: &NodeId) {
        let mut due = Vec::new();
        self.app_queue.lock().await.drain_for(target, |message| {
            due.push(message.clone());
            true
        });
        for message in due {
            if let Err(e) = self.transport.send_to(target, &message).await {
                warn!(%target, error = %e, "re-queueing application message after flush failure");
                self.app_queue.lock().await.enqueue(target.clone(), message);
            }
        }
    }

    async fn handle_hello(&self, from: NodeId, info: PeerInfo) {
        let chain_length_advantage = {
            let chain = self.chain.lock().await;
            info.chain_length as i64 - chain.len() as i64
        };
        let is_full_node = matches!(info.node_type, NodeType::Full);

        let connected_for = {
            let mut sessions = self.sessions.lock().await;
            let session = sessions.entry(from.clone()).or_insert_with(|| PeerSession::new(from.clone()));
            session.mark_ready(info);
            session.connected_at.elapsed()
        };
        // Now that the peer's real chain length and node type are known,
        // refine the conservative estimate `on_peer_joined` recorded it
        // with (spec.md §4.8's priority inputs).
        let priority = priority_score(&PriorityInputs {
            chain_length_advantage,
            connected_for,
            is_full_node,
        });
        self.connmgr.lock().await.record(from.clone(), priority);

        self.flush_queue_for(&from).await;
        self.request_sync(from).await;
    }

    async fn request_sync(&self, to: NodeId) {
        let mut guard = self.sync_guard.lock().await;
        if !guard.try_begin() {
            debug!(%to, "sync already in flight, skipping");
            return;
        }
        drop(guard);

        if let Some(session) = self.sessions.lock().await.get_mut(&to) {
            session.mark_syncing();
        }
        let request = WireMessage::SyncRequest { timestamp: now(), from_index: 0 };
        if let Err(e) = self.transport.send_to(&to, &request).await {
            warn!(%to, error = %e, "failed to send SYNC_REQUEST");
            self.sync_guard.lock().await.finish();
        }
    }

    async fn handle_sync_request(&self, from: NodeId, from_index: u64) {
        let chain = self.chain.lock().await;
        let blocks: Vec<Block> = chain
            .blocks()
            .iter()
            .filter(|b| b.header.index >= from_index)
            .cloned()
            .collect();
        drop(chain);
        let response = WireMessage::SyncResponse { timestamp: now(), blocks };
        if let Err(e) = self.transport.send_to(&from, &response).await {
            warn!(%from, error = %e, "failed to send SYNC_RESPONSE");
        }
    }

    /// spec.md §4.7's `SYNC_RESPONSE` handling: validate genesis
    /// compatibility, replace if the candidate wins, always attempt a
    /// unique-node merge so identities survive regardless of which side's
    /// chain wins.
    async fn handle_sync_response(&self, from: NodeId, blocks: Vec<Block>) {
        if blocks.is_empty() {
            self.finish_sync(&from).await;
            return;
        }

        let candidate = match Chain::from_blocks(blocks.clone()) {
            Ok(c) => c,
            Err(e) => {
                warn!(%from, error = %e, "rejecting malformed sync response");
                self.finish_sync(&from).await;
                return;
            }
        };

        let mut chain = self.chain.lock().await;
        let pre_replacement_blocks = chain.blocks().to_vec();
        let adopt = chain.should_adopt(&candidate);
        let mut appended = Vec::new();
        match adopt {
            Ok(true) => {
                if let Err(e) = chain.replace_chain(blocks) {
                    warn!(%from, error = %e, "failed to replace chain with adopted candidate");
                } else if let Ok(donated) =
                    merge::unique_node_merge(&mut chain, &pre_replacement_blocks, &self.node_id, now())
                {
                    appended = donated;
                }
            }
            Ok(false) => {
                if let Ok(donated) = merge::unique_node_merge(&mut chain, &candidate.blocks().to_vec(), &self.node_id, now()) {
                    appended = donated;
                }
            }
            Err(e) => warn!(%from, error = %e, "tiebreaker rejected candidate chain"),
        }
        self.readmodel.emit_node_map(chain.state());
        drop(chain);

        for block in appended {
            let message = WireMessage::NewBlock { timestamp: block.header.timestamp, block };
            if let Err(e) = self.transport.broadcast_except(&from, &message).await {
                warn!(error = %e, "failed to broadcast donated unique-node block");
            }
        }

        self.finish_sync(&from).await;
    }

    async fn finish_sync(&self, peer: &NodeId) {
        self.sync_guard.lock().await.finish();
        if let Some(session) = self.sessions.lock().await.get_mut(peer) {
            session.mark_idle();
        }
    }

    /// spec.md §4.7's `NEW_BLOCK` handling.
    async fn handle_new_block(&self, from: NodeId, block: Block) {
        let mut chain = self.chain.lock().await;
        let expected_index = chain.len();

        if block.header.index < expected_index {
            if let Ok(appended) = merge::unique_node_merge(&mut chain, std::slice::from_ref(&block), &self.node_id, now()) {
                if !appended.is_empty() {
                    self.readmodel.emit_node_map(chain.state());
                }
            }
            return;
        }

        if block.header.index > expected_index {
            drop(chain);
            self.request_sync(from).await;
            return;
        }

        let tip_hash = chain.tip().hash.clone();
        if block.header.previous_hash.as_ref() != Some(&tip_hash) {
            drop(chain);
            self.request_sync(from).await;
            return;
        }

        match chain.apply(block.clone()) {
            Ok(()) => {
                self.readmodel.emit_node_map(chain.state());
                drop(chain);
                let message = WireMessage::NewBlock { timestamp: block.header.timestamp, block };
                if let Err(e) = self.transport.broadcast_except(&from, &message).await {
                    warn!(error = %e, "failed to rebroadcast new block");
                }
            }
            Err(e) => warn!(%from, error = %e, "rejected new block"),
        }
    }

    /// Propose a locally-minted block: apply, then broadcast on success.
    /// There is no vote/commit step (spec.md §4.7) — authority is enforced
    /// entirely by the handlers inside `apply`.
    pub async fn propose(&self, block: Block) -> Result<(), LedgerError> {
        let mut chain = self.chain.lock().await;
        chain.apply(block.clone())?;
        self.readmodel.emit_node_map(chain.state());
        drop(chain);
        let message = WireMessage::NewBlock { timestamp: block.header.timestamp, block };
        self.transport.broadcast(&message).await
    }

    async fn handle_header_sync_request(&self, from: NodeId, from_index: u64, to_index: u64) {
        let chain = self.chain.lock().await;
        let headers = chain
            .blocks()
            .iter()
            .filter(|b| b.header.index >= from_index && b.header.index < to_index)
            .map(|b| b.header.clone())
            .collect();
        drop(chain);
        let response = WireMessage::HeaderSyncResponse { timestamp: now(), headers };
        if let Err(e) = self.transport.send_to(&from, &response).await {
            warn!(%from, error = %e, "failed to send HEADER_SYNC_RESPONSE");
        }
    }

    async fn handle_merkle_proof_request(&self, from: NodeId, block_index: Option<u64>, transaction_id: String) {
        let chain = self.chain.lock().await;
        match ledger_chain::prove_transaction(&chain, block_index, &transaction_id) {
            Ok(proof) => {
                drop(chain);
                let response = WireMessage::MerkleProofResponse {
                    timestamp: now(),
                    block_index: proof.block_index,
                    block_hash: proof.block_hash,
                    header: proof.header,
                    transaction_index: proof.transaction_index,
                    transaction: proof.transaction,
                    proof: proof.proof,
                };
                if let Err(e) = self.transport.send_to(&from, &response).await {
                    warn!(%from, error = %e, "failed to send MERKLE_PROOF_RESPONSE");
                }
            }
            Err(e) => warn!(%from, %transaction_id, error = %e, "could not produce merkle proof"),
        }
    }

    async fn handle_heartbeat(&self, from: NodeId, is_online: bool) {
        let last_seen = now();
        {
            let mut sessions = self.sessions.lock().await;
            if let Some(session) = sessions.get_mut(&from) {
                session.record_heartbeat();
            }
        }
        self.connmgr.lock().await.touch(&from);
        self.readmodel.emit_presence(from, is_online, last_seen);
    }

    /// Periodic health sweep (spec.md §4.8): close stale sessions and
    /// report how many connections remain below `MIN_CONNECTIONS`.
    pub async fn health_sweep(&self) -> (Vec<NodeId>, bool) {
        let stale = self.connmgr.lock().await.stale_peers();
        for peer in &stale {
            if let Err(e) = self.transport.disconnect(peer).await {
                warn!(%peer, error = %e, "failed to disconnect stale peer");
            }
            self.on_peer_left(peer.clone()).await;
        }
        let needs_more = self.connmgr.lock().await.needs_more();
        (stale, needs_more)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.config.heartbeat_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{tags, Event, GenesisPayload};
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: StdMutex<Vec<(NodeId, WireMessage)>>,
        broadcasts: StdMutex<Vec<WireMessage>>,
        disconnected: StdMutex<Vec<NodeId>>,
    }

    #[async_trait::async_trait]
    impl Transport for RecordingTransport {
        async fn register(&self, _node_id: &NodeId, _chain_length: u64, _chain_epoch: u64) -> Result<(), LedgerError> {
            Ok(())
        }

        async fn send_to(&self, node_id: &NodeId, message: &WireMessage) -> Result<(), LedgerError> {
            self.sent.lock().unwrap().push((node_id.clone(), message.clone()));
            Ok(())
        }

        async fn broadcast(&self, message: &WireMessage) -> Result<(), LedgerError> {
            self.broadcasts.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn disconnect(&self, node_id: &NodeId) -> Result<(), LedgerError> {
            self.disconnected.lock().unwrap().push(node_id.clone());
            Ok(())
        }
    }

    fn genesis_chain() -> Chain {
        Chain::new_genesis(1, NodeId::new("node_genesis"), "alpha")
    }

    fn engine(chain: Chain) -> (NetworkEngine<RecordingTransport>, Arc<RecordingTransport>) {
        engine_with_config(chain, NetworkConfig::default())
    }

    fn engine_with_config(chain: Chain, config: NetworkConfig) -> (NetworkEngine<RecordingTransport>, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::default());
        let engine = NetworkEngine::new(
            NodeId::new("node_local"),
            "pk".into(),
            Arc::new(Mutex::new(chain)),
            transport.clone(),
            config,
            Arc::new(ReadModelAdapter::new(8)),
        );
        (engine, transport)
    }

    #[tokio::test]
    async fn peer_joined_sends_hello() {
        let (engine, transport) = engine(genesis_chain());
        engine.on_peer_joined(NodeId::new("node_peer")).await;
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0].1, WireMessage::Hello { .. }));
    }

    #[tokio::test]
    async fn hello_triggers_a_sync_request() {
        let (engine, transport) = engine(genesis_chain());
        engine
            .handle_hello(
                NodeId::new("node_peer"),
                PeerInfo {
                    node_id: NodeId::new("node_peer"),
                    public_key: "pk".into(),
                    chain_length: 1,
                    latest_hash: None,
                    protocol_version: 1,
                    node_type: NodeType::Full,
                    chain_epoch: 0,
                },
            )
            .await;
        let sent = transport.sent.lock().unwrap();
        assert!(sent.iter().any(|(_, m)| matches!(m, WireMessage::SyncRequest { .. })));
    }

    #[tokio::test]
    async fn matching_index_block_appends_and_rebroadcasts() {
        let (engine, transport) = engine(genesis_chain());
        let tip_hash = {
            let chain = engine.chain.lock().await;
            chain.tip().hash.clone()
        };
        let event = Event::unsigned(2, NodeId::new("nA"), tags::GENESIS, GenesisPayload { unique_marker: "ignored".into() });
        let block = Block::assemble(1, 2, Some(tip_hash), NodeId::new("nA"), 0, vec![event]);
        engine.handle_new_block(NodeId::new("node_peer"), block).await;

        let chain = engine.chain.lock().await;
        assert_eq!(chain.len(), 2);
        drop(chain);
        let broadcasts = transport.broadcasts.lock().unwrap();
        assert_eq!(broadcasts.len(), 1);
    }

    #[tokio::test]
    async fn future_index_block_requests_sync_instead_of_applying() {
        let (engine, transport) = engine(genesis_chain());
        let event = Event::unsigned(2, NodeId::new("nA"), tags::GENESIS, GenesisPayload { unique_marker: "ignored".into() });
        let block = Block::assemble(5, 2, None, NodeId::new("nA"), 0, vec![event]);
        engine.handle_new_block(NodeId::new("node_peer"), block).await;

        let chain = engine.chain.lock().await;
        assert_eq!(chain.len(), 1, "out-of-order block must not apply");
        drop(chain);
        let sent = transport.sent.lock().unwrap();
        assert!(sent.iter().any(|(_, m)| matches!(m, WireMessage::SyncRequest { .. })));
    }

    #[tokio::test]
    async fn peer_joined_beyond_capacity_is_rejected_without_a_hello() {
        let config = NetworkConfig { max_connections: 1, min_connections: 1, ..NetworkConfig::default() };
        let (engine, transport) = engine_with_config(genesis_chain(), config);
        engine.on_peer_joined(NodeId::new("node_first")).await;
        engine.on_peer_joined(NodeId::new("node_second")).await;

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1, "only the first, capacity-admitted peer gets a HELLO");
        assert_eq!(sent[0].0, NodeId::new("node_first"));
        let disconnected = transport.disconnected.lock().unwrap();
        assert_eq!(*disconnected, vec![NodeId::new("node_second")]);
    }

    #[tokio::test]
    async fn stronger_candidate_evicts_the_weakest_connection_at_capacity() {
        let config = NetworkConfig { max_connections: 1, min_connections: 1, ..NetworkConfig::default() };
        let (engine, transport) = engine_with_config(genesis_chain(), config);
        engine.on_peer_joined(NodeId::new("node_weak")).await;
        // node_weak's real HELLO shows it behind our single-block chain, so
        // its refined priority drops below a brand-new candidate's
        // conservative zero-advantage admission estimate.
        engine
            .handle_hello(
                NodeId::new("node_weak"),
                PeerInfo {
                    node_id: NodeId::new("node_weak"),
                    public_key: "pk".into(),
                    chain_length: 0,
                    latest_hash: None,
                    protocol_version: 1,
                    node_type: NodeType::Full,
                    chain_epoch: 0,
                },
            )
            .await;

        engine.on_peer_joined(NodeId::new("node_strong")).await;

        let disconnected = transport.disconnected.lock().unwrap();
        assert!(disconnected.contains(&NodeId::new("node_weak")), "weakest connection should be evicted");
        let sent = transport.sent.lock().unwrap();
        assert!(sent.iter().any(|(peer, m)| peer == &NodeId::new("node_strong") && matches!(m, WireMessage::Hello { .. })));
    }

    #[tokio::test]
    async fn glare_drops_the_redundant_connection_instead_of_resending_hello() {
        let (engine, transport) = engine(genesis_chain());
        engine.on_peer_joined(NodeId::new("node_peer")).await;
        assert_eq!(transport.sent.lock().unwrap().len(), 1, "first join sends one HELLO");

        // A second PeerJoined for the same peer while the first session is
        // still live (spec.md §4.7's glare scenario) must not send a second
        // HELLO — the redundant connection is torn down instead.
        engine.on_peer_joined(NodeId::new("node_peer")).await;
        assert_eq!(transport.sent.lock().unwrap().len(), 1, "glare must not re-send HELLO");
        assert_eq!(*transport.disconnected.lock().unwrap(), vec![NodeId::new("node_peer")]);
    }
}
