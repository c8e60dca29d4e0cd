//! NDJSON-over-TCP `ledger_network::Transport` implementation.
//!
//! spec.md §6.3 names WebRTC signaling/relay as the production transport,
//! and scopes its internals out of this workspace. A runnable node still
//! needs *some* concrete `Transport`, so this binary drives peers over
//! plain TCP instead: one canonical-JSON `WireMessage` per line. Before any
//! `WireMessage` crosses the wire, each side writes a one-line `IDENT
//! <node_id>` handshake so both ends learn the peer's identity the instant
//! the socket opens — without it, neither side's `NetworkEngine` would ever
//! see a `PeerJoined` event to send its own HELLO from, and the connection
//! would stall on read.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ledger_core::{LedgerError, NodeId};
use ledger_network::{Transport, TransportEvent, WireMessage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

type ConnId = u64;

struct Connection {
    node_id: Option<NodeId>,
    outbound: mpsc::UnboundedSender<WireMessage>,
}

/// Tracks one TCP socket per peer. Connections are keyed by an opaque
/// `ConnId` until their `IDENT` line arrives, then also indexed by
/// `NodeId` so `send_to`/`broadcast_except` can address a peer directly.
pub struct TcpTransport {
    local_node_id: NodeId,
    events_tx: mpsc::Sender<TransportEvent>,
    next_conn_id: AtomicU64,
    connections: Mutex<HashMap<ConnId, Connection>>,
    by_node: Mutex<HashMap<NodeId, ConnId>>,
}

impl TcpTransport {
    /// Bind `listen_addr` and return the transport, the event stream a
    /// `NetworkEngine` should be driven with, and the address actually
    /// bound (useful when `listen_addr`'s port is `0`).
    pub async fn bind(
        local_node_id: NodeId,
        listen_addr: SocketAddr,
    ) -> anyhow::Result<(Arc<Self>, mpsc::Receiver<TransportEvent>, SocketAddr)> {
        let (events_tx, events_rx) = mpsc::channel(256);
        let transport = Arc::new(Self {
            local_node_id,
            events_tx,
            next_conn_id: AtomicU64::new(0),
            connections: Mutex::new(HashMap::new()),
            by_node: Mutex::new(HashMap::new()),
        });

        let listener = TcpListener::bind(listen_addr).await?;
        let bound_addr = listener.local_addr()?;
        info!(%bound_addr, "tcp transport listening");

        let accept_transport = transport.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, peer_addr)) => {
                        debug!(%peer_addr, "inbound connection");
                        accept_transport.clone().spawn_connection(stream);
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                }
            }
        });

        Ok((transport, events_rx, bound_addr))
    }

    /// Dial a peer at `addr`. Errors are the caller's to log; a failed dial
    /// does not prevent later inbound connections from that same peer.
    pub async fn dial(self: &Arc<Self>, addr: SocketAddr) -> anyhow::Result<()> {
        let stream = TcpStream::connect(addr).await?;
        self.clone().spawn_connection(stream);
        Ok(())
    }

    fn spawn_connection(self: Arc<Self>, stream: TcpStream) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::SeqCst);
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<WireMessage>();
        let (read_half, mut write_half) = stream.into_split();
        let local_node_id = self.local_node_id.clone();

        tokio::spawn(async move {
            let ident_line = format!("IDENT {}\n", local_node_id.as_str());
            if write_half.write_all(ident_line.as_bytes()).await.is_err() {
                return;
            }
            while let Some(message) = outbound_rx.recv().await {
                let mut line = message.to_canonical_bytes();
                line.push(b'\n');
                if write_half.write_all(&line).await.is_err() {
                    break;
                }
            }
        });

        let transport = self.clone();
        tokio::spawn(async move {
            transport
                .connections
                .lock()
                .await
                .insert(conn_id, Connection { node_id: None, outbound: outbound_tx });

            let mut lines = BufReader::new(read_half).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => transport.on_line(conn_id, &line).await,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "connection read error");
                        break;
                    }
                }
            }
            transport.on_disconnect(conn_id).await;
        });
    }

    async fn on_line(&self, conn_id: ConnId, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        if let Some(raw_id) = line.strip_prefix("IDENT ") {
            let node_id = NodeId::new(raw_id.trim());
            if let Some(conn) = self.connections.lock().await.get_mut(&conn_id) {
                conn.node_id = Some(node_id.clone());
            }
            self.by_node.lock().await.insert(node_id.clone(), conn_id);
            let _ = self.events_tx.send(TransportEvent::PeerJoined(node_id)).await;
            return;
        }

        let from = {
            let connections = self.connections.lock().await;
            match connections.get(&conn_id).and_then(|c| c.node_id.clone()) {
                Some(id) => id,
                None => {
                    debug!("dropping frame received before the peer identified itself");
                    return;
                }
            }
        };

        match WireMessage::from_bytes(line.as_bytes()) {
            Ok(message) => {
                let _ = self.events_tx.send(TransportEvent::Message { from, payload: message }).await;
            }
            Err(e) => warn!(error = %e, "dropping malformed frame"),
        }
    }

    async fn on_disconnect(&self, conn_id: ConnId) {
        let node_id = self.connections.lock().await.remove(&conn_id).and_then(|c| c.node_id);
        if let Some(node_id) = node_id {
            self.by_node.lock().await.remove(&node_id);
            let _ = self.events_tx.send(TransportEvent::PeerLeft(node_id)).await;
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn register(&self, _node_id: &NodeId, _chain_length: u64, _chain_epoch: u64) -> Result<(), LedgerError> {
        // There is no signaling fabric to announce to over plain TCP —
        // presence is simply whichever peers currently hold an open socket.
        Ok(())
    }

    async fn send_to(&self, node_id: &NodeId, message: &WireMessage) -> Result<(), LedgerError> {
        let conn_id = *self
            .by_node
            .lock()
            .await
            .get(node_id)
            .ok_or_else(|| LedgerError::UnknownNode(node_id.to_string()))?;
        let connections = self.connections.lock().await;
        let conn = connections
            .get(&conn_id)
            .ok_or_else(|| LedgerError::UnknownNode(node_id.to_string()))?;
        conn.outbound
            .send(message.clone())
            .map_err(|_| LedgerError::Other(format!("writer task for {node_id} is gone")))
    }

    async fn broadcast(&self, message: &WireMessage) -> Result<(), LedgerError> {
        let connections = self.connections.lock().await;
        for conn in connections.values() {
            let _ = conn.outbound.send(message.clone());
        }
        Ok(())
    }

    async fn broadcast_except(&self, exclude: &NodeId, message: &WireMessage) -> Result<(), LedgerError> {
        let exclude_conn = self.by_node.lock().await.get(exclude).copied();
        let connections = self.connections.lock().await;
        for (conn_id, conn) in connections.iter() {
            if Some(*conn_id) == exclude_conn {
                continue;
            }
            let _ = conn.outbound.send(message.clone());
        }
        Ok(())
    }

    async fn disconnect(&self, node_id: &NodeId) -> Result<(), LedgerError> {
        if let Some(conn_id) = self.by_node.lock().await.remove(node_id) {
            self.connections.lock().await.remove(&conn_id);
        }
        Ok(())
    }
}
