//! The transport/signaling collaborator consumed by the network engine
//! (spec.md §6.3). WebRTC signaling/relay internals are out of scope —
//! this crate only defines the interface an engine drives and the events
//! it expects back.

use async_trait::async_trait;
use ledger_core::{LedgerError, NodeId};

use crate::message::WireMessage;

/// Events a `Transport` delivers to the engine as they occur.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    PeerJoined(NodeId),
    PeerLeft(NodeId),
    Message { from: NodeId, payload: WireMessage },
}

/// A framed, ordered, reliable byte stream per peer with best-effort
/// delivery (spec.md §4.7's transport assumption). Implementations own the
/// actual signaling/relay connection; this crate only ever talks to peers
/// through this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Announce this node's presence and current chain position to the
    /// signaling fabric.
    async fn register(&self, node_id: &NodeId, chain_length: u64, chain_epoch: u64) -> Result<(), LedgerError>;

    /// Send a framed message to one named peer.
    async fn send_to(&self, node_id: &NodeId, message: &WireMessage) -> Result<(), LedgerError>;

    /// Send a framed message to every currently connected peer.
    async fn broadcast(&self, message: &WireMessage) -> Result<(), LedgerError>;

    /// Send a framed message to every connected peer except `exclude` —
    /// used for gossip rebroadcast (spec.md §4.7's loop-prevention rule).
    async fn broadcast_except(&self, exclude: &NodeId, message: &WireMessage) -> Result<(), LedgerError> {
        let _ = exclude;
        self.broadcast(message).await
    }

    /// Tear down the connection to one peer.
    async fn disconnect(&self, node_id: &NodeId) -> Result<(), LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<(NodeId, WireMessage)>>,
        broadcasts: Mutex<Vec<WireMessage>>,
    }

    #[async_trait]
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

        async fn disconnect(&self, _node_id: &NodeId) -> Result<(), LedgerError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn default_broadcast_except_falls_back_to_broadcast() {
        let transport = RecordingTransport::default();
        let message = WireMessage::Heartbeat {
            timestamp: 1,
            is_online: true,
            seen_online: Vec::new(),
        };
        transport
            .broadcast_except(&NodeId::new("node_origin"), &message)
            .await
            .unwrap();
        assert_eq!(transport.broadcasts.lock().unwrap().len(), 1);
    }
}
