//! Wire message types exchanged between peers (spec.md §4.7, §6.1). Framing
//! is canonical JSON objects carrying a `type` discriminator, so this enum
//! is internally tagged — unlike `ledger_core::Event`, the message set here
//! is closed and transport-internal; there is no forward-compatibility
//! requirement on it.

use ledger_block::{Block, BlockHeader, MerkleProof};
use ledger_core::{BlockHash, Event, NodeId, Timestamp};
use serde::{Deserialize, Serialize};

/// `HELLO.nodeType` — whether the peer holds a full replica or only headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeType {
    Full,
    Light,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireMessage {
    #[serde(rename = "HELLO")]
    Hello {
        timestamp: Timestamp,
        node_id: NodeId,
        public_key: String,
        chain_length: u64,
        latest_hash: Option<BlockHash>,
        protocol_version: u32,
        node_type: NodeType,
        chain_epoch: u64,
    },
    #[serde(rename = "SYNC_REQUEST")]
    SyncRequest { timestamp: Timestamp, from_index: u64 },
    #[serde(rename = "SYNC_RESPONSE")]
    SyncResponse { timestamp: Timestamp, blocks: Vec<Block> },
    #[serde(rename = "NEW_BLOCK")]
    NewBlock { timestamp: Timestamp, block: Block },
    #[serde(rename = "HEADER_SYNC_REQUEST")]
    HeaderSyncRequest { timestamp: Timestamp, from_index: u64, to_index: u64 },
    #[serde(rename = "HEADER_SYNC_RESPONSE")]
    HeaderSyncResponse { timestamp: Timestamp, headers: Vec<BlockHeader> },
    #[serde(rename = "MERKLE_PROOF_REQUEST")]
    MerkleProofRequest {
        timestamp: Timestamp,
        block_index: Option<u64>,
        transaction_id: String,
    },
    #[serde(rename = "MERKLE_PROOF_RESPONSE")]
    MerkleProofResponse {
        timestamp: Timestamp,
        block_index: u64,
        block_hash: BlockHash,
        header: BlockHeader,
        transaction_index: usize,
        transaction: Event,
        proof: MerkleProof,
    },
    #[serde(rename = "HEARTBEAT")]
    Heartbeat {
        timestamp: Timestamp,
        is_online: bool,
        seen_online: Vec<NodeId>,
    },
    #[serde(rename = "PARENT_REQUEST")]
    ParentRequest {
        timestamp: Timestamp,
        child_id: NodeId,
        parent_id: NodeId,
    },
    #[serde(rename = "PARENT_RESPONSE")]
    ParentResponse {
        timestamp: Timestamp,
        child_id: NodeId,
        parent_id: NodeId,
        approved: bool,
    },
}

impl WireMessage {
    pub fn type_tag(&self) -> &'static str {
        match self {
            WireMessage::Hello { .. } => "HELLO",
            WireMessage::SyncRequest { .. } => "SYNC_REQUEST",
            WireMessage::SyncResponse { .. } => "SYNC_RESPONSE",
            WireMessage::NewBlock { .. } => "NEW_BLOCK",
            WireMessage::HeaderSyncRequest { .. } => "HEADER_SYNC_REQUEST",
            WireMessage::HeaderSyncResponse { .. } => "HEADER_SYNC_RESPONSE",
            WireMessage::MerkleProofRequest { .. } => "MERKLE_PROOF_REQUEST",
            WireMessage::MerkleProofResponse { .. } => "MERKLE_PROOF_RESPONSE",
            WireMessage::Heartbeat { .. } => "HEARTBEAT",
            WireMessage::ParentRequest { .. } => "PARENT_REQUEST",
            WireMessage::ParentResponse { .. } => "PARENT_RESPONSE",
        }
    }

    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        ledger_core::canonical::to_canonical_bytes(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ledger_core::LedgerError> {
        serde_json::from_slice(bytes).map_err(|e| ledger_core::LedgerError::Codec(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_round_trips_through_canonical_bytes() {
        let msg = WireMessage::Hello {
            timestamp: 1,
            node_id: NodeId::new("node_a"),
            public_key: "YWJj".into(),
            chain_length: 3,
            latest_hash: None,
            protocol_version: 1,
            node_type: NodeType::Full,
            chain_epoch: 0,
        };
        let bytes = msg.to_canonical_bytes();
        let decoded = WireMessage::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.type_tag(), "HELLO");
    }

    #[test]
    fn rejects_garbage_bytes() {
        assert!(WireMessage::from_bytes(b"not json").is_err());
    }
}
