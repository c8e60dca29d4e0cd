use serde::{Deserialize, Serialize};

use crate::types::{Karma, NodeId, PublicKeyBytes, Signature, Timestamp};

// ── Vote choice / parent-edge mutation ───────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VoteChoice {
    Yes,
    No,
    Abstain,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParentAction {
    Add,
    Remove,
    Set,
}

// ── Type tag constants (spec.md §3.1) ────────────────────────────────────────

pub mod tags {
    pub const GENESIS: &str = "GENESIS";
    pub const NODE_JOIN: &str = "NODE_JOIN";
    pub const NODE_PARENT_REQUEST: &str = "NODE_PARENT_REQUEST";
    pub const NODE_PARENT_UPDATE: &str = "NODE_PARENT_UPDATE";
    pub const INSTITUTION_REGISTER: &str = "INSTITUTION_REGISTER";
    pub const INSTITUTION_VERIFY: &str = "INSTITUTION_VERIFY";
    pub const INSTITUTION_REVOKE: &str = "INSTITUTION_REVOKE";
    pub const SOULBOUND_MINT: &str = "SOULBOUND_MINT";
    pub const GOV_PROPOSAL: &str = "GOV_PROPOSAL";
    pub const VOTE_CAST: &str = "VOTE_CAST";
    pub const SOCIAL_RECOVERY_UPDATE: &str = "SOCIAL_RECOVERY_UPDATE";
    pub const KARMA_EARN: &str = "KARMA_EARN";
    pub const KARMA_TRANSFER: &str = "KARMA_TRANSFER";
    pub const KARMA_UBI: &str = "KARMA_UBI";
}

// ── Typed payload bodies ──────────────────────────────────────────────────────
//
// Each struct below is the type-specific field set for one tag in the closed
// transaction set (spec.md §3.1). They are parsed out of `Event::payload`
// on demand by `Event::parse`, rather than being the wire representation
// itself — see that method's doc comment for why.

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenesisPayload {
    pub unique_marker: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeJoinPayload {
    pub node_id: NodeId,
    pub name: String,
    pub public_key: PublicKeyBytes,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub recovery_phrase_hash: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeParentRequestPayload {
    pub parent_id: NodeId,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeParentUpdatePayload {
    pub node_id: NodeId,
    pub action: ParentAction,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstitutionRegisterPayload {
    pub name: String,
    pub category: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstitutionVerifyPayload {
    pub target_node_id: NodeId,
    pub approved: bool,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstitutionRevokePayload {
    pub target_node_id: NodeId,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SoulboundMintPayload {
    pub recipient: NodeId,
    pub achievement_id: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovProposalPayload {
    pub proposal_id: String,
    pub title: String,
    pub description: String,
    pub voting_period_blocks: u64,
    pub quorum_threshold: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoteCastPayload {
    pub proposal_id: String,
    pub choice: VoteChoice,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SocialRecoveryUpdatePayload {
    pub guardians: Vec<NodeId>,
    pub recovery_threshold: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KarmaEarnPayload {
    pub recipient: NodeId,
    pub amount: Karma,
    pub activity: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KarmaTransferPayload {
    pub recipient: NodeId,
    pub amount: Karma,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KarmaUbiPayload {
    pub recipient: NodeId,
    pub amount: Karma,
}

/// A parsed, type-safe view of `Event::payload`. Produced on demand by
/// `Event::parse` — see that method for why parsing is fallible and
/// fallibility is the forward-compatibility mechanism, not an error.
#[derive(Clone, Debug)]
pub enum ParsedPayload {
    Genesis(GenesisPayload),
    NodeJoin(NodeJoinPayload),
    NodeParentRequest(NodeParentRequestPayload),
    NodeParentUpdate(NodeParentUpdatePayload),
    InstitutionRegister(InstitutionRegisterPayload),
    InstitutionVerify(InstitutionVerifyPayload),
    InstitutionRevoke(InstitutionRevokePayload),
    SoulboundMint(SoulboundMintPayload),
    GovProposal(GovProposalPayload),
    VoteCast(VoteCastPayload),
    SocialRecoveryUpdate(SocialRecoveryUpdatePayload),
    KarmaEarn(KarmaEarnPayload),
    KarmaTransfer(KarmaTransferPayload),
    KarmaUbi(KarmaUbiPayload),
}

// ── Event ────────────────────────────────────────────────────────────────────

/// A typed, signed ledger transaction (spec.md §3.1).
///
/// `event_type` is a plain string rather than a closed Rust discriminant,
/// and `payload` is a raw JSON object rather than a matching enum variant.
/// This is the forward-compatibility mechanism spec.md §4.2 requires at the
/// wire layer: a peer running a newer protocol version can mint an event
/// type this build has never heard of, and it still deserializes, hashes,
/// and Merkle-proves correctly — `Event::parse` is the only place an
/// unrecognized `event_type` becomes visible, and there it yields `None`
/// rather than an error. `ledger-chain`'s dispatcher matches on `parse()`'s
/// result with an explicit no-op arm for `None`, which is the "exhaustive
/// match with a forward-compatible catch-all" spec.md §4.2 and Design
/// Notes §9 describe.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: Timestamp,
    pub sender: NodeId,
    #[serde(default)]
    pub recipient: Option<NodeId>,
    #[serde(default)]
    pub node_id: Option<NodeId>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: serde_json::Value,
    pub signature: Signature,
}

/// The signing input: every `Event` field except `signature`, in
/// field-declaration order, matching spec.md §6.1's canonical encoding
/// rule.
#[derive(Serialize)]
struct EventSigningBody<'a> {
    timestamp: Timestamp,
    sender: &'a NodeId,
    recipient: &'a Option<NodeId>,
    node_id: &'a Option<NodeId>,
    #[serde(rename = "type")]
    event_type: &'a str,
    payload: &'a serde_json::Value,
}

impl Event {
    pub fn new(
        timestamp: Timestamp,
        sender: NodeId,
        recipient: Option<NodeId>,
        node_id: Option<NodeId>,
        event_type: impl Into<String>,
        payload: serde_json::Value,
        signature: Signature,
    ) -> Self {
        Self {
            timestamp,
            sender,
            recipient,
            node_id,
            event_type: event_type.into(),
            payload,
            signature,
        }
    }

    /// Canonical signing bytes per spec.md §6.1.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let body = EventSigningBody {
            timestamp: self.timestamp,
            sender: &self.sender,
            recipient: &self.recipient,
            node_id: &self.node_id,
            event_type: &self.event_type,
            payload: &self.payload,
        };
        crate::canonical::to_canonical_bytes(&body)
    }

    /// Parse `payload` against `event_type`. Returns `None` for any type
    /// this build does not recognize, or whose payload fails to match the
    /// expected shape — both cases are handled identically by callers: a
    /// silent no-op, never a hard error (spec.md §4.2).
    pub fn parse(&self) -> Option<ParsedPayload> {
        let v = self.payload.clone();
        match self.event_type.as_str() {
            tags::GENESIS => serde_json::from_value(v).ok().map(ParsedPayload::Genesis),
            tags::NODE_JOIN => serde_json::from_value(v).ok().map(ParsedPayload::NodeJoin),
            tags::NODE_PARENT_REQUEST => serde_json::from_value(v)
                .ok()
                .map(ParsedPayload::NodeParentRequest),
            tags::NODE_PARENT_UPDATE => serde_json::from_value(v)
                .ok()
                .map(ParsedPayload::NodeParentUpdate),
            tags::INSTITUTION_REGISTER => serde_json::from_value(v)
                .ok()
                .map(ParsedPayload::InstitutionRegister),
            tags::INSTITUTION_VERIFY => serde_json::from_value(v)
                .ok()
                .map(ParsedPayload::InstitutionVerify),
            tags::INSTITUTION_REVOKE => serde_json::from_value(v)
                .ok()
                .map(ParsedPayload::InstitutionRevoke),
            tags::SOULBOUND_MINT => serde_json::from_value(v).ok().map(ParsedPayload::SoulboundMint),
            tags::GOV_PROPOSAL => serde_json::from_value(v).ok().map(ParsedPayload::GovProposal),
            tags::VOTE_CAST => serde_json::from_value(v).ok().map(ParsedPayload::VoteCast),
            tags::SOCIAL_RECOVERY_UPDATE => serde_json::from_value(v)
                .ok()
                .map(ParsedPayload::SocialRecoveryUpdate),
            tags::KARMA_EARN => serde_json::from_value(v).ok().map(ParsedPayload::KarmaEarn),
            tags::KARMA_TRANSFER => serde_json::from_value(v).ok().map(ParsedPayload::KarmaTransfer),
            tags::KARMA_UBI => serde_json::from_value(v).ok().map(ParsedPayload::KarmaUbi),
            _ => None,
        }
    }
}

/// Convenience constructors for each known event type, used by genesis
/// bootstrap, the CLI, and tests. Each builds the JSON payload and leaves
/// `signature` as `Signature::System` — callers that need a real signature
/// replace it after calling `Event::signing_bytes()`.
impl Event {
    pub fn unsigned(
        timestamp: Timestamp,
        sender: NodeId,
        event_type: &str,
        payload: impl Serialize,
    ) -> Self {
        Event::new(
            timestamp,
            sender,
            None,
            None,
            event_type,
            serde_json::to_value(payload).expect("payload serialization is infallible"),
            Signature::System,
        )
    }
}
