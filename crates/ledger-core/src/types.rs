use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Non-negative Karma point balance.
pub type Karma = u64;

// ── NodeId ───────────────────────────────────────────────────────────────────

/// Identity for a participant: `"node_" || hex(SHA-256(raw_public_key))[0:16]`.
///
/// Stored as the rendered string rather than raw bytes — every wire message
/// and storage key in spec.md §3/§6 addresses nodes by this string, and
/// re-deriving it from a public key is cheap (see `ledger_crypto::hash`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── BlockHash ────────────────────────────────────────────────────────────────

/// 32-byte SHA-256 block header hash, hex-rendered everywhere outside the
/// hashing routine itself.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHash(pub [u8; 32]);

impl BlockHash {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({}…)", &self.to_hex()[..16])
    }
}

// ── PublicKeyBytes ───────────────────────────────────────────────────────────

/// Raw Ed25519 public key bytes (32 bytes), base64-rendered on the wire per
/// spec.md §6.1's `HELLO.publicKey` field.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyBytes(pub Vec<u8>);

impl fmt::Debug for PublicKeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKeyBytes({}b)", self.0.len())
    }
}

// ── Signature ────────────────────────────────────────────────────────────────

pub const SYSTEM_SIGNATURE_MARKER: &str = "system";

/// Raw Ed25519 signature bytes (64 bytes), or the literal `"system"` marker
/// used by internally minted Karma events per spec.md §3.1. Rendered on the
/// wire as either the literal string `"system"` or a hex string, matching
/// the single JSON string field spec.md §3.1 describes.
#[derive(Clone, PartialEq, Eq)]
pub enum Signature {
    System,
    Bytes(Vec<u8>),
}

impl Signature {
    pub fn is_system(&self) -> bool {
        matches!(self, Signature::System)
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Signature::System => None,
            Signature::Bytes(b) => Some(b),
        }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::System => write!(f, "Signature(system)"),
            Signature::Bytes(b) => write!(f, "Signature({}b)", b.len()),
        }
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Signature::System => serializer.serialize_str(SYSTEM_SIGNATURE_MARKER),
            Signature::Bytes(b) => serializer.serialize_str(&hex::encode(b)),
        }
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == SYSTEM_SIGNATURE_MARKER {
            Ok(Signature::System)
        } else {
            let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
            Ok(Signature::Bytes(bytes))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_hash_hex_round_trips() {
        let hash = BlockHash::from_bytes([7u8; 32]);
        assert_eq!(BlockHash::from_hex(&hash.to_hex()).unwrap(), hash);
    }

    #[test]
    fn block_hash_from_hex_rejects_short_input() {
        let short = hex::encode([1u8; 16]);
        assert!(BlockHash::from_hex(&short).is_err());
    }

    #[test]
    fn block_hash_from_hex_rejects_long_input() {
        let long = hex::encode([1u8; 40]);
        assert!(BlockHash::from_hex(&long).is_err());
    }
}
