use ed25519_dalek::{Keypair as DalekKeypair, PublicKey, SecretKey};
use ledger_core::{LedgerError, NodeId, PublicKeyBytes, Signature};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::hash::node_id_from_pubkey;

/// A node's Ed25519 keypair with its derived `NodeId`.
///
/// The secret key is held as raw bytes and zeroized on drop; it never
/// leaves process memory unexported (spec.md §3.3).
#[derive(Serialize, Deserialize)]
pub struct KeyPair {
    pub node_id: NodeId,
    pub public_key: PublicKeyBytes,
    secret_key: Vec<u8>,
}

impl KeyPair {
    /// Generate a fresh Ed25519 keypair.
    pub fn generate() -> Self {
        let mut csprng = OsRng {};
        let dalek = DalekKeypair::generate(&mut csprng);
        Self::from_raw(dalek.public.to_bytes().to_vec(), dalek.secret.to_bytes().to_vec())
    }

    /// Restore a keypair from a raw 32-byte Ed25519 secret-key seed,
    /// re-deriving the public key. Used when importing from a mnemonic or a
    /// persisted key store.
    pub fn from_secret_seed(seed: &[u8]) -> Result<Self, LedgerError> {
        let secret = SecretKey::from_bytes(seed)
            .map_err(|_| LedgerError::Other("invalid Ed25519 secret seed".into()))?;
        let public: PublicKey = (&secret).into();
        Ok(Self::from_raw(public.to_bytes().to_vec(), secret.to_bytes().to_vec()))
    }

    /// Construct directly from known public/secret key bytes (e.g. loaded
    /// from the node's persisted key store).
    pub fn from_raw(pk_bytes: Vec<u8>, sk_bytes: Vec<u8>) -> Self {
        let node_id = node_id_from_pubkey(&pk_bytes);
        Self {
            node_id,
            public_key: PublicKeyBytes(pk_bytes),
            secret_key: sk_bytes,
        }
    }

    /// Sign `message` using this keypair's secret key.
    pub fn sign(&self, message: &[u8]) -> Signature {
        crate::signing::sign(&self.secret_key, message)
            .expect("sign with a valid secret key is infallible")
    }

    /// Read-only view of the raw secret-key seed bytes, for mnemonic
    /// derivation and persisted storage only — never logged, never sent.
    pub fn secret_key_bytes(&self) -> &[u8] {
        &self.secret_key
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        self.secret_key.zeroize();
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ node_id: {:?} }}", self.node_id)
    }
}
