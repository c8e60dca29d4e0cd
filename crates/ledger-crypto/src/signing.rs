use ed25519_dalek::{PublicKey, Signature as DalekSignature, SecretKey, Signer};
use ledger_core::{PublicKeyBytes, Signature};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid public key length: expected {expected}, got {got}")]
    InvalidPublicKeyLength { expected: usize, got: usize },
    #[error("signature is the system marker, not a verifiable Ed25519 signature")]
    SystemMarker,
}

/// Sign `message` with an Ed25519 secret-key seed (32 bytes).
pub fn sign(secret_key_bytes: &[u8], message: &[u8]) -> Result<Signature, SignatureError> {
    let secret = SecretKey::from_bytes(secret_key_bytes)
        .map_err(|_| SignatureError::InvalidSignature)?;
    let public: PublicKey = (&secret).into();
    let expanded = ed25519_dalek::ExpandedSecretKey::from(&secret);
    let sig = expanded.sign(message, &public);
    Ok(Signature::Bytes(sig.to_bytes().to_vec()))
}

/// Verify an Ed25519 signature. Constant-time per `ed25519-dalek`'s
/// `verify_strict`. Rejects the `"system"` marker — only internally minted
/// Karma events carry that, and they are never routed through this check.
pub fn verify_signature(
    public_key: &PublicKeyBytes,
    message: &[u8],
    signature: &Signature,
) -> Result<(), SignatureError> {
    let sig_bytes = match signature {
        Signature::System => return Err(SignatureError::SystemMarker),
        Signature::Bytes(b) => b,
    };
    let pk = PublicKey::from_bytes(&public_key.0).map_err(|_| {
        SignatureError::InvalidPublicKeyLength {
            expected: 32,
            got: public_key.0.len(),
        }
    })?;
    let sig = DalekSignature::from_bytes(sig_bytes).map_err(|_| SignatureError::InvalidSignature)?;
    pk.verify_strict(message, &sig)
        .map_err(|_| SignatureError::InvalidSignature)
}
