pub mod hash;
pub mod keypair;
pub mod signing;

pub use hash::{hash_to_block_hash, node_id_from_pubkey, sha256};
pub use keypair::KeyPair;
pub use signing::{sign, verify_signature, SignatureError};
