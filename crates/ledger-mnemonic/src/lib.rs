//! ledger-mnemonic
//!
//! Deterministic 12-word recovery-phrase derivation and hash-based
//! verification (spec.md §4.1). The phrase itself is never persisted —
//! only `SHA-256(lowercase(trim(phrase)))`, alongside the node's join
//! event — so a verifier can confirm a candidate phrase without the
//! original ever having been stored anywhere.

pub mod derive;
pub mod verifier;
pub mod wordlist;

pub use derive::generate_phrase;
pub use verifier::{hash_phrase, validate_phrase_shape, verify_phrase};

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_crypto::KeyPair;

    #[test]
    fn phrase_roundtrips_through_hash() {
        let kp = KeyPair::generate();
        let phrase = generate_phrase(kp.secret_key_bytes()).unwrap();
        let hash = hash_phrase(&phrase);
        assert!(verify_phrase(&phrase, &hash).unwrap());
    }

    #[test]
    fn wrong_phrase_fails_verification() {
        let kp = KeyPair::generate();
        let phrase = generate_phrase(kp.secret_key_bytes()).unwrap();
        let hash = hash_phrase(&phrase);
        let other = KeyPair::generate();
        let other_phrase = generate_phrase(other.secret_key_bytes()).unwrap();
        assert!(!verify_phrase(&other_phrase, &hash).unwrap());
    }

    #[test]
    fn wrong_word_count_rejected() {
        let err = validate_phrase_shape("abacus anchor anvil").unwrap_err();
        assert!(matches!(err, ledger_core::LedgerError::MnemonicWordCount(3)));
    }

    #[test]
    fn unknown_word_rejected() {
        let phrase = "abacus anchor anvil apple arrow ash aspen atlas aurora autumn badge notaword";
        let err = validate_phrase_shape(phrase).unwrap_err();
        assert!(matches!(err, ledger_core::LedgerError::MnemonicUnknownWord(_)));
    }

    #[test]
    fn is_case_and_whitespace_insensitive() {
        let kp = KeyPair::generate();
        let phrase = generate_phrase(kp.secret_key_bytes()).unwrap();
        let hash = hash_phrase(&phrase);
        let shouty = format!("  {}  ", phrase.to_uppercase());
        assert!(verify_phrase(&shouty, &hash).unwrap());
    }
}
