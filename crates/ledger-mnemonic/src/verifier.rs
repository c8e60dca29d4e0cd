use ledger_core::{LedgerError, MNEMONIC_WORD_COUNT};
use ledger_crypto::sha256;

use crate::wordlist::WORDLIST;

/// `SHA-256(lowercase(trim(phrase)))`, hex-encoded — the only form a
/// recovery phrase is ever persisted in (spec.md §4.1).
pub fn hash_phrase(phrase: &str) -> String {
    let normalized = phrase.trim().to_lowercase();
    hex::encode(sha256(normalized.as_bytes()))
}

/// Validate a candidate phrase's shape before anything touches key
/// material: exactly `MNEMONIC_WORD_COUNT` words, every word in the fixed
/// vocabulary. Spec.md §4.1: "unknown word or non-12-word count → rejected
/// without attempting import."
pub fn validate_phrase_shape(phrase: &str) -> Result<Vec<String>, LedgerError> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.len() != MNEMONIC_WORD_COUNT {
        return Err(LedgerError::MnemonicWordCount(words.len()));
    }
    for w in &words {
        let lower = w.to_lowercase();
        if !WORDLIST.contains(&lower.as_str()) {
            return Err(LedgerError::MnemonicUnknownWord(w.to_string()));
        }
    }
    Ok(words.into_iter().map(|w| w.to_lowercase()).collect())
}

/// Verify a candidate phrase against a stored hash without ever disclosing
/// the original phrase (spec.md §4.1's "enabling verification without
/// disclosure").
pub fn verify_phrase(phrase: &str, stored_hash: &str) -> Result<bool, LedgerError> {
    validate_phrase_shape(phrase)?;
    Ok(hash_phrase(phrase) == stored_hash)
}
