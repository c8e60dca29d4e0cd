use ledger_core::{LedgerError, MNEMONIC_SEED_OFFSET, MNEMONIC_WORDLIST_SIZE, MNEMONIC_WORD_COUNT};

use crate::wordlist::WORDLIST;

/// Deterministically derive a 12-word recovery phrase from a private-key
/// seed (spec.md §4.1).
///
/// Takes `MNEMONIC_WORD_COUNT` bytes of `seed` starting at
/// `MNEMONIC_SEED_OFFSET` and maps each byte into the fixed vocabulary via
/// `seed[i] as usize % WORDLIST.len()`. The modulo is defensive only — the
/// vocabulary is exactly 256 words and a byte already ranges 0..256, so the
/// mapping is a direct index in practice; the modulo just keeps this
/// correct if the vocabulary size is ever compacted.
pub fn generate_phrase(seed: &[u8]) -> Result<String, LedgerError> {
    let end = MNEMONIC_SEED_OFFSET + MNEMONIC_WORD_COUNT;
    if seed.len() < end {
        return Err(LedgerError::Other(format!(
            "seed too short for mnemonic derivation: need {} bytes, got {}",
            end,
            seed.len()
        )));
    }
    debug_assert_eq!(WORDLIST.len(), MNEMONIC_WORDLIST_SIZE);

    let words: Vec<&str> = seed[MNEMONIC_SEED_OFFSET..end]
        .iter()
        .map(|&b| WORDLIST[b as usize % WORDLIST.len()])
        .collect();
    Ok(words.join(" "))
}
