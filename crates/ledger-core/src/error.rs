use thiserror::Error;

/// The closed error taxonomy for the ledger engine, covering every failure
/// mode spec.md §7 names. Structural errors (`InvalidBlock` and friends) are
/// fatal for the offending block and never mutate chain state; everything
/// else is either an automatic-recovery timeout or a reported-but-harmless
/// rejection (handler no-ops are not represented here at all — per spec.md
/// §4.2 they return `Ok(HandlerOutcome::NoEffect)`, not an `Err`).
#[derive(Debug, Error)]
pub enum LedgerError {
    // ── Structural (spec.md §7, fatal for the block) ──────────────────────────
    #[error("block index {got} is not the next expected index {expected}")]
    IndexMismatch { expected: u64, got: u64 },

    #[error("block previousHash does not match the chain tip")]
    PreviousHashMismatch,

    #[error("block header hash does not match its computed hash")]
    HashMismatch,

    #[error("block failed structural validation: {0}")]
    InvalidBlock(String),

    #[error("merkle root does not match the block body")]
    MerkleRootMismatch,

    // ── Lookup failures ────────────────────────────────────────────────────────
    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("unknown block index: {0}")]
    UnknownBlockIndex(u64),

    #[error("transaction not found: {0}")]
    UnknownTransaction(String),

    #[error("proposal not found: {0}")]
    UnknownProposal(String),

    // ── Crypto / mnemonic ──────────────────────────────────────────────────────
    #[error("invalid signature")]
    InvalidSignature,

    #[error("mnemonic phrase must contain exactly 12 words, got {0}")]
    MnemonicWordCount(usize),

    #[error("unknown mnemonic word: {0}")]
    MnemonicUnknownWord(String),

    #[error("mnemonic phrase does not match the stored hash")]
    MnemonicHashMismatch,

    // ── Chain / sync ───────────────────────────────────────────────────────────
    #[error("candidate chain's genesis is incompatible with the local chain")]
    DivergentGenesis,

    #[error("candidate chain is shorter or equal and loses the tiebreaker")]
    ChainRejectedByTiebreaker,

    #[error("cannot prune below the configured retention depth")]
    PruneWindowTooSmall,

    #[error("checkpoint continuity broken at index {0}")]
    CheckpointDiscontinuity(u64),

    // ── Transport / codec ────────────────────────────────────────────────────
    #[error("failed to decode wire message: {0}")]
    Codec(String),

    #[error("peer session is not in a state that accepts this message")]
    UnexpectedPeerState,

    // ── Persistence ────────────────────────────────────────────────────────────
    #[error("storage error: {0}")]
    Storage(String),

    #[error("storage backend unavailable, retry with backoff")]
    StorageUnavailable,

    // ── General ────────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl LedgerError {
    pub fn storage(e: impl std::fmt::Display) -> Self {
        LedgerError::Storage(e.to_string())
    }
}
