//! ─── Federated Ledger Constants ─────────────────────────────────────────────
//!
//! Defaults for every tunable enumerated in spec.md §6.4. `ledger-node`'s
//! `LedgerConfig` derives from these; tests and the CLI may override any of
//! them individually.

// ── Connection manager (§4.8, §6.4) ──────────────────────────────────────────

/// Upper bound on concurrent peer sessions.
pub const MAX_CONNECTIONS: usize = 50;

/// Target minimum peer sessions, proactively established.
pub const MIN_CONNECTIONS: usize = 5;

/// Cadence for the stale-session sweep (seconds).
pub const HEALTH_CHECK_INTERVAL_SECS: u64 = 60;

/// Cadence for priority-based connection rotation (seconds).
pub const ROTATION_INTERVAL_SECS: u64 = 5 * 60;

// ── Presence / sync (§4.7) ───────────────────────────────────────────────────

/// Presence broadcast cadence (seconds).
pub const HEARTBEAT_INTERVAL_SECS: u64 = 5;

/// Periodic sync check cadence (seconds).
pub const SYNC_POLL_INTERVAL_SECS: u64 = 10;

/// Hard cap on a single-flight sync before the watchdog clears it (seconds).
pub const SYNC_WATCHDOG_SECS: u64 = 30;

/// Window after which a session is considered no longer online absent a
/// heartbeat (seconds). Several multiples of `HEARTBEAT_INTERVAL_SECS`.
pub const PRESENCE_INACTIVITY_SECS: i64 = 15;

// ── Application message queueing (§4.7) ──────────────────────────────────────

/// Maximum retry attempts for a queued PARENT_REQUEST/RESPONSE.
pub const APP_MESSAGE_MAX_RETRIES: u32 = 5;

/// Minimum backoff between application-message retries (seconds).
pub const APP_MESSAGE_BACKOFF_MIN_SECS: u64 = 2;

/// Maximum backoff between application-message retries (seconds).
pub const APP_MESSAGE_BACKOFF_MAX_SECS: u64 = 3;

/// Queued application requests older than this are dropped (seconds).
pub const APP_MESSAGE_QUEUE_EXPIRY_SECS: i64 = 5 * 60;

// ── Pruning / checkpoints (§4.5) ─────────────────────────────────────────────

/// Blocks retained locally after a prune.
pub const PRUNE_KEEP_BLOCKS: u64 = 1000;

/// Block spacing between checkpoints.
pub const CHECKPOINT_INTERVAL: u64 = 100;

// ── Protocol / schema versioning (§6.4) ──────────────────────────────────────

/// Compatibility gate advertised in HELLO.
pub const PROTOCOL_VERSION: u32 = 1;

/// Storage migration gate; migrations only ever append object stores.
pub const SCHEMA_VERSION: u32 = 1;

// ── Signaling reconnect backoff (§5) ─────────────────────────────────────────

/// Initial reconnect backoff (seconds): 1s, 2s, 3s, then x1.5 up to the cap.
pub const RECONNECT_BACKOFF_STEPS_SECS: [u64; 3] = [1, 2, 3];

/// Reconnect backoff ceiling (seconds).
pub const RECONNECT_BACKOFF_MAX_SECS: u64 = 30;

/// Maximum reconnect attempts before giving up.
pub const RECONNECT_MAX_ATTEMPTS: u32 = 10;

/// Keep-alive cadence toward the signaling/transport fabric (seconds).
pub const TRANSPORT_KEEPALIVE_SECS: u64 = 25;

// ── Mnemonic derivation (§4.1, §9) ────────────────────────────────────────────

/// Byte offset into the 32-byte Ed25519 seed where mnemonic derivation
/// begins. Pinned at 0 to resolve the "offset fragility" design note —
/// this crate has exactly one derivation, ever.
pub const MNEMONIC_SEED_OFFSET: usize = 0;

/// Number of words in a recovery phrase.
pub const MNEMONIC_WORD_COUNT: usize = 12;

/// Size of the fixed mnemonic vocabulary.
pub const MNEMONIC_WORDLIST_SIZE: usize = 256;

// ── Node id derivation (§4.1) ─────────────────────────────────────────────────

/// Number of leading hex characters of SHA-256(pubkey) retained in a node id.
pub const NODE_ID_HEX_PREFIX_LEN: usize = 16;

/// Prefix prepended to every node id.
pub const NODE_ID_PREFIX: &str = "node_";
