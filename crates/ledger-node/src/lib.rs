//! Library surface behind the `ledger-node` binary: local identity
//! persistence, chain load/bootstrap/prune glue, and the NDJSON-over-TCP
//! `Transport`. Exposed as a library (not just a `[[bin]]`) so integration
//! tests can wire up real `NetworkEngine`s over real sockets without
//! spawning a subprocess.

pub mod chainio;
pub mod identity;
pub mod transport;
