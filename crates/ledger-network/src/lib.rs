//! Transport-agnostic peer protocol and sync engine (spec.md §4.7, §6.3).
//! The actual signaling/relay fabric is out of scope; this crate only
//! defines the `Transport` seam a real implementation drives and the
//! protocol logic that runs on top of it.

pub mod appmsg;
pub mod config;
pub mod connmgr;
pub mod engine;
pub mod message;
pub mod session;
pub mod sync;
pub mod transport;

pub use appmsg::AppMessageQueue;
pub use config::NetworkConfig;
pub use connmgr::{priority_score, ConnectionManager, Health, PriorityInputs};
pub use engine::NetworkEngine;
pub use message::{NodeType, WireMessage};
pub use session::{local_wins_glare, PeerInfo, PeerSession, PeerState};
pub use sync::{should_sync_on_hello, SyncGuard};
pub use transport::{Transport, TransportEvent};
