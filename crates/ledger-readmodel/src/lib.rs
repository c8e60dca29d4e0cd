pub mod adapter;
pub mod glow;

pub use adapter::{NodeMapSnapshot, PresenceUpdate, ReadModelAdapter, ReadModelEvent, SyncProgress, SyncStatus};
pub use glow::{glow_score, GlowBreakdown};
