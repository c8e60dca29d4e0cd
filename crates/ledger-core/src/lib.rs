pub mod canonical;
pub mod constants;
pub mod error;
pub mod event;
pub mod types;

pub use constants::*;
pub use error::LedgerError;
pub use event::*;
pub use types::*;
