//! The async pipeline: shared atomic state, the bounded hand-off channel
//! with its swappable identity, and the single-consumer processor.

pub(crate) mod channel;
pub(crate) mod processor;
pub(crate) mod state;

pub use state::LoggerStats;
