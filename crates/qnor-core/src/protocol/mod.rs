//! Command sequencer and status poller

mod poll;
pub mod w25q;

pub use poll::{software_poll, MatchMode, PollCondition, PollTiming};
pub use w25q::{issue, JedecId, MemoryMappedMode};
