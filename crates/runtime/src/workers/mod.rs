//! Worker tasks that back the runtime orchestration.
//!
//! The battle worker owns the state machine and serializes every input,
//! whether it comes from a host command, a countdown or a contestant source.

mod battle;

pub use battle::{BattleWorker, Command};
pub(crate) use battle::WorkerParts;
