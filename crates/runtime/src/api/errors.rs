//! Error types surfaced by the runtime API.
//!
//! Worker coordination failures are reported through [`RuntimeError`];
//! contestant source failures travel as [`DrawError`] and end up in interrupt
//! payloads rather than in caller-facing results.
use thiserror::Error;
use tokio::sync::oneshot;

use battle_core::ContestantError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("battle worker command channel closed")]
    CommandChannelClosed,

    #[error("battle worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("battle worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("runtime requires a contestant source before building")]
    MissingContestantSource,
}

/// Failure to produce contestants for a round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawError {
    #[error("contestant draw rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Malformed(#[from] ContestantError),

    #[error("no contestants left to draw")]
    Exhausted,
}
