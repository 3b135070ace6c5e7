//! Battle state representation.
//!
//! Contestants and scores are plain data; the [`BattleState`] transition
//! table lives here so both the runtime machine and offline tools agree on
//! which triggers are legal in which state.
mod battle;
mod contestant;
mod score;

pub use battle::{BattleState, InterruptReason, InterruptResolution, InterruptScope, Trigger};
pub use contestant::{Contestant, ContestantPair, Side, Stat};
pub use score::MatchScore;
