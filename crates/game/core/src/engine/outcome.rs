use core::fmt;

use crate::state::{MatchScore, Side};

/// Result of comparing one attribute between the two contestants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum RoundResult {
    WinA,
    WinB,
    Draw,
}

impl RoundResult {
    pub const fn winner(&self) -> Option<Side> {
        match self {
            Self::WinA => Some(Side::A),
            Self::WinB => Some(Side::B),
            Self::Draw => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WinA => "winA",
            Self::WinB => "winB",
            Self::Draw => "draw",
        }
    }
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw comparison of two values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Comparison {
    /// `value_a - value_b`.
    pub delta: i64,
    pub result: RoundResult,
}

/// Outcome of a resolved round.
///
/// Built by [`super::handle_selection`], consumed by the battle machine and
/// then dropped; only the score it carries outlives the round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundOutcome {
    pub delta: i64,
    pub result: RoundResult,
    /// Score after applying this round.
    pub score: MatchScore,
    pub match_ended: bool,
}
