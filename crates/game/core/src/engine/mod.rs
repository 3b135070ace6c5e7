//! Round resolution rules.
//!
//! Pure functions over attribute values and scores. The runtime's battle
//! machine calls [`handle_selection`] once per round and applies the result;
//! nothing here touches timers, events or I/O.
//!
//! Scoring uses a fixed margin: the round winner gains exactly one point no
//! matter how large the attribute difference is. The delta is informational.

mod outcome;

pub use outcome::{Comparison, RoundOutcome, RoundResult};

use crate::state::{MatchScore, Side};

/// Compares two attribute values.
///
/// `delta` is computed in `i64` so it never overflows for `i32` inputs.
pub fn determine_outcome(value_a: i32, value_b: i32) -> Comparison {
    let delta = i64::from(value_a) - i64::from(value_b);
    let result = match delta.signum() {
        1 => RoundResult::WinA,
        -1 => RoundResult::WinB,
        _ => RoundResult::Draw,
    };
    Comparison { delta, result }
}

/// Applies a round result to the score: +1 to the winner, unchanged on a draw.
pub fn apply_outcome(score: MatchScore, result: RoundResult) -> MatchScore {
    match result.winner() {
        Some(Side::A) => MatchScore {
            a: score.a.saturating_add(1),
            ..score
        },
        Some(Side::B) => MatchScore {
            b: score.b.saturating_add(1),
            ..score
        },
        None => score,
    }
}

/// Resolves a round: compares the values, updates the score and flags the end
/// of the match once either side reaches `target_score`.
pub fn handle_selection(
    value_a: i32,
    value_b: i32,
    current: MatchScore,
    target_score: u32,
) -> RoundOutcome {
    let Comparison { delta, result } = determine_outcome(value_a, value_b);
    let score = apply_outcome(current, result);

    RoundOutcome {
        delta,
        result,
        score,
        match_ended: match_winner(score, target_score).is_some(),
    }
}

/// Side that has reached `target_score`, if any.
///
/// With fixed-margin scoring both sides can never reach the target in the same
/// round, but if a caller builds such a score the leader wins.
pub fn match_winner(score: MatchScore, target_score: u32) -> Option<Side> {
    match (score.a >= target_score, score.b >= target_score) {
        (true, false) => Some(Side::A),
        (false, true) => Some(Side::B),
        (true, true) => score.leader(),
        (false, false) => None,
    }
}
