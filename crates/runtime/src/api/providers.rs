//! Asynchronous sources of contestants and match settings.
//!
//! Runtime users plug in a [`ContestantSource`] so rounds can be dealt from a
//! roster file, a remote service or a scripted fixture.
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use battle_core::{Contestant, ContestantPair};

use super::errors::DrawError;

/// Deals the two cards for each round.
#[async_trait]
pub trait ContestantSource: Send + Sync {
    /// Draws the pair for `round`. The returned pair is validated by the
    /// runtime before use.
    async fn draw_contestants(&self, round: u32) -> Result<ContestantPair, DrawError>;

    /// Reveals the opponent card after the player has committed to a stat.
    ///
    /// The default reveals the card that was drawn.
    async fn reveal_opponent(
        &self,
        _round: u32,
        drawn: &Contestant,
    ) -> Result<Contestant, DrawError> {
        Ok(drawn.clone())
    }
}

/// Source of the configured points-to-win value.
pub trait SettingsProvider: Send + Sync {
    /// Raw target score as stored, before validation.
    fn target_score(&self) -> Option<i64>;
}

/// Settings fixed at construction time.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSettings {
    target_score: Option<i64>,
}

impl FixedSettings {
    pub fn new(target_score: i64) -> Self {
        Self {
            target_score: Some(target_score),
        }
    }

    pub fn unset() -> Self {
        Self::default()
    }
}

impl SettingsProvider for FixedSettings {
    fn target_score(&self) -> Option<i64> {
        self.target_score
    }
}

/// Plays back a fixed list of draws, then reports [`DrawError::Exhausted`]
/// unless a repeating pair was configured.
pub struct ScriptedSource {
    draws: Mutex<VecDeque<Result<ContestantPair, DrawError>>>,
    repeat: Option<ContestantPair>,
}

impl ScriptedSource {
    pub fn new(draws: impl IntoIterator<Item = Result<ContestantPair, DrawError>>) -> Self {
        Self {
            draws: Mutex::new(draws.into_iter().collect()),
            repeat: None,
        }
    }

    /// Deals the same pair every round.
    pub fn repeating(pair: ContestantPair) -> Self {
        Self {
            draws: Mutex::new(VecDeque::new()),
            repeat: Some(pair),
        }
    }

    /// Deals the scripted draws first, then `pair` forever.
    pub fn then_repeat(mut self, pair: ContestantPair) -> Self {
        self.repeat = Some(pair);
        self
    }
}

#[async_trait]
impl ContestantSource for ScriptedSource {
    async fn draw_contestants(&self, _round: u32) -> Result<ContestantPair, DrawError> {
        let next = self
            .draws
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front();

        match (next, &self.repeat) {
            (Some(draw), _) => draw,
            (None, Some(pair)) => Ok(pair.clone()),
            (None, None) => Err(DrawError::Exhausted),
        }
    }
}
