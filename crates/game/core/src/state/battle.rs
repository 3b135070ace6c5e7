use core::fmt;

/// The closed set of battle states. Exactly one is active at any time and it
/// is owned by the runtime's battle machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum BattleState {
    WaitingForMatchStart,
    RoundStart,
    WaitingForPlayerAction,
    RoundDecision,
    RoundOver,
    MatchOver,
    InterruptRound,
    InterruptMatch,
}

/// Events that drive [`BattleState`] transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum Trigger {
    StartClicked,
    CardsRevealed,
    StatSelected,
    TimerExpired,
    OutcomeComputed,
    DecisionGuardExpired,
    CooldownFinished,
    MatchEnded,
    Interrupt,
    InterruptMatch,
    RetryRound,
    ConcludeMatch,
    RestartMatch,
}

impl BattleState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingForMatchStart => "waitingForMatchStart",
            Self::RoundStart => "roundStart",
            Self::WaitingForPlayerAction => "waitingForPlayerAction",
            Self::RoundDecision => "roundDecision",
            Self::RoundOver => "roundOver",
            Self::MatchOver => "matchOver",
            Self::InterruptRound => "interruptRound",
            Self::InterruptMatch => "interruptMatch",
        }
    }

    /// States in which a match is running and interrupts are accepted.
    pub const fn is_in_match(&self) -> bool {
        matches!(
            self,
            Self::RoundStart | Self::WaitingForPlayerAction | Self::RoundDecision | Self::RoundOver
        )
    }

    /// Terminal states that only leave through `RestartMatch`.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::MatchOver | Self::InterruptMatch)
    }

    /// Transition table. Returns `None` when `trigger` is not valid in this
    /// state; the machine ignores such triggers.
    pub const fn next(self, trigger: Trigger) -> Option<BattleState> {
        use BattleState as S;
        use Trigger as T;

        match (self, trigger) {
            (S::WaitingForMatchStart, T::StartClicked) => Some(S::RoundStart),
            (S::RoundStart, T::CardsRevealed) => Some(S::WaitingForPlayerAction),
            (S::WaitingForPlayerAction, T::StatSelected | T::TimerExpired) => {
                Some(S::RoundDecision)
            }
            (S::RoundDecision, T::OutcomeComputed) => Some(S::RoundOver),
            (S::RoundDecision, T::DecisionGuardExpired) => Some(S::InterruptRound),
            (S::RoundOver, T::CooldownFinished) => Some(S::RoundStart),
            (S::RoundOver, T::MatchEnded) => Some(S::MatchOver),
            (S::MatchOver | S::InterruptMatch, T::RestartMatch) => Some(S::WaitingForMatchStart),
            (
                S::RoundStart | S::WaitingForPlayerAction | S::RoundDecision | S::RoundOver,
                T::Interrupt,
            ) => Some(S::InterruptRound),
            (
                S::RoundStart
                | S::WaitingForPlayerAction
                | S::RoundDecision
                | S::RoundOver
                | S::InterruptRound,
                T::InterruptMatch,
            ) => Some(S::InterruptMatch),
            (S::InterruptRound, T::RetryRound) => Some(S::RoundStart),
            (S::InterruptRound, T::ConcludeMatch) => Some(S::MatchOver),
            _ => None,
        }
    }
}

impl fmt::Display for BattleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Trigger {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StartClicked => "startClicked",
            Self::CardsRevealed => "cardsRevealed",
            Self::StatSelected => "statSelected",
            Self::TimerExpired => "timerExpired",
            Self::OutcomeComputed => "outcomeComputed",
            Self::DecisionGuardExpired => "decisionGuardExpired",
            Self::CooldownFinished => "cooldownFinished",
            Self::MatchEnded => "matchEnded",
            Self::Interrupt => "interrupt",
            Self::InterruptMatch => "interruptMatch",
            Self::RetryRound => "retryRound",
            Self::ConcludeMatch => "concludeMatch",
            Self::RestartMatch => "restartMatch",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an interrupt voids the current round or ends the whole match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptScope {
    Round,
    Match,
}

/// Why the machine left the nominal round flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum InterruptReason {
    /// Drawing contestants failed or returned malformed cards.
    RoundStartError,
    /// The revealed opponent card could not be compared.
    RoundResolveError,
    /// The opponent card never arrived within the decision guard window.
    PostResolveWatchdog,
    /// The user quit the match.
    Quit,
}

impl InterruptReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RoundStartError => "roundStartError",
            Self::RoundResolveError => "roundResolveError",
            Self::PostResolveWatchdog => "postResolveWatchdog",
            Self::Quit => "quit",
        }
    }

    pub const fn scope(&self) -> InterruptScope {
        match self {
            Self::Quit => InterruptScope::Match,
            _ => InterruptScope::Round,
        }
    }

    /// Resolution applied without waiting for the host.
    ///
    /// Only the watchdog resolves itself: a stalled opponent reveal voids the
    /// round and a fresh one starts. Data errors wait for the host so failed
    /// draws are never retried in a loop.
    pub const fn auto_resolution(&self) -> Option<InterruptResolution> {
        match self {
            Self::PostResolveWatchdog => Some(InterruptResolution::RetryRound),
            _ => None,
        }
    }
}

impl fmt::Display for InterruptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an `InterruptRound` is left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum InterruptResolution {
    RetryRound,
    ConcludeMatch,
}

impl InterruptResolution {
    pub const fn trigger(&self) -> Trigger {
        match self {
            Self::RetryRound => Trigger::RetryRound,
            Self::ConcludeMatch => Trigger::ConcludeMatch,
        }
    }
}
