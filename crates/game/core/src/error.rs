//! Common error infrastructure for battle-core.
//!
//! Rule errors are plain data so the runtime can route them into interrupts
//! or fallbacks instead of propagating them out of the state machine.

/// Severity level of an error, used by the runtime to pick a recovery path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// A fallback exists; log and continue.
    ///
    /// Examples: missing or non-positive target score
    Recoverable,

    /// The input cannot be used for this round.
    ///
    /// Examples: contestant without stats, mismatched stat keys
    Validation,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Common trait for all battle-core errors.
pub trait BattleError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Stable identifier for logs and tests.
    fn error_code(&self) -> &'static str;
}

/// Invalid match configuration. Always resolved by falling back to a default.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConfigError {
    #[error("target score not configured")]
    MissingTarget,

    #[error("target score must be positive, got {raw}")]
    NonPositiveTarget { raw: i64 },

    #[error("target score {raw} is out of range")]
    TargetOutOfRange { raw: i64 },
}

impl BattleError for ConfigError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Recoverable
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingTarget => "CONFIG_MISSING_TARGET",
            Self::NonPositiveTarget { .. } => "CONFIG_NON_POSITIVE_TARGET",
            Self::TargetOutOfRange { .. } => "CONFIG_TARGET_OUT_OF_RANGE",
        }
    }
}

/// Malformed contestant data returned by a contestant source.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContestantError {
    #[error("contestant '{id}' has no stats")]
    NoStats { id: String },

    #[error("contestant '{id}' lists stat '{key}' more than once")]
    DuplicateStat { id: String, key: String },

    #[error("contestants '{a}' and '{b}' do not share the same stats")]
    MismatchedStats { a: String, b: String },

    #[error("contestant '{id}' has no stat '{key}'")]
    MissingStat { id: String, key: String },
}

impl BattleError for ContestantError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoStats { .. } => "CONTESTANT_NO_STATS",
            Self::DuplicateStat { .. } => "CONTESTANT_DUPLICATE_STAT",
            Self::MismatchedStats { .. } => "CONTESTANT_MISMATCHED_STATS",
            Self::MissingStat { .. } => "CONTESTANT_MISSING_STAT",
        }
    }
}
