use crate::error::ConfigError;

/// Match configuration read once when a match starts.
///
/// Immutable for the duration of the match; a new value is only picked up on
/// the next `start_match`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchConfig {
    /// Points required to win the match. Always greater than zero.
    pub target_score: u32,
}

impl MatchConfig {
    /// Fallback used when the settings value is missing or invalid.
    pub const DEFAULT_TARGET_SCORE: u32 = 5;

    pub fn new() -> Self {
        Self {
            target_score: Self::DEFAULT_TARGET_SCORE,
        }
    }

    /// Builds a config with the given target, rejecting zero.
    pub fn with_target_score(target_score: u32) -> Result<Self, ConfigError> {
        if target_score == 0 {
            return Err(ConfigError::NonPositiveTarget { raw: 0 });
        }
        Ok(Self { target_score })
    }

    /// Sanitizes a raw settings value.
    ///
    /// Missing, non-positive or out-of-range values fall back to
    /// [`Self::DEFAULT_TARGET_SCORE`]; the returned error describes why so the
    /// caller can log it. The fallback is never propagated as a failure.
    pub fn from_setting(raw: Option<i64>) -> (Self, Option<ConfigError>) {
        let Some(raw) = raw else {
            return (Self::new(), Some(ConfigError::MissingTarget));
        };

        if raw <= 0 {
            return (Self::new(), Some(ConfigError::NonPositiveTarget { raw }));
        }

        match u32::try_from(raw) {
            Ok(target_score) => (Self { target_score }, None),
            Err(_) => (Self::new(), Some(ConfigError::TargetOutOfRange { raw })),
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_setting_is_used_verbatim() {
        let (config, error) = MatchConfig::from_setting(Some(10));
        assert_eq!(config.target_score, 10);
        assert!(error.is_none());
    }

    #[test]
    fn invalid_settings_fall_back_to_default() {
        for raw in [None, Some(0), Some(-3), Some(i64::MAX)] {
            let (config, error) = MatchConfig::from_setting(raw);
            assert_eq!(config.target_score, MatchConfig::DEFAULT_TARGET_SCORE);
            assert!(error.is_some(), "expected fallback reason for {raw:?}");
        }
    }

    #[test]
    fn zero_target_is_rejected() {
        assert!(MatchConfig::with_target_score(0).is_err());
        assert_eq!(MatchConfig::with_target_score(3).unwrap().target_score, 3);
    }
}
