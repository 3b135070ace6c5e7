//! Stat choice applied when the selection window runs out.

use core::fmt;
use core::str::FromStr;

use battle_core::Contestant;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// How a stat is picked for the player on timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoSelectPolicy {
    /// Lowest index on the player's card.
    #[default]
    FirstListed,
    /// Stat with the highest value on the player's card; ties go to the
    /// lower index.
    HighestValue,
    /// Uniform pick, reproducible for a given seed and round.
    Seeded { seed: u64 },
}

impl AutoSelectPolicy {
    /// Picks a stat key from `contestant`. `None` only for a card without
    /// stats, which never passes validation.
    pub fn choose(&self, contestant: &Contestant, round: u32) -> Option<String> {
        let stats = &contestant.stats;
        let picked = match self {
            Self::FirstListed => stats.first(),
            Self::HighestValue => stats
                .iter()
                .enumerate()
                .max_by(|(ia, a), (ib, b)| a.value.cmp(&b.value).then(ib.cmp(ia)))
                .map(|(_, stat)| stat),
            Self::Seeded { seed } => {
                if stats.is_empty() {
                    None
                } else {
                    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(u64::from(round)));
                    stats.get(rng.gen_range(0..stats.len()))
                }
            }
        };
        picked.map(|stat| stat.key.clone())
    }
}

impl fmt::Display for AutoSelectPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstListed => f.write_str("first"),
            Self::HighestValue => f.write_str("highest"),
            Self::Seeded { seed } => write!(f, "seeded:{seed}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown auto-select policy '{0}' (expected first, highest or seeded:<n>)")]
pub struct PolicyParseError(String);

impl FromStr for AutoSelectPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        match raw.as_str() {
            "first" => Ok(Self::FirstListed),
            "highest" => Ok(Self::HighestValue),
            _ => raw
                .strip_prefix("seeded:")
                .and_then(|seed| seed.parse().ok())
                .map(|seed| Self::Seeded { seed })
                .ok_or_else(|| PolicyParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_core::Stat;

    fn card() -> Contestant {
        Contestant::new(
            "c",
            "Card",
            vec![
                Stat::new("power", 3),
                Stat::new("speed", 9),
                Stat::new("grip", 9),
            ],
        )
    }

    #[test]
    fn first_listed_takes_lowest_index() {
        assert_eq!(
            AutoSelectPolicy::FirstListed.choose(&card(), 1).as_deref(),
            Some("power")
        );
    }

    #[test]
    fn highest_value_breaks_ties_by_index() {
        assert_eq!(
            AutoSelectPolicy::HighestValue.choose(&card(), 1).as_deref(),
            Some("speed")
        );
    }

    #[test]
    fn seeded_is_reproducible() {
        let policy = AutoSelectPolicy::Seeded { seed: 42 };
        assert_eq!(policy.choose(&card(), 3), policy.choose(&card(), 3));
        assert!(policy.choose(&card(), 3).is_some());
    }

    #[test]
    fn parses_env_spelling() {
        assert_eq!("first".parse(), Ok(AutoSelectPolicy::FirstListed));
        assert_eq!("HIGHEST".parse(), Ok(AutoSelectPolicy::HighestValue));
        assert_eq!(
            "seeded:7".parse(),
            Ok(AutoSelectPolicy::Seeded { seed: 7 })
        );
        assert!("random".parse::<AutoSelectPolicy>().is_err());
    }
}
