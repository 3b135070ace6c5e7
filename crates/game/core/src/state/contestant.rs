use core::fmt;

use crate::error::ContestantError;

/// One of the two competitors in a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
        }
    }
}

/// A named numeric attribute printed on a card.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stat {
    pub key: String,
    pub value: i32,
}

impl Stat {
    pub fn new(key: impl Into<String>, value: i32) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// A drawn card. Stats keep the order in which the card lists them; that
/// order is what "lowest index" refers to when a stat is auto-selected.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contestant {
    pub id: String,
    pub name: String,
    pub stats: Vec<Stat>,
}

impl Contestant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, stats: Vec<Stat>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stats,
        }
    }

    /// Looks up a stat value by key.
    pub fn value(&self, key: &str) -> Option<i32> {
        self.stats.iter().find(|s| s.key == key).map(|s| s.value)
    }

    pub fn has_stat(&self, key: &str) -> bool {
        self.stats.iter().any(|s| s.key == key)
    }

    /// Stat keys in card order.
    pub fn stat_keys(&self) -> impl Iterator<Item = &str> {
        self.stats.iter().map(|s| s.key.as_str())
    }

    /// Checks that the card has stats and no duplicated keys.
    pub fn validate(&self) -> Result<(), ContestantError> {
        if self.stats.is_empty() {
            return Err(ContestantError::NoStats {
                id: self.id.clone(),
            });
        }

        for (index, stat) in self.stats.iter().enumerate() {
            if self.stats[..index].iter().any(|s| s.key == stat.key) {
                return Err(ContestantError::DuplicateStat {
                    id: self.id.clone(),
                    key: stat.key.clone(),
                });
            }
        }

        Ok(())
    }
}

/// The two cards compared in a round.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContestantPair {
    pub a: Contestant,
    pub b: Contestant,
}

impl ContestantPair {
    pub fn new(a: Contestant, b: Contestant) -> Self {
        Self { a, b }
    }

    pub fn get(&self, side: Side) -> &Contestant {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    /// Both cards must be individually valid and expose the same stat keys.
    /// Order may differ between the two cards.
    pub fn validate(&self) -> Result<(), ContestantError> {
        self.a.validate()?;
        self.b.validate()?;

        let same_keys = self.a.stats.len() == self.b.stats.len()
            && self.a.stat_keys().all(|key| self.b.has_stat(key));

        if !same_keys {
            return Err(ContestantError::MismatchedStats {
                a: self.a.id.clone(),
                b: self.b.id.clone(),
            });
        }

        Ok(())
    }

    /// Values of `key` on both cards, or the first card missing it.
    pub fn values(&self, key: &str) -> Result<(i32, i32), ContestantError> {
        let missing = |c: &Contestant| ContestantError::MissingStat {
            id: c.id.clone(),
            key: key.to_string(),
        };
        let a = self.a.value(key).ok_or_else(|| missing(&self.a))?;
        let b = self.b.value(key).ok_or_else(|| missing(&self.b))?;
        Ok((a, b))
    }
}
