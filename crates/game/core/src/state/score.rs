use super::Side;

/// Running score of a match.
///
/// Values only grow within a match; [`MatchScore::reset`] is reserved for an
/// explicit restart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchScore {
    pub a: u32,
    pub b: u32,
}

impl MatchScore {
    pub const ZERO: MatchScore = MatchScore { a: 0, b: 0 };

    pub const fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }

    pub const fn get(&self, side: Side) -> u32 {
        match side {
            Side::A => self.a,
            Side::B => self.b,
        }
    }

    /// Side with strictly more points, `None` on a tie.
    pub fn leader(&self) -> Option<Side> {
        match self.a.cmp(&self.b) {
            core::cmp::Ordering::Greater => Some(Side::A),
            core::cmp::Ordering::Less => Some(Side::B),
            core::cmp::Ordering::Equal => None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::ZERO;
    }
}
