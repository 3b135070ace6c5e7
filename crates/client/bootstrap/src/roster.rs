//! Demo roster dealing two distinct cards per round.
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use battle_core::{Contestant, ContestantPair, Stat};
use rand::SeedableRng;
use rand::rngs::StdRng;
use runtime::{ContestantSource, DrawError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("failed to read roster {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed roster {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("roster needs at least two cards, found {0}")]
    TooSmall(usize),
}

/// Deals rounds from a fixed roster with a seeded shuffle.
///
/// Cards are not checked against each other here; a pair that does not
/// share its stats is rejected by the runtime when the round starts.
pub struct RosterSource {
    cards: Vec<Contestant>,
    rng: Mutex<StdRng>,
}

impl RosterSource {
    pub fn new(cards: Vec<Contestant>, seed: Option<u64>) -> Result<Self, RosterError> {
        if cards.len() < 2 {
            return Err(RosterError::TooSmall(cards.len()));
        }

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            cards,
            rng: Mutex::new(rng),
        })
    }

    pub fn builtin(seed: Option<u64>) -> Result<Self, RosterError> {
        Self::new(builtin_cards(), seed)
    }

    /// Loads a JSON array of cards.
    pub fn from_file(path: &Path, seed: Option<u64>) -> Result<Self, RosterError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RosterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cards: Vec<Contestant> =
            serde_json::from_str(&raw).map_err(|source| RosterError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(cards, seed)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[async_trait]
impl ContestantSource for RosterSource {
    async fn draw_contestants(&self, round: u32) -> Result<ContestantPair, DrawError> {
        let picked = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            rand::seq::index::sample(&mut *rng, self.cards.len(), 2)
        };

        let pair = ContestantPair::new(
            self.cards[picked.index(0)].clone(),
            self.cards[picked.index(1)].clone(),
        );
        tracing::debug!(
            round,
            player = %pair.a.id,
            opponent = %pair.b.id,
            "dealt roster cards"
        );
        Ok(pair)
    }
}

fn builtin_cards() -> Vec<Contestant> {
    let card = |id: &str, name: &str, values: [i32; 4]| {
        let keys = ["power", "speed", "technique", "stamina"];
        Contestant::new(
            id,
            name,
            keys.iter()
                .zip(values)
                .map(|(key, value)| Stat::new(*key, value))
                .collect(),
        )
    };

    vec![
        card("iron-crane", "Iron Crane", [7, 5, 8, 4]),
        card("red-ox", "Red Ox", [9, 3, 4, 8]),
        card("silver-fox", "Silver Fox", [4, 9, 7, 5]),
        card("stone-bear", "Stone Bear", [8, 2, 5, 9]),
        card("night-owl", "Night Owl", [5, 7, 9, 3]),
        card("wild-hare", "Wild Hare", [3, 10, 5, 6]),
        card("old-turtle", "Old Turtle", [6, 1, 7, 10]),
        card("sea-serpent", "Sea Serpent", [8, 6, 6, 6]),
    ]
}
