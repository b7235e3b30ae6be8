use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::board::{Placement, Player};
use crate::session::GameSession;
use crate::shape::Shape;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OpponentKind {
    Random,
    #[default]
    Greedy,
}

impl FromStr for OpponentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(OpponentKind::Random),
            "greedy" => Ok(OpponentKind::Greedy),
            other => Err(format!("unknown opponent kind {other:?} (expected random or greedy)")),
        }
    }
}

impl fmt::Display for OpponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpponentKind::Random => write!(f, "random"),
            OpponentKind::Greedy => write!(f, "greedy"),
        }
    }
}

/// Picks a move for whichever player is to move in `session`.
pub trait Opponent {
    fn choose(&mut self, session: &GameSession) -> Option<Placement>;
}

/// Fixed first pieces, tried in order until one fits.
fn opening(session: &GameSession) -> Option<Placement> {
    if session.turn() > 2 {
        return None;
    }
    let player = session.current_player();
    let book = match player {
        Player::Blue => vec![
            Placement::new(Shape::I, 2, 3, 0),
            Placement::new(Shape::S, 7, 3, 1),
        ],
        Player::Red => vec![Placement::new(Shape::O, 3, 3, 0)],
    };
    book.into_iter()
        .find(|p| session.board().is_valid_placement(player, p))
}

fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

pub struct RandomOpponent {
    rng: StdRng,
}

impl RandomOpponent {
    pub fn new(seed: Option<u64>) -> Self {
        Self { rng: seeded(seed) }
    }
}

impl Opponent for RandomOpponent {
    fn choose(&mut self, session: &GameSession) -> Option<Placement> {
        if session.is_over() {
            return None;
        }
        opening(session).or_else(|| {
            session
                .board()
                .legal_placements(session.current_player())
                .choose(&mut self.rng)
                .copied()
        })
    }
}

/// One-ply lookahead: leave the other side as few replies as possible,
/// preferring moves that clear more lines.
pub struct GreedyOpponent {
    rng: StdRng,
}

impl GreedyOpponent {
    pub fn new(seed: Option<u64>) -> Self {
        Self { rng: seeded(seed) }
    }

    fn score(session: &GameSession, placement: &Placement) -> Option<(usize, usize)> {
        let player = session.current_player();
        let applied = session.board().apply_placement(player, placement).ok()?;
        let replies = applied.board.legal_placements(player.opponent()).len();
        Some((replies, applied.cleared.len()))
    }
}

impl Opponent for GreedyOpponent {
    fn choose(&mut self, session: &GameSession) -> Option<Placement> {
        if session.is_over() {
            return None;
        }
        if let Some(p) = opening(session) {
            return Some(p);
        }
        let mut best: Vec<Placement> = Vec::new();
        let mut best_key = (usize::MAX, 0usize);
        for placement in session.board().legal_placements(session.current_player()) {
            let Some((replies, cleared)) = Self::score(session, &placement) else {
                continue;
            };
            let better = replies < best_key.0 || (replies == best_key.0 && cleared > best_key.1);
            if better {
                best_key = (replies, cleared);
                best.clear();
            }
            if better || (replies, cleared) == best_key {
                best.push(placement);
            }
        }
        best.choose(&mut self.rng).copied()
    }
}

pub fn opponent_from_kind(kind: OpponentKind, seed: Option<u64>) -> Box<dyn Opponent> {
    match kind {
        OpponentKind::Random => Box::new(RandomOpponent::new(seed)),
        OpponentKind::Greedy => Box::new(GreedyOpponent::new(seed)),
    }
}
