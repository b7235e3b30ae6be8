use serde::{Deserialize, Serialize};

use crate::board::{Board, ClearedLines, Coord, Counts, Placement, Player};
use crate::error::SessionError;

/// The game ends once the turn counter reaches this value.
pub const MAX_TURNS: u32 = 150;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Red,
    Blue,
    Draw,
}

impl Outcome {
    pub fn winner(player: Player) -> Outcome {
        match player {
            Player::Red => Outcome::Red,
            Player::Blue => Outcome::Blue,
        }
    }
}

#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct MoveRecord {
    pub turn: u32,
    pub player: Player,
    pub placement: Placement,
    pub cells: [Coord; 4],
    pub cleared: ClearedLines,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// The player to move commits a piece.
    Place(Placement),
    Reset,
}

/// Everything a game needs besides the board itself. Values are replaced
/// wholesale by [`GameSession::apply`]; no field is edited in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSession {
    board: Board,
    turn: u32,
    current: Player,
    history: Vec<MoveRecord>,
    outcome: Option<Outcome>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: 1,
            current: Player::Red,
            history: Vec::new(),
            outcome: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn current_player(&self) -> Player {
        self.current
    }

    pub fn counts(&self) -> Counts {
        self.board.counts()
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.history.last()
    }

    /// The single transition function. Returns the next session and leaves
    /// `self` untouched; a rejected action produces an error instead.
    pub fn apply(&self, action: Action) -> Result<GameSession, SessionError> {
        match action {
            Action::Reset => Ok(GameSession::new()),
            Action::Place(placement) => {
                if self.is_over() {
                    return Err(SessionError::GameOver);
                }
                let applied = self.board.apply_placement(self.current, &placement)?;
                let mut history = self.history.clone();
                history.push(MoveRecord {
                    turn: self.turn,
                    player: self.current,
                    placement: placement.normalized(),
                    cells: applied.cells,
                    cleared: applied.cleared,
                });
                let next = GameSession {
                    board: applied.board,
                    turn: self.turn + 1,
                    current: self.current.opponent(),
                    history,
                    outcome: None,
                };
                let outcome = next.evaluate_outcome();
                Ok(GameSession { outcome, ..next })
            }
        }
    }

    pub fn dispatch(&mut self, action: Action) -> Result<(), SessionError> {
        *self = self.apply(action)?;
        Ok(())
    }

    fn evaluate_outcome(&self) -> Option<Outcome> {
        if self.turn <= 2 {
            return None;
        }
        if self.turn >= MAX_TURNS {
            let counts = self.counts();
            return Some(match counts.red.cmp(&counts.blue) {
                std::cmp::Ordering::Greater => Outcome::Red,
                std::cmp::Ordering::Less => Outcome::Blue,
                std::cmp::Ordering::Equal => Outcome::Draw,
            });
        }
        if !self.board.has_legal_placement(self.current) {
            return Some(Outcome::winner(self.current.opponent()));
        }
        None
    }

    /// Rebuilds a session from a recorded board, e.g. a server snapshot.
    /// History is not recoverable from a snapshot and starts empty.
    pub fn from_snapshot(board: Board, turn: u32, current: Player) -> GameSession {
        let session = GameSession {
            board,
            turn,
            current,
            history: Vec::new(),
            outcome: None,
        };
        let outcome = session.evaluate_outcome();
        GameSession { outcome, ..session }
    }
}
