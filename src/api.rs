//! JSON bodies exchanged between the demo page and the game service.
//!
//! Field names follow the service contract. Move requests also accept the
//! short `piece`/`r`/`c` spellings older pages send.

use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardMap, Counts, Placement, Player};
use crate::error::WireError;
use crate::session::{GameSession, Outcome};
use crate::shape::Shape;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct NewGameResponse {
    pub game_id: String,
    pub board: BoardMap,
    pub current_player: Player,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct MoveRequest {
    pub game_id: String,
    #[serde(alias = "piece")]
    pub shape: Shape,
    #[serde(alias = "r")]
    pub anchor_row: i32,
    #[serde(alias = "c")]
    pub anchor_col: i32,
    #[serde(default)]
    pub rotation: i32,
}

impl MoveRequest {
    pub fn placement(&self) -> Placement {
        Placement::new(self.shape, self.anchor_row, self.anchor_col, self.rotation)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct AiMoveRequest {
    pub game_id: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct GameStateResponse {
    pub valid: bool,
    pub board: BoardMap,
    pub current_player: Player,
    pub game_over: bool,
    pub winner: Option<Outcome>,
    pub red_count: usize,
    pub blue_count: usize,
    pub turn_count: u32,
    #[serde(default)]
    pub message: Option<String>,
}

impl GameStateResponse {
    pub fn from_session(session: &GameSession) -> Self {
        let counts = session.counts();
        Self {
            valid: true,
            board: session.board().to_wire(),
            current_player: session.current_player(),
            game_over: session.is_over(),
            winner: session.outcome(),
            red_count: counts.red,
            blue_count: counts.blue,
            turn_count: session.turn(),
            message: None,
        }
    }

    /// Current state of an untouched session, flagged as a refused move.
    pub fn rejected(session: &GameSession, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
            ..Self::from_session(session)
        }
    }

    pub fn decode_board(&self) -> Result<Board, WireError> {
        Board::from_wire(&self.board)
    }

    pub fn counts(&self) -> Counts {
        Counts {
            red: self.red_count,
            blue: self.blue_count,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub active_games: usize,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorResponse {
    pub detail: String,
}
