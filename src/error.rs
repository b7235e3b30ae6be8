use thiserror::Error;

use crate::board::Coord;

/// Why a placement was refused. The messages are shown to the player as-is.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PlacementError {
    #[error("Invalid move: cell {0} is already occupied")]
    Occupied(Coord),
    #[error("Invalid move: the piece must touch one of your own cells")]
    NotAdjacent,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("The game is already over")]
    GameOver,
    #[error(transparent)]
    Placement(#[from] PlacementError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("unknown piece type: {0}")]
    UnknownShape(String),
    #[error("malformed board key: {0:?}")]
    BadCellKey(String),
    #[error("malformed board text: {0}")]
    BadBoardText(String),
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("replay is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
