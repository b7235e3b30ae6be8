use serde::Serialize;

use crate::api::{AiMoveRequest, GameStateResponse, MoveRequest, NewGameResponse};
use crate::board::{Board, Cell, Coord, Counts, Placement, Player};
use crate::error::WireError;
use crate::session::Outcome;
use crate::shape::Shape;

/// How long a toast stays on screen.
pub const TOAST_MS: f32 = 3000.0;

/// The human always plays red against the service's blue.
pub const HUMAN: Player = Player::Red;

/// Lifecycle of the latest move. An optimistic board is only ever shown
/// while `Pending`; the service's answer replaces it either way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MovePhase {
    Idle,
    Pending { placement: Placement, optimistic: Board },
    Confirmed(Board),
    Rejected(String),
}

impl MovePhase {
    fn label(&self) -> &'static str {
        match self {
            MovePhase::Idle => "idle",
            MovePhase::Pending { .. } => "pending",
            MovePhase::Confirmed(_) => "confirmed",
            MovePhase::Rejected(_) => "rejected",
        }
    }
}

#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct Toast {
    pub message: String,
    pub remaining_ms: f32,
}

#[derive(Clone, Serialize, Debug, Default, PartialEq, Eq)]
pub struct Preview {
    pub cells: Vec<Coord>,
    pub valid: bool,
}

/// Last state the service vouched for.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Confirmed {
    board: Board,
    current_player: Player,
    game_over: bool,
    winner: Option<Outcome>,
    counts: Counts,
    turn: u32,
}

impl Confirmed {
    fn fresh(board: Board) -> Self {
        Self {
            board,
            current_player: HUMAN,
            game_over: false,
            winner: None,
            counts: Counts::default(),
            turn: 1,
        }
    }

    fn from_response(resp: &GameStateResponse) -> Result<Self, WireError> {
        Ok(Self {
            board: resp.decode_board()?,
            current_player: resp.current_player,
            game_over: resp.game_over,
            winner: resp.winner,
            counts: resp.counts(),
            turn: resp.turn_count,
        })
    }
}

/// Snapshot handed to the page for rendering.
#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub game_id: Option<String>,
    pub board: Vec<Vec<Cell>>,
    pub current_player: Player,
    pub game_over: bool,
    pub winner: Option<Outcome>,
    pub red_count: usize,
    pub blue_count: usize,
    pub turn_count: u32,
    pub selected: Option<Shape>,
    pub rotation: i32,
    pub preview: Preview,
    pub phase: &'static str,
    pub ai_thinking: bool,
    pub toast: Option<Toast>,
}

/// Client half of the interactive demo: selection, previews, optimistic
/// moves and reconciliation with the service.
#[derive(Clone, Debug)]
pub struct InteractiveGame {
    game_id: Option<String>,
    confirmed: Confirmed,
    selected: Option<Shape>,
    rotation: i32,
    hovered: Option<Coord>,
    phase: MovePhase,
    ai_thinking: bool,
    toast: Option<Toast>,
}

impl Default for InteractiveGame {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractiveGame {
    pub fn new() -> Self {
        Self {
            game_id: None,
            confirmed: Confirmed::fresh(Board::new()),
            selected: None,
            rotation: 0,
            hovered: None,
            phase: MovePhase::Idle,
            ai_thinking: false,
            toast: None,
        }
    }

    pub fn start(&mut self, resp: &NewGameResponse) -> Result<(), WireError> {
        let board = Board::from_wire(&resp.board)?;
        *self = Self {
            game_id: Some(resp.game_id.clone()),
            confirmed: Confirmed {
                current_player: resp.current_player,
                ..Confirmed::fresh(board)
            },
            ..Self::new()
        };
        Ok(())
    }

    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    pub fn phase(&self) -> &MovePhase {
        &self.phase
    }

    pub fn is_ai_thinking(&self) -> bool {
        self.ai_thinking
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn selected(&self) -> Option<Shape> {
        self.selected
    }

    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    /// The board to draw: the optimistic one while a move is in flight,
    /// otherwise the service's.
    pub fn display_board(&self) -> &Board {
        match &self.phase {
            MovePhase::Pending { optimistic, .. } => optimistic,
            _ => &self.confirmed.board,
        }
    }

    fn humans_turn(&self) -> bool {
        self.confirmed.current_player == HUMAN && !self.confirmed.game_over
    }

    fn can_act(&self) -> bool {
        self.game_id.is_some()
            && self.humans_turn()
            && !self.ai_thinking
            && !matches!(self.phase, MovePhase::Pending { .. })
    }

    pub fn select_shape(&mut self, shape: Option<Shape>) {
        self.selected = shape;
    }

    /// Wheel rotation; a positive delta turns one variant forward.
    pub fn rotate(&mut self, delta: i32) {
        if !self.humans_turn() {
            return;
        }
        if let Some(shape) = self.selected {
            self.rotation = shape.normalize_rotation(self.rotation + delta.signum()) as i32;
        }
    }

    pub fn hover(&mut self, r: i32, c: i32) {
        self.hovered = Some(Coord::wrapped(r as i64, c as i64));
    }

    pub fn clear_hover(&mut self) {
        self.hovered = None;
    }

    /// Cells the selected piece would cover at the hovered cell. Uses the
    /// same check the service applies.
    pub fn preview(&self) -> Preview {
        let (Some(shape), Some(at)) = (self.selected, self.hovered) else {
            return Preview::default();
        };
        if !self.humans_turn() {
            return Preview::default();
        }
        let placement = Placement::new(shape, at.r as i32, at.c as i32, self.rotation);
        Preview {
            cells: placement.cells().to_vec(),
            valid: self.display_board().is_valid_placement(HUMAN, &placement),
        }
    }

    fn show_toast(&mut self, message: impl Into<String>) {
        self.toast = Some(Toast {
            message: message.into(),
            remaining_ms: TOAST_MS,
        });
    }

    /// Starts a move at `(r, c)`. Returns the request to send, or `None` if
    /// nothing should be sent. Moves the local rules already refuse are
    /// rejected here without a round trip.
    pub fn begin_move(&mut self, r: i32, c: i32) -> Option<MoveRequest> {
        if !self.can_act() {
            return None;
        }
        let shape = self.selected?;
        let game_id = self.game_id.clone()?;
        let placement = Placement::new(shape, r, c, self.rotation);
        match self.confirmed.board.apply_placement(HUMAN, &placement) {
            Ok(applied) => {
                self.phase = MovePhase::Pending {
                    placement,
                    optimistic: applied.board,
                };
                self.ai_thinking = true;
                Some(MoveRequest {
                    game_id,
                    shape,
                    anchor_row: r,
                    anchor_col: c,
                    rotation: self.rotation,
                })
            }
            Err(e) => {
                let reason = e.to_string();
                self.show_toast(reason.clone());
                self.phase = MovePhase::Rejected(reason);
                None
            }
        }
    }

    /// Reconciles the service's verdict on the human move. On success the
    /// selection is cleared and, unless the game ended, the follow-up AI
    /// request is returned.
    pub fn on_player_move(
        &mut self,
        resp: &GameStateResponse,
    ) -> Result<Option<AiMoveRequest>, WireError> {
        self.confirmed = Confirmed::from_response(resp)?;
        if !resp.valid {
            let reason = resp.message.clone().unwrap_or_else(|| "Invalid move".to_string());
            self.show_toast(reason.clone());
            self.phase = MovePhase::Rejected(reason);
            self.ai_thinking = false;
            return Ok(None);
        }
        self.phase = MovePhase::Confirmed(self.confirmed.board.clone());
        self.toast = None;
        self.selected = None;
        self.rotation = 0;
        if resp.game_over {
            self.ai_thinking = false;
            return Ok(None);
        }
        Ok(self.game_id.clone().map(|game_id| AiMoveRequest { game_id }))
    }

    pub fn on_ai_move(&mut self, resp: &GameStateResponse) -> Result<(), WireError> {
        self.confirmed = Confirmed::from_response(resp)?;
        self.phase = MovePhase::Confirmed(self.confirmed.board.clone());
        self.ai_thinking = false;
        if !resp.valid {
            if let Some(msg) = &resp.message {
                self.show_toast(msg.clone());
            }
        }
        Ok(())
    }

    /// A request never got an answer. Falls back to the last confirmed
    /// board.
    pub fn on_network_error(&mut self, detail: &str) {
        if matches!(self.phase, MovePhase::Pending { .. }) {
            self.phase = MovePhase::Rejected(detail.to_string());
        }
        self.ai_thinking = false;
        self.show_toast("Failed to make move");
    }

    pub fn on_new_game_error(&mut self) {
        self.show_toast("Failed to start new game. Make sure the backend is running.");
    }

    pub fn tick(&mut self, dt_ms: f32) {
        if let Some(toast) = &mut self.toast {
            toast.remaining_ms -= dt_ms;
            if toast.remaining_ms <= 0.0 {
                self.toast = None;
            }
        }
    }

    pub fn view(&self) -> GameView {
        let board = self.display_board();
        let counts = match &self.phase {
            MovePhase::Pending { .. } => board.counts(),
            _ => self.confirmed.counts,
        };
        GameView {
            game_id: self.game_id.clone(),
            board: board.to_grid(),
            current_player: self.confirmed.current_player,
            game_over: self.confirmed.game_over,
            winner: self.confirmed.winner,
            red_count: counts.red,
            blue_count: counts.blue,
            turn_count: self.confirmed.turn,
            selected: self.selected,
            rotation: self.rotation,
            preview: self.preview(),
            phase: self.phase.label(),
            ai_thinking: self.ai_thinking,
            toast: self.toast.clone(),
        }
    }
}
