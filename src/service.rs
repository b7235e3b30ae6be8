//! In-memory game service behind the `/api` routes. Transport-free: the
//! server binary feeds it method, path and body, and writes back the reply.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{
    AiMoveRequest, ErrorResponse, GameStateResponse, HealthResponse, MessageResponse,
    MoveRequest, NewGameResponse,
};
use crate::board::Player;
use crate::opponent::{Opponent, OpponentKind, opponent_from_kind};
use crate::session::{Action, GameSession};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    pub allowed_origins: Vec<String>,
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
    pub opponent: OpponentKind,
    pub static_dir: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8000".to_string(),
            allowed_origins: vec![
                "https://sylim.vercel.app".to_string(),
                "http://localhost:5173".to_string(),
            ],
            idle_timeout_secs: 3600,
            sweep_interval_secs: 300,
            opponent: OpponentKind::default(),
            static_dir: None,
            seed: None,
        }
    }
}

impl ServerConfig {
    pub fn allows_origin(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == "*" || o == origin)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Game not found")]
    GameNotFound,
    #[error("Invalid request body: {0}")]
    BadRequest(String),
    #[error("Not Found")]
    NoRoute,
}

impl ServiceError {
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::GameNotFound | ServiceError::NoRoute => 404,
            ServiceError::BadRequest(_) => 422,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    fn json<T: Serialize>(status: u16, value: &T) -> Reply {
        match serde_json::to_string(value) {
            Ok(body) => Reply { status, body },
            Err(e) => {
                warn!("failed to encode response: {e}");
                Reply {
                    status: 500,
                    body: r#"{"detail":"Internal Server Error"}"#.to_string(),
                }
            }
        }
    }

    fn error(err: &ServiceError) -> Reply {
        Reply::json(
            err.status(),
            &ErrorResponse {
                detail: err.to_string(),
            },
        )
    }
}

struct StoredGame {
    session: GameSession,
    opponent: Box<dyn Opponent>,
    last_activity: Instant,
}

pub struct GameStore {
    games: HashMap<String, StoredGame>,
    opponent: OpponentKind,
    idle_timeout: Duration,
    sweep_interval: Duration,
    last_sweep: Instant,
    rng: StdRng,
}

impl GameStore {
    pub fn new(config: &ServerConfig, now: Instant) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            games: HashMap::new(),
            opponent: config.opponent,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
            last_sweep: now,
            rng,
        }
    }

    pub fn active_games(&self) -> usize {
        self.games.len()
    }

    fn new_game_id(&mut self) -> String {
        let hi = self.rng.next_u64();
        let lo = self.rng.next_u64();
        // Version 4 layout, so ids look like the ones pages already store.
        format!(
            "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
            hi >> 32,
            (hi >> 16) & 0xffff,
            hi & 0x0fff,
            ((lo >> 48) & 0x3fff) | 0x8000,
            lo & 0xffff_ffff_ffff
        )
    }

    fn game_mut(&mut self, game_id: &str, now: Instant) -> Result<&mut StoredGame, ServiceError> {
        let game = self.games.get_mut(game_id).ok_or(ServiceError::GameNotFound)?;
        game.last_activity = now;
        Ok(game)
    }

    pub fn new_game(&mut self, now: Instant) -> NewGameResponse {
        let game_id = self.new_game_id();
        let seed = self.rng.next_u64();
        let session = GameSession::new();
        let resp = NewGameResponse {
            game_id: game_id.clone(),
            board: session.board().to_wire(),
            current_player: session.current_player(),
        };
        self.games.insert(
            game_id.clone(),
            StoredGame {
                session,
                opponent: opponent_from_kind(self.opponent, Some(seed)),
                last_activity: now,
            },
        );
        info!("new game {game_id} ({} active)", self.games.len());
        resp
    }

    pub fn player_move(
        &mut self,
        req: &MoveRequest,
        now: Instant,
    ) -> Result<GameStateResponse, ServiceError> {
        let game = self.game_mut(&req.game_id, now)?;
        let session = &game.session;
        if session.is_over() {
            return Ok(GameStateResponse::rejected(session, "The game is already over"));
        }
        if session.current_player() != Player::Red {
            return Ok(GameStateResponse::rejected(session, "It is not your turn"));
        }
        match session.apply(Action::Place(req.placement())) {
            Ok(next) => {
                game.session = next;
                Ok(GameStateResponse::from_session(&game.session))
            }
            Err(e) => {
                debug!("game {}: rejected {:?}: {e}", req.game_id, req.placement());
                Ok(GameStateResponse::rejected(session, e.to_string()))
            }
        }
    }

    pub fn ai_move(
        &mut self,
        game_id: &str,
        now: Instant,
    ) -> Result<GameStateResponse, ServiceError> {
        let game = self.game_mut(game_id, now)?;
        if game.session.is_over() {
            return Ok(GameStateResponse::from_session(&game.session));
        }
        if game.session.current_player() != Player::Blue {
            return Ok(GameStateResponse::rejected(
                &game.session,
                "Waiting for the player's move",
            ));
        }
        let Some(placement) = game.opponent.choose(&game.session) else {
            return Ok(GameStateResponse::from_session(&game.session));
        };
        match game.session.apply(Action::Place(placement)) {
            Ok(next) => {
                game.session = next;
                Ok(GameStateResponse::from_session(&game.session))
            }
            Err(e) => {
                warn!("game {game_id}: opponent chose an illegal move {placement:?}: {e}");
                Ok(GameStateResponse::rejected(&game.session, e.to_string()))
            }
        }
    }

    pub fn game_state(&self, game_id: &str) -> Result<GameStateResponse, ServiceError> {
        self.games
            .get(game_id)
            .map(|g| GameStateResponse::from_session(&g.session))
            .ok_or(ServiceError::GameNotFound)
    }

    pub fn delete(&mut self, game_id: &str) -> MessageResponse {
        if self.games.remove(game_id).is_some() {
            info!("deleted game {game_id}");
        }
        MessageResponse {
            message: "Game deleted".to_string(),
        }
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "healthy".to_string(),
            active_games: self.games.len(),
        }
    }

    /// Drops games idle for longer than the timeout. Runs at most once per
    /// sweep interval; returns how many games were removed.
    pub fn sweep(&mut self, now: Instant) -> usize {
        if now.saturating_duration_since(self.last_sweep) < self.sweep_interval {
            return 0;
        }
        self.last_sweep = now;
        let timeout = self.idle_timeout;
        let before = self.games.len();
        self.games.retain(|id, game| {
            let keep = now.saturating_duration_since(game.last_activity) <= timeout;
            if !keep {
                info!("cleaned up inactive game {id}");
            }
            keep
        });
        before - self.games.len()
    }

    /// Routes one API request. Returns `None` for paths outside `/api`.
    pub fn handle(&mut self, method: &str, path: &str, body: &str, now: Instant) -> Option<Reply> {
        let path = path.split('?').next().unwrap_or(path);
        if !path.starts_with("/api/") {
            return None;
        }
        self.sweep(now);
        let game_path = path.strip_prefix("/api/game/").filter(|id| !id.is_empty());
        let reply = match (method, path, game_path) {
            ("POST", "/api/new-game", _) => Reply::json(200, &self.new_game(now)),
            ("POST", "/api/player-move", _) => match parse::<MoveRequest>(body) {
                Ok(req) => respond(self.player_move(&req, now)),
                Err(e) => Reply::error(&e),
            },
            ("POST", "/api/ai-move", _) => match parse::<AiMoveRequest>(body) {
                Ok(req) => respond(self.ai_move(&req.game_id, now)),
                Err(e) => Reply::error(&e),
            },
            ("GET", "/api/health", _) => Reply::json(200, &self.health()),
            ("GET", _, Some(id)) => respond(self.game_state(id)),
            ("DELETE", _, Some(id)) => Reply::json(200, &self.delete(id)),
            _ => Reply::error(&ServiceError::NoRoute),
        };
        Some(reply)
    }
}

fn parse<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, ServiceError> {
    serde_json::from_str(body).map_err(|e| ServiceError::BadRequest(e.to_string()))
}

fn respond(result: Result<GameStateResponse, ServiceError>) -> Reply {
    match result {
        Ok(state) => Reply::json(200, &state),
        Err(e) => Reply::error(&e),
    }
}
