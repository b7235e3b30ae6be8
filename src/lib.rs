pub mod api;
pub mod board;
pub mod client;
pub mod error;
pub mod opponent;
pub mod replay;
pub mod session;
pub mod shape;
#[cfg(not(target_arch = "wasm32"))]
pub mod service;

use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use web_sys::console;

use crate::api::{GameStateResponse, NewGameResponse};
use crate::client::InteractiveGame;
use crate::replay::{ReplayData, ReplayViewer, TEST_CASES};
use crate::shape::{Offset, Shape};

const GAME_HELP_KEY: &str = "tetress_seen_help";
const SOLVER_HELP_KEY: &str = "astetress_seen_help";
const HELP_SEEN: &str = "1";

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
}

fn log(msg: &str) {
    console::log_1(&JsValue::from_str(msg));
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct GameClient {
    game: InteractiveGame,
}

#[wasm_bindgen]
impl GameClient {
    #[wasm_bindgen(constructor)]
    pub fn new() -> GameClient {
        Self {
            game: InteractiveGame::new(),
        }
    }

    /// Feeds the `/api/new-game` answer.
    #[wasm_bindgen(js_name = start)]
    pub fn start(&mut self, resp: JsValue) -> Result<JsValue, JsValue> {
        let parsed: NewGameResponse = from_value(resp)?;
        self.game.start(&parsed).map_err(js_err)?;
        log(&format!("[game] started {}", parsed.game_id));
        self.view()
    }

    #[wasm_bindgen(js_name = newGameFailed)]
    pub fn new_game_failed(&mut self, detail: &str) {
        log(&format!("[game] new game failed: {detail}"));
        self.game.on_new_game_error();
    }

    /// `None` or an unknown letter clears the selection.
    #[wasm_bindgen(js_name = selectShape)]
    pub fn select_shape(&mut self, shape: Option<String>) {
        let parsed = shape.and_then(|s| s.parse::<Shape>().ok());
        self.game.select_shape(parsed);
    }

    #[wasm_bindgen(js_name = rotate)]
    pub fn rotate(&mut self, delta: i32) {
        self.game.rotate(delta);
    }

    #[wasm_bindgen(js_name = hover)]
    pub fn hover(&mut self, r: i32, c: i32) {
        self.game.hover(r, c);
    }

    #[wasm_bindgen(js_name = clearHover)]
    pub fn clear_hover(&mut self) {
        self.game.clear_hover();
    }

    /// Returns the `/api/player-move` body to post, or `null`.
    #[wasm_bindgen(js_name = beginMove)]
    pub fn begin_move(&mut self, r: i32, c: i32) -> Result<JsValue, JsValue> {
        match self.game.begin_move(r, c) {
            Some(req) => to_value(&req).map_err(|e| e.into()),
            None => Ok(JsValue::NULL),
        }
    }

    /// Returns the `/api/ai-move` body to post next, or `null`.
    #[wasm_bindgen(js_name = onPlayerMove)]
    pub fn on_player_move(&mut self, resp: JsValue) -> Result<JsValue, JsValue> {
        let parsed: GameStateResponse = from_value(resp)?;
        match self.game.on_player_move(&parsed).map_err(js_err)? {
            Some(req) => to_value(&req).map_err(|e| e.into()),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = onAiMove)]
    pub fn on_ai_move(&mut self, resp: JsValue) -> Result<(), JsValue> {
        let parsed: GameStateResponse = from_value(resp)?;
        self.game.on_ai_move(&parsed).map_err(js_err)
    }

    #[wasm_bindgen(js_name = onNetworkError)]
    pub fn on_network_error(&mut self, detail: &str) {
        log(&format!("[game] request failed: {detail}"));
        self.game.on_network_error(detail);
    }

    #[wasm_bindgen(js_name = tick)]
    pub fn tick(&mut self, dt_ms: f32) -> Result<JsValue, JsValue> {
        self.game.tick(dt_ms);
        self.view()
    }

    #[wasm_bindgen(js_name = view)]
    pub fn view(&self) -> Result<JsValue, JsValue> {
        to_value(&self.game.view()).map_err(|e| e.into())
    }
}

impl Default for GameClient {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
pub struct ReplayClient {
    viewer: ReplayViewer,
}

#[wasm_bindgen]
impl ReplayClient {
    /// Takes the body of a replay file as fetched.
    #[wasm_bindgen(constructor)]
    pub fn new(json: &str) -> Result<ReplayClient, JsValue> {
        let data = ReplayData::from_json(json).map_err(js_err)?;
        log(&format!(
            "[replay] loaded {} search states, {} solution steps",
            data.search_states.len(),
            data.solution.len()
        ));
        Ok(Self {
            viewer: ReplayViewer::new(data),
        })
    }

    #[wasm_bindgen(js_name = next)]
    pub fn next(&mut self) {
        self.viewer.next();
    }

    #[wasm_bindgen(js_name = previous)]
    pub fn previous(&mut self) {
        self.viewer.previous();
    }

    #[wasm_bindgen(js_name = jump)]
    pub fn jump(&mut self, index: usize) {
        self.viewer.jump(index);
    }

    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&mut self) {
        self.viewer.toggle_play();
    }

    #[wasm_bindgen(js_name = reset)]
    pub fn reset(&mut self) {
        self.viewer.reset();
    }

    #[wasm_bindgen(js_name = setSpeed)]
    pub fn set_speed(&mut self, speed: f32) {
        self.viewer.set_speed(speed);
    }

    #[wasm_bindgen(js_name = nextSolutionStep)]
    pub fn next_solution_step(&mut self) {
        self.viewer.next_solution_step();
    }

    #[wasm_bindgen(js_name = previousSolutionStep)]
    pub fn previous_solution_step(&mut self) {
        self.viewer.previous_solution_step();
    }

    #[wasm_bindgen(js_name = showFullSolution)]
    pub fn show_full_solution(&mut self) {
        self.viewer.show_full_solution();
    }

    #[wasm_bindgen(js_name = tick)]
    pub fn tick(&mut self, dt_ms: f32) -> Result<JsValue, JsValue> {
        self.viewer.tick(dt_ms);
        self.frame()
    }

    #[wasm_bindgen(js_name = frame)]
    pub fn frame(&self) -> Result<JsValue, JsValue> {
        to_value(&self.viewer.frame()).map_err(|e| e.into())
    }
}

#[derive(Serialize)]
struct ShapeTable {
    shape: Shape,
    variants: &'static [[Offset; 4]],
}

#[wasm_bindgen(js_name = shapeTables)]
pub fn shape_tables() -> Result<JsValue, JsValue> {
    let tables: Vec<ShapeTable> = Shape::all()
        .into_iter()
        .map(|shape| ShapeTable {
            shape,
            variants: shape.variants(),
        })
        .collect();
    to_value(&tables).map_err(|e| e.into())
}

#[wasm_bindgen(js_name = testCases)]
pub fn test_cases() -> Result<JsValue, JsValue> {
    to_value(&TEST_CASES).map_err(|e| e.into())
}

#[wasm_bindgen(js_name = replayPath)]
pub fn replay_path(name: &str) -> String {
    replay::replay_path(name)
}

fn storage() -> Result<web_sys::Storage, JsValue> {
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("no window"))?
        .local_storage()?
        .ok_or_else(|| JsValue::from_str("localStorage unavailable"))
}

fn help_key(solver: bool) -> &'static str {
    if solver { SOLVER_HELP_KEY } else { GAME_HELP_KEY }
}

/// The game page counts any stored value as seen; the solver page wants "1".
fn help_flag_set(solver: bool, stored: Option<&str>) -> bool {
    match stored {
        Some(value) if solver => value == HELP_SEEN,
        Some(_) => true,
        None => false,
    }
}

#[wasm_bindgen(js_name = hasSeenHelp)]
pub fn has_seen_help(solver: bool) -> bool {
    match storage().and_then(|s| s.get_item(help_key(solver))) {
        Ok(value) => help_flag_set(solver, value.as_deref()),
        Err(_) => false,
    }
}

#[wasm_bindgen(js_name = markHelpSeen)]
pub fn mark_help_seen(solver: bool) -> Result<(), JsValue> {
    storage()?.set_item(help_key(solver), HELP_SEEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_flags_match_what_the_pages_store() {
        assert!(help_flag_set(false, Some(HELP_SEEN)));
        assert!(help_flag_set(false, Some("true")));
        assert!(!help_flag_set(false, None));

        assert!(help_flag_set(true, Some("1")));
        assert!(!help_flag_set(true, Some("true")));
        assert!(!help_flag_set(true, None));
        assert_eq!(help_key(true), "astetress_seen_help");
        assert_eq!(help_key(false), "tetress_seen_help");
    }
}
