use serde::{Deserialize, Deserializer, Serialize};

use crate::board::{BOARD_SIZE, Cell, Coord};
use crate::error::ReplayError;

/// Replays shipped with the solver demo, in display order.
pub const TEST_CASES: [&str; 9] = [
    "Visible A",
    "Visible B",
    "Easy A",
    "Easy B",
    "Trap A",
    "Trap B",
    "Hard A",
    "Hard B",
    "Hard C",
];

pub fn replay_path(name: &str) -> String {
    format!("/astar_replays/{name}.json")
}

/// Row-major 11x11 snapshot as stored in replay files.
pub type Grid = Vec<Vec<Cell>>;

/// Solver dumps write `null` for absent lists; read it like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct SearchState {
    #[serde(deserialize_with = "null_as_default")]
    pub board: Grid,
    pub depth: u32,
    pub f: f64,
    pub g: f64,
    pub h: f64,
    pub action: Option<Vec<Coord>>,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ReplayData {
    #[serde(deserialize_with = "null_as_default")]
    pub search_states: Vec<SearchState>,
    #[serde(deserialize_with = "null_as_default")]
    pub solution: Vec<Vec<Coord>>,
    #[serde(deserialize_with = "null_as_default")]
    pub solution_step: Vec<Grid>,
    pub target: Option<Coord>,
}

impl ReplayData {
    /// Missing or `null` fields fall back to empty; only text that is not JSON fails.
    pub fn from_json(text: &str) -> Result<ReplayData, ReplayError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ReplayStats {
    pub nodes_explored: usize,
    pub solution_length: usize,
}

/// Frame delay for a speed multiplier; unknown multipliers play slowly.
pub fn frame_delay_ms(speed: f32) -> f32 {
    if speed == 0.5 {
        200.0
    } else if speed == 1.0 {
        100.0
    } else if speed == 2.0 {
        50.0
    } else {
        400.0
    }
}

/// What the board area currently shows.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "kind", content = "step", rename_all = "camelCase")]
pub enum ReplayView {
    Search,
    SolutionStep(usize),
    FullSolution,
}

#[derive(Clone, Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplayFrame {
    pub board: Grid,
    pub index: usize,
    pub frame_count: usize,
    pub playing: bool,
    pub speed: f32,
    pub view: ReplayView,
    pub solution_cells: Vec<Coord>,
    pub target: Option<Coord>,
    pub message: Option<String>,
    pub depth: Option<u32>,
    pub stats: ReplayStats,
}

/// Read-only playback over a loaded replay. Nothing is recomputed: every
/// board shown comes straight from the file.
#[derive(Clone, Debug)]
pub struct ReplayViewer {
    data: ReplayData,
    index: usize,
    playing: bool,
    speed: f32,
    view: ReplayView,
    elapsed_ms: f32,
}

impl ReplayViewer {
    pub fn new(data: ReplayData) -> Self {
        Self {
            data,
            index: 0,
            playing: false,
            speed: 1.0,
            view: ReplayView::Search,
            elapsed_ms: 0.0,
        }
    }

    pub fn data(&self) -> &ReplayData {
        &self.data
    }

    pub fn frame_count(&self) -> usize {
        self.data.search_states.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn view(&self) -> ReplayView {
        self.view
    }

    pub fn stats(&self) -> ReplayStats {
        ReplayStats {
            nodes_explored: self.data.search_states.len(),
            solution_length: self.data.solution.len(),
        }
    }

    fn at_last_frame(&self) -> bool {
        self.index + 1 >= self.frame_count()
    }

    fn leave_solution_view(&mut self) {
        self.view = ReplayView::Search;
    }

    pub fn current_state(&self) -> Option<&SearchState> {
        self.data.search_states.get(self.index)
    }

    pub fn next(&mut self) {
        if !self.at_last_frame() {
            self.index += 1;
        }
        self.elapsed_ms = 0.0;
    }

    pub fn previous(&mut self) {
        self.index = self.index.saturating_sub(1);
        self.elapsed_ms = 0.0;
    }

    /// Slider jump: stops playback and returns to the search view.
    pub fn jump(&mut self, index: usize) {
        self.index = index.min(self.frame_count().saturating_sub(1));
        self.playing = false;
        self.elapsed_ms = 0.0;
        self.leave_solution_view();
    }

    pub fn play(&mut self) {
        self.leave_solution_view();
        if self.at_last_frame() {
            self.index = 0;
        }
        self.playing = true;
        self.elapsed_ms = 0.0;
    }

    pub fn pause(&mut self) {
        self.playing = false;
        self.elapsed_ms = 0.0;
    }

    /// Play/pause button: at the end it restarts from the first frame.
    pub fn toggle_play(&mut self) {
        if self.playing && !self.at_last_frame() {
            self.pause();
            self.leave_solution_view();
        } else {
            self.play();
        }
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.playing = false;
        self.elapsed_ms = 0.0;
        self.leave_solution_view();
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    /// Advances playback by `dt_ms`. Returns how many frames were stepped.
    /// Reaching the last frame stops playback.
    pub fn tick(&mut self, dt_ms: f32) -> usize {
        if !self.playing {
            return 0;
        }
        let delay = frame_delay_ms(self.speed);
        let mut stepped = 0;
        self.elapsed_ms += dt_ms;
        while self.playing && self.elapsed_ms >= delay {
            if self.at_last_frame() {
                break;
            }
            self.elapsed_ms -= delay;
            self.index += 1;
            stepped += 1;
        }
        if self.at_last_frame() {
            self.playing = false;
            self.elapsed_ms = 0.0;
        }
        stepped
    }

    pub fn solution_step_count(&self) -> usize {
        self.data.solution_step.len()
    }

    pub fn next_solution_step(&mut self) {
        if self.solution_step_count() == 0 {
            return;
        }
        let last = self.solution_step_count() - 1;
        self.view = match self.view {
            ReplayView::SolutionStep(i) => ReplayView::SolutionStep((i + 1).min(last)),
            _ => ReplayView::SolutionStep(0),
        };
    }

    pub fn previous_solution_step(&mut self) {
        if self.solution_step_count() == 0 {
            return;
        }
        self.view = match self.view {
            ReplayView::SolutionStep(i) => ReplayView::SolutionStep(i.saturating_sub(1)),
            _ => ReplayView::SolutionStep(0),
        };
    }

    pub fn show_full_solution(&mut self) {
        self.view = ReplayView::FullSolution;
    }

    /// The snapshot to draw, if any. Callers draw an empty board for `None`.
    pub fn display_grid(&self) -> Option<&Grid> {
        match self.view {
            ReplayView::FullSolution => self
                .data
                .solution_step
                .last()
                .or_else(|| self.current_state().map(|s| &s.board)),
            ReplayView::SolutionStep(i) => self
                .data
                .solution_step
                .get(i)
                .or_else(|| self.current_state().map(|s| &s.board)),
            ReplayView::Search => self.current_state().map(|s| &s.board),
        }
    }

    pub fn cell(&self, coord: Coord) -> Cell {
        self.display_grid()
            .and_then(|g| g.get(coord.r))
            .and_then(|row| row.get(coord.c))
            .copied()
            .flatten()
    }

    fn all_solution_cells(&self) -> impl Iterator<Item = &Coord> + '_ {
        self.data.solution.iter().flatten()
    }

    pub fn is_solution_cell(&self, coord: Coord) -> bool {
        match self.view {
            ReplayView::FullSolution => self.all_solution_cells().any(|&c| c == coord),
            ReplayView::SolutionStep(i) => self
                .data
                .solution
                .get(i)
                .is_some_and(|step| step.contains(&coord)),
            ReplayView::Search => {
                self.frame_count() > 0
                    && self.at_last_frame()
                    && self.all_solution_cells().any(|&c| c == coord)
            }
        }
    }

    pub fn is_target(&self, coord: Coord) -> bool {
        self.data.target == Some(coord)
    }

    pub fn frame(&self) -> ReplayFrame {
        let board = match self.display_grid() {
            Some(grid) => grid.clone(),
            None => vec![vec![None; BOARD_SIZE]; BOARD_SIZE],
        };
        let solution_cells: Vec<Coord> = (0..BOARD_SIZE)
            .flat_map(|r| (0..BOARD_SIZE).map(move |c| Coord { r, c }))
            .filter(|&c| self.is_solution_cell(c))
            .collect();
        let state = self.current_state();
        ReplayFrame {
            board,
            index: self.index,
            frame_count: self.frame_count(),
            playing: self.playing,
            speed: self.speed,
            view: self.view,
            solution_cells,
            target: self.data.target,
            message: state.map(|s| s.message.clone()),
            depth: state.map(|s| s.depth),
            stats: self.stats(),
        }
    }
}
