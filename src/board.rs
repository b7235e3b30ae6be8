use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PlacementError, WireError};
use crate::shape::Shape;

pub const BOARD_SIZE: usize = 11;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    #[serde(alias = "RED")]
    Red,
    #[serde(alias = "BLUE")]
    Blue,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::Red => Player::Blue,
            Player::Blue => Player::Red,
        }
    }

    fn symbol(self) -> char {
        match self {
            Player::Red => 'r',
            Player::Blue => 'b',
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Red => write!(f, "red"),
            Player::Blue => write!(f, "blue"),
        }
    }
}

/// `None` is an empty cell.
pub type Cell = Option<Player>;

/// Wire form of a board: every `"r,c"` key mapped to its owner or `null`.
pub type BoardMap = BTreeMap<String, Cell>;

/// A cell position, always inside `[0, BOARD_SIZE)` on both axes.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub r: usize,
    pub c: usize,
}

impl Coord {
    /// Maps any integer pair onto the torus.
    pub fn wrapped(r: i64, c: i64) -> Coord {
        let n = BOARD_SIZE as i64;
        Coord {
            r: r.rem_euclid(n) as usize,
            c: c.rem_euclid(n) as usize,
        }
    }

    pub fn offset(self, dr: i64, dc: i64) -> Coord {
        Coord::wrapped(self.r as i64 + dr, self.c as i64 + dc)
    }

    /// Orthogonal neighbours; on the torus every cell has exactly four.
    pub fn neighbors(self) -> [Coord; 4] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }

    pub fn key(self) -> String {
        format!("{},{}", self.r, self.c)
    }

    pub fn parse_key(key: &str) -> Result<Coord, WireError> {
        let bad = || WireError::BadCellKey(key.to_string());
        let (r, c) = key.split_once(',').ok_or_else(bad)?;
        let r: usize = r.trim().parse().map_err(|_| bad())?;
        let c: usize = c.trim().parse().map_err(|_| bad())?;
        if r >= BOARD_SIZE || c >= BOARD_SIZE {
            return Err(bad());
        }
        Ok(Coord { r, c })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.r, self.c)
    }
}

/// A candidate action. Anchor and rotation may be any integers; both are
/// folded onto the board and the shape's variant table when resolved.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    pub shape: Shape,
    pub row: i32,
    pub col: i32,
    pub rotation: i32,
}

impl Placement {
    pub fn new(shape: Shape, row: i32, col: i32, rotation: i32) -> Self {
        Self {
            shape,
            row,
            col,
            rotation,
        }
    }

    pub fn cells(&self) -> [Coord; 4] {
        let anchor = Coord::wrapped(self.row as i64, self.col as i64);
        self.shape
            .offsets(self.rotation)
            .map(|(dr, dc)| anchor.offset(dr as i64, dc as i64))
    }

    pub fn normalized(&self) -> Placement {
        let anchor = Coord::wrapped(self.row as i64, self.col as i64);
        Placement {
            shape: self.shape,
            row: anchor.r as i32,
            col: anchor.c as i32,
            rotation: self.shape.normalize_rotation(self.rotation) as i32,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct ClearedLines {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
}

impl ClearedLines {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.cols.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len() + self.cols.len()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.rows.contains(&coord.r) || self.cols.contains(&coord.c)
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Counts {
    pub red: usize,
    pub blue: usize,
}

impl Counts {
    pub fn of(&self, player: Player) -> usize {
        match player {
            Player::Red => self.red,
            Player::Blue => self.blue,
        }
    }
}

/// Result of committing a placement: the new board plus what changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied {
    pub board: Board,
    pub cells: [Coord; 4],
    pub cleared: ClearedLines,
    pub counts: Counts,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    pub fn get(&self, coord: Coord) -> Cell {
        self.cells[coord.r][coord.c]
    }

    fn set(&mut self, coord: Coord, cell: Cell) {
        self.cells[coord.r][coord.c] = cell;
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(|c| c.is_none())
    }

    pub fn coords() -> impl Iterator<Item = Coord> {
        (0..BOARD_SIZE).flat_map(|r| (0..BOARD_SIZE).map(move |c| Coord { r, c }))
    }

    pub fn owned_by(&self, player: Player) -> impl Iterator<Item = Coord> + '_ {
        Board::coords().filter(move |&coord| self.get(coord) == Some(player))
    }

    pub fn count(&self, player: Player) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&c| c == Some(player))
            .count()
    }

    pub fn counts(&self) -> Counts {
        Counts {
            red: self.count(Player::Red),
            blue: self.count(Player::Blue),
        }
    }

    pub fn owns_any(&self, player: Player) -> bool {
        self.cells.iter().flatten().any(|&c| c == Some(player))
    }

    fn touches(&self, player: Player, cells: &[Coord; 4]) -> bool {
        cells
            .iter()
            .flat_map(|c| c.neighbors())
            .any(|n| self.get(n) == Some(player))
    }

    /// Resolves the placement and checks it against the current board.
    /// Occupancy is reported before adjacency.
    pub fn check_placement(
        &self,
        player: Player,
        placement: &Placement,
    ) -> Result<[Coord; 4], PlacementError> {
        let cells = placement.cells();
        if let Some(&taken) = cells.iter().find(|&&c| self.get(c).is_some()) {
            return Err(PlacementError::Occupied(taken));
        }
        // A player's first piece, or the first after losing every cell to
        // clears, may go anywhere.
        if self.owns_any(player) && !self.touches(player, &cells) {
            return Err(PlacementError::NotAdjacent);
        }
        Ok(cells)
    }

    pub fn is_valid_placement(&self, player: Player, placement: &Placement) -> bool {
        self.check_placement(player, placement).is_ok()
    }

    /// Commits the placement on a copy of the board, then clears every full
    /// row and column found on the resulting board.
    pub fn apply_placement(
        &self,
        player: Player,
        placement: &Placement,
    ) -> Result<Applied, PlacementError> {
        let cells = self.check_placement(player, placement)?;
        let mut board = self.clone();
        for &coord in &cells {
            board.set(coord, Some(player));
        }
        let cleared = board.full_lines();
        board.clear_lines(&cleared);
        let counts = board.counts();
        Ok(Applied {
            board,
            cells,
            cleared,
            counts,
        })
    }

    pub fn full_lines(&self) -> ClearedLines {
        let rows = (0..BOARD_SIZE)
            .filter(|&r| self.cells[r].iter().all(|c| c.is_some()))
            .collect();
        let cols = (0..BOARD_SIZE)
            .filter(|&c| (0..BOARD_SIZE).all(|r| self.cells[r][c].is_some()))
            .collect();
        ClearedLines { rows, cols }
    }

    fn clear_lines(&mut self, lines: &ClearedLines) {
        for &r in &lines.rows {
            self.cells[r] = [None; BOARD_SIZE];
        }
        for &c in &lines.cols {
            for row in self.cells.iter_mut() {
                row[c] = None;
            }
        }
    }

    fn candidates() -> impl Iterator<Item = Placement> {
        Shape::all().into_iter().flat_map(|shape| {
            (0..shape.variant_count() as i32).flat_map(move |rotation| {
                Board::coords()
                    .map(move |a| Placement::new(shape, a.r as i32, a.c as i32, rotation))
            })
        })
    }

    /// Every legal placement for `player`, one per distinct set of cells.
    pub fn legal_placements(&self, player: Player) -> Vec<Placement> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for placement in Board::candidates() {
            if let Ok(mut cells) = self.check_placement(player, &placement) {
                cells.sort();
                if seen.insert(cells) {
                    out.push(placement);
                }
            }
        }
        out
    }

    pub fn has_legal_placement(&self, player: Player) -> bool {
        Board::candidates().any(|p| self.is_valid_placement(player, &p))
    }

    pub fn to_wire(&self) -> BoardMap {
        Board::coords().map(|c| (c.key(), self.get(c))).collect()
    }

    /// Keys absent from the map are treated as empty cells.
    pub fn from_wire(map: &BoardMap) -> Result<Board, WireError> {
        let mut board = Board::new();
        for (key, cell) in map {
            board.set(Coord::parse_key(key)?, *cell);
        }
        Ok(board)
    }

    pub fn to_grid(&self) -> Vec<Vec<Cell>> {
        self.cells.iter().map(|row| row.to_vec()).collect()
    }

    /// Builds a board from nested rows, ignoring anything outside the 11x11
    /// window and leaving missing cells empty.
    pub fn from_grid(grid: &[Vec<Cell>]) -> Board {
        let mut board = Board::new();
        for (r, row) in grid.iter().take(BOARD_SIZE).enumerate() {
            for (c, cell) in row.iter().take(BOARD_SIZE).enumerate() {
                board.cells[r][c] = *cell;
            }
        }
        board
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: Vec<String> = row
                .iter()
                .map(|c| c.map_or('.', Player::symbol).to_string())
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

impl FromStr for Board {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        if lines.len() != BOARD_SIZE {
            return Err(WireError::BadBoardText(format!(
                "expected {BOARD_SIZE} rows, found {}",
                lines.len()
            )));
        }
        let mut board = Board::new();
        for (r, line) in lines.iter().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != BOARD_SIZE {
                return Err(WireError::BadBoardText(format!(
                    "row {r} has {} cells",
                    tokens.len()
                )));
            }
            for (c, token) in tokens.iter().enumerate() {
                board.cells[r][c] = match *token {
                    "r" | "R" => Some(Player::Red),
                    "b" | "B" => Some(Player::Blue),
                    "." | "-" => None,
                    other => {
                        return Err(WireError::BadBoardText(format!(
                            "unexpected token {other:?} at {r},{c}"
                        )));
                    }
                };
            }
        }
        Ok(board)
    }
}
