use pretty_assertions::assert_eq;
use proptest::prelude::*;

use tetress::board::{BOARD_SIZE, Board, Coord, Counts, Placement, Player};
use tetress::error::PlacementError;
use tetress::shape::Shape;

fn place(board: &Board, player: Player, shape: Shape, r: i32, c: i32, rot: i32) -> Board {
    board
        .apply_placement(player, &Placement::new(shape, r, c, rot))
        .unwrap()
        .board
}

fn sorted(mut cells: [Coord; 4]) -> [Coord; 4] {
    cells.sort();
    cells
}

#[test]
fn square_in_the_corner() {
    let applied = Board::new()
        .apply_placement(Player::Red, &Placement::new(Shape::O, 0, 0, 0))
        .unwrap();
    for (r, c) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
        assert_eq!(applied.board.get(Coord { r, c }), Some(Player::Red));
    }
    assert!(applied.cleared.is_empty());
    assert_eq!(applied.counts, Counts { red: 4, blue: 0 });
}

#[test]
fn completing_a_row_clears_it() {
    let mut board = Board::new();
    board = place(&board, Player::Red, Shape::I, 5, 0, 0);
    board = place(&board, Player::Red, Shape::I, 5, 4, 0);
    board = place(&board, Player::Red, Shape::O, 5, 8, 0);
    assert_eq!(board.get(Coord { r: 5, c: 10 }), None);
    assert_eq!(board.count(Player::Red), 12);

    let applied = board
        .apply_placement(Player::Red, &Placement::new(Shape::I, 5, 10, 1))
        .unwrap();
    assert_eq!(applied.cleared.rows, vec![5]);
    assert!(applied.cleared.cols.is_empty());
    for c in 0..BOARD_SIZE {
        assert_eq!(applied.board.get(Coord { r: 5, c }), None);
    }
    // What hung below the row survives.
    assert_eq!(applied.counts.red, 5);
    assert_eq!(applied.board.get(Coord { r: 6, c: 8 }), Some(Player::Red));
    assert_eq!(applied.board.get(Coord { r: 8, c: 10 }), Some(Player::Red));
}

#[test]
fn one_piece_clears_a_row_and_a_column_together() {
    // Row 3 full except (3,7); column 7 full except rows 3..=6.
    let mut grid = vec![vec![None; BOARD_SIZE]; BOARD_SIZE];
    for c in 0..BOARD_SIZE {
        if c != 7 {
            grid[3][c] = Some(Player::Blue);
        }
    }
    for r in 0..BOARD_SIZE {
        if !(3..=6).contains(&r) {
            grid[r][7] = Some(Player::Red);
        }
    }
    grid[9][9] = Some(Player::Red);
    let board = Board::from_grid(&grid);

    let applied = board
        .apply_placement(Player::Red, &Placement::new(Shape::I, 3, 7, 1))
        .unwrap();
    assert_eq!(applied.cleared.rows, vec![3]);
    assert_eq!(applied.cleared.cols, vec![7]);
    for i in 0..BOARD_SIZE {
        assert_eq!(applied.board.get(Coord { r: 3, c: i }), None);
        assert_eq!(applied.board.get(Coord { r: i, c: 7 }), None);
    }
    assert_eq!(applied.counts, Counts { red: 1, blue: 0 });
}

#[test]
fn adjacency_wraps_around_the_edges() {
    let board = place(&Board::new(), Player::Blue, Shape::I, 0, 0, 1);
    // Touches (0,0) only across the top edge.
    let across = Placement::new(Shape::I, 7, 0, 1);
    assert_eq!(sorted(across.cells())[3], Coord { r: 10, c: 0 });
    assert!(board.is_valid_placement(Player::Blue, &across));

    let far = Placement::new(Shape::O, 5, 5, 0);
    assert_eq!(
        board.check_placement(Player::Blue, &far),
        Err(PlacementError::NotAdjacent)
    );
    // Red still owns nothing and may start anywhere free.
    assert!(board.is_valid_placement(Player::Red, &far));
}

#[test]
fn diagonal_contact_does_not_count() {
    let board = place(&Board::new(), Player::Red, Shape::O, 0, 0, 0);
    assert!(!board.is_valid_placement(Player::Red, &Placement::new(Shape::O, 2, 2, 0)));
}

#[test]
fn overlap_is_rejected_for_either_owner() {
    let mut board = place(&Board::new(), Player::Red, Shape::O, 0, 0, 0);
    board = place(&board, Player::Blue, Shape::I, 2, 0, 0);
    let over_own = Placement::new(Shape::I, 1, 1, 0);
    let over_other = Placement::new(Shape::I, 2, 3, 1);
    assert_eq!(
        board.check_placement(Player::Red, &over_own),
        Err(PlacementError::Occupied(Coord { r: 1, c: 1 }))
    );
    assert_eq!(
        board.check_placement(Player::Red, &over_other),
        Err(PlacementError::Occupied(Coord { r: 2, c: 3 }))
    );
}

#[test]
fn wiped_out_player_may_restart_anywhere() {
    // Red's only cells sit in row 0, which blue then completes.
    let mut grid = vec![vec![None; BOARD_SIZE]; BOARD_SIZE];
    for c in 0..7 {
        grid[0][c] = Some(Player::Red);
    }
    grid[1][7] = Some(Player::Blue);
    let board = Board::from_grid(&grid);
    let applied = board
        .apply_placement(Player::Blue, &Placement::new(Shape::I, 0, 7, 0))
        .unwrap();
    assert_eq!(applied.counts.red, 0);
    assert!(
        applied
            .board
            .is_valid_placement(Player::Red, &Placement::new(Shape::T, 6, 6, 3))
    );
}

fn any_shape() -> impl Strategy<Value = Shape> {
    prop::sample::select(Shape::all().to_vec())
}

proptest! {
    #[test]
    fn anchors_wrap_onto_the_board(
        shape in any_shape(),
        rot in 0i32..4,
        r in -500i32..500,
        c in -500i32..500,
    ) {
        let far = Placement::new(shape, r, c, rot);
        let near = Placement::new(shape, r.rem_euclid(11), c.rem_euclid(11), rot);
        prop_assert_eq!(sorted(far.cells()), sorted(near.cells()));
        for cell in far.cells() {
            prop_assert!(cell.r < BOARD_SIZE && cell.c < BOARD_SIZE);
        }
    }

    #[test]
    fn rotation_is_taken_per_shape(shape in any_shape(), rot in -40i32..40) {
        let n = shape.variant_count() as i32;
        prop_assert_eq!(shape.offsets(rot), shape.offsets(rot.rem_euclid(n)));
        prop_assert_eq!(shape.offsets(rot), shape.offsets(rot + n));
    }

    #[test]
    fn empty_board_accepts_every_placement(
        shape in any_shape(),
        rot in 0i32..4,
        r in 0i32..11,
        c in 0i32..11,
    ) {
        let p = Placement::new(shape, r, c, rot);
        prop_assert!(Board::new().is_valid_placement(Player::Red, &p));
        prop_assert!(Board::new().is_valid_placement(Player::Blue, &p));
    }

    #[test]
    fn a_rejected_placement_leaves_no_trace(
        shape in any_shape(),
        rot in 0i32..4,
        r in 0i32..11,
        c in 0i32..11,
    ) {
        let board = place(&Board::new(), Player::Red, Shape::O, 5, 5, 0);
        let p = Placement::new(shape, r, c, rot);
        match board.apply_placement(Player::Red, &p) {
            Ok(applied) => prop_assert_eq!(applied.counts.red, 8),
            Err(_) => prop_assert!(!board.is_valid_placement(Player::Red, &p)),
        }
        prop_assert_eq!(board.count(Player::Red), 4);
    }
}

#[test]
fn shape_cardinalities() {
    assert_eq!(Shape::O.offsets(0), Shape::O.offsets(1));
    assert_eq!(Shape::I.variant_count(), 2);
    assert_ne!(Shape::I.offsets(0), Shape::I.offsets(1));
    assert_eq!(Shape::I.offsets(5), Shape::I.offsets(1));
    assert_eq!(Shape::S.offsets(5), Shape::S.offsets(1));
    for shape in [Shape::T, Shape::J, Shape::L] {
        assert_eq!(shape.variant_count(), 4);
    }
}
