use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::WireError;

/// Relative `(dr, dc)` offset of one mino from the placement anchor.
pub type Offset = (i8, i8);

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shape {
    I,
    O,
    T,
    J,
    L,
    S,
    Z,
}

// Each variant lists the anchor first. Symmetric pieces carry fewer variants so
// that cycling rotations never shows the same footprint twice.
const I_VARIANTS: [[Offset; 4]; 2] = [
    [(0, 0), (0, 1), (0, 2), (0, 3)],
    [(0, 0), (1, 0), (2, 0), (3, 0)],
];

const O_VARIANTS: [[Offset; 4]; 1] = [[(0, 0), (0, 1), (1, 0), (1, 1)]];

const T_VARIANTS: [[Offset; 4]; 4] = [
    [(0, 0), (1, 0), (2, 0), (1, 1)],
    [(0, 0), (0, -1), (0, -2), (1, -1)],
    [(0, 0), (-1, 0), (-2, 0), (-1, -1)],
    [(0, 0), (0, 1), (0, 2), (-1, 1)],
];

const J_VARIANTS: [[Offset; 4]; 4] = [
    [(0, 0), (0, 1), (0, 2), (1, 2)],
    [(0, 0), (-1, 0), (-2, 0), (-2, 1)],
    [(0, 0), (0, -1), (0, -2), (-1, -2)],
    [(0, 0), (1, 0), (2, -1), (2, 0)],
];

const L_VARIANTS: [[Offset; 4]; 4] = [
    [(0, 0), (0, 1), (1, 1), (2, 1)],
    [(0, 0), (1, 0), (1, -1), (1, -2)],
    [(0, 0), (0, -1), (-1, -1), (-2, -1)],
    [(0, 0), (-1, 1), (-1, 2), (-1, 0)],
];

const S_VARIANTS: [[Offset; 4]; 2] = [
    [(0, 0), (1, 0), (1, 1), (2, 1)],
    [(0, 0), (0, 1), (-1, 1), (-1, 2)],
];

const Z_VARIANTS: [[Offset; 4]; 2] = [
    [(0, 0), (0, 1), (1, 1), (1, 2)],
    [(0, 0), (1, 0), (1, -1), (2, -1)],
];

impl Shape {
    pub fn all() -> [Shape; 7] {
        [
            Shape::I,
            Shape::O,
            Shape::T,
            Shape::J,
            Shape::L,
            Shape::S,
            Shape::Z,
        ]
    }

    pub fn variants(self) -> &'static [[Offset; 4]] {
        match self {
            Shape::I => &I_VARIANTS,
            Shape::O => &O_VARIANTS,
            Shape::T => &T_VARIANTS,
            Shape::J => &J_VARIANTS,
            Shape::L => &L_VARIANTS,
            Shape::S => &S_VARIANTS,
            Shape::Z => &Z_VARIANTS,
        }
    }

    pub fn variant_count(self) -> usize {
        self.variants().len()
    }

    /// Folds any rotation index, negative ones included, into this shape's
    /// own variant range.
    pub fn normalize_rotation(self, rotation: i32) -> usize {
        rotation.rem_euclid(self.variant_count() as i32) as usize
    }

    pub fn offsets(self, rotation: i32) -> [Offset; 4] {
        self.variants()[self.normalize_rotation(rotation)]
    }

    pub fn letter(self) -> char {
        match self {
            Shape::I => 'I',
            Shape::O => 'O',
            Shape::T => 'T',
            Shape::J => 'J',
            Shape::L => 'L',
            Shape::S => 'S',
            Shape::Z => 'Z',
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Shape {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "I" => Ok(Shape::I),
            "O" => Ok(Shape::O),
            "T" => Ok(Shape::T),
            "J" => Ok(Shape::J),
            "L" => Ok(Shape::L),
            "S" => Ok(Shape::S),
            "Z" => Ok(Shape::Z),
            _ => Err(WireError::UnknownShape(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn footprint(offsets: [Offset; 4]) -> Vec<Offset> {
        let min_r = offsets.iter().map(|o| o.0).min().unwrap_or(0);
        let min_c = offsets.iter().map(|o| o.1).min().unwrap_or(0);
        let mut v: Vec<Offset> = offsets.iter().map(|o| (o.0 - min_r, o.1 - min_c)).collect();
        v.sort();
        v
    }

    #[test]
    fn variant_counts_per_shape() {
        assert_eq!(Shape::O.variant_count(), 1);
        assert_eq!(Shape::I.variant_count(), 2);
        assert_eq!(Shape::S.variant_count(), 2);
        assert_eq!(Shape::Z.variant_count(), 2);
        assert_eq!(Shape::T.variant_count(), 4);
        assert_eq!(Shape::J.variant_count(), 4);
        assert_eq!(Shape::L.variant_count(), 4);
    }

    #[test]
    fn every_variant_has_four_distinct_cells_and_starts_at_anchor() {
        for shape in Shape::all() {
            for variant in shape.variants() {
                assert_eq!(variant[0], (0, 0), "{shape} variant must start at the anchor");
                let distinct: HashSet<Offset> = variant.iter().copied().collect();
                assert_eq!(distinct.len(), 4, "{shape} has a repeated mino");
            }
        }
    }

    #[test]
    fn variants_of_a_shape_never_share_a_footprint() {
        for shape in Shape::all() {
            let footprints: HashSet<Vec<Offset>> =
                shape.variants().iter().map(|v| footprint(*v)).collect();
            assert_eq!(footprints.len(), shape.variant_count(), "{shape}");
        }
    }

    #[test]
    fn square_ignores_rotation() {
        assert_eq!(Shape::O.offsets(0), Shape::O.offsets(1));
        assert_eq!(Shape::O.offsets(0), Shape::O.offsets(-7));
    }

    #[test]
    fn rotation_wraps_per_shape() {
        assert_eq!(Shape::I.offsets(5), Shape::I.offsets(1));
        assert_eq!(Shape::T.offsets(5), Shape::T.offsets(1));
        assert_eq!(Shape::T.normalize_rotation(-1), 3);
        assert_eq!(Shape::S.normalize_rotation(-1), 1);
    }

    #[test]
    fn parses_letters_case_insensitively() {
        assert_eq!("z".parse::<Shape>().unwrap(), Shape::Z);
        assert_eq!(" L ".parse::<Shape>().unwrap(), Shape::L);
        assert!("Q".parse::<Shape>().is_err());
    }
}
