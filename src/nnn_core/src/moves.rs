use std::{fmt, str::FromStr};

use itertools::Itertools;

use crate::{
    errors::{CubeError, Result},
    face::Face,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Turn {
    Clockwise,
    CounterClockwise,
    Half,
}

impl Turn {
    /// Quarter turns in the clockwise direction, modulo 4.
    #[must_use]
    pub fn quarters(self) -> u8 {
        match self {
            Turn::Clockwise => 1,
            Turn::Half => 2,
            Turn::CounterClockwise => 3,
        }
    }

    /// The inverse of `quarters`. Zero quarters is no turn at all.
    #[must_use]
    pub fn from_quarters(quarters: u8) -> Option<Self> {
        match quarters % 4 {
            1 => Some(Turn::Clockwise),
            2 => Some(Turn::Half),
            3 => Some(Turn::CounterClockwise),
            _ => None,
        }
    }

    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Turn::Clockwise => Turn::CounterClockwise,
            Turn::CounterClockwise => Turn::Clockwise,
            Turn::Half => Turn::Half,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Turn::Clockwise => "",
            Turn::CounterClockwise => "'",
            Turn::Half => "2",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// The outer `width` layers of `face` turn together. Width one is a plain
    /// face turn.
    Block,
    /// Only layer `width` counted from `face` turns. Written `2U`, `3R'` and
    /// so on; it is executed as two block turns.
    Slice,
    /// `x`, `y` or `z`. Stored against the face it follows (R, U and F).
    Rotation,
}

/// A parsed move token.
///
/// ```text
/// x | y | z                 whole cube rotation
/// FACE                      outer layer
/// [k]FACEw                  outer k layers, k defaults to 2
/// kFACE                     layer k only (2 <= k <= N-1)
/// ```
///
/// Every form takes an optional `'` or `2` suffix.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    pub face: Face,
    pub kind: MoveKind,
    /// Zero for rotations, whose width is the cube size.
    pub width: usize,
    pub turn: Turn,
}

impl Move {
    #[must_use]
    pub fn new(face: Face, width: usize, turn: Turn) -> Self {
        Move {
            face,
            kind: MoveKind::Block,
            width,
            turn,
        }
    }

    #[must_use]
    pub fn outer(face: Face, turn: Turn) -> Self {
        Move::new(face, 1, turn)
    }

    #[must_use]
    pub fn slice(face: Face, layer: usize, turn: Turn) -> Self {
        Move {
            face,
            kind: MoveKind::Slice,
            width: layer,
            turn,
        }
    }

    /// `axis` is R for x, U for y and F for z.
    #[must_use]
    pub fn rotation(axis: Face, turn: Turn) -> Self {
        Move {
            face: axis,
            kind: MoveKind::Rotation,
            width: 0,
            turn,
        }
    }

    #[must_use]
    pub fn inverse(self) -> Self {
        Move {
            turn: self.turn.inverse(),
            ..self
        }
    }

    /// The number of layers counted from `face` that this move touches on a
    /// cube of the given size.
    #[must_use]
    pub fn rows_to_rotate(self, size: usize) -> usize {
        match self.kind {
            MoveKind::Rotation => size,
            MoveKind::Block | MoveKind::Slice => self.width,
        }
    }

    /// True when the move turns the whole cube, either as `x`/`y`/`z` or as a
    /// block turn as wide as the cube.
    #[must_use]
    pub fn is_whole_cube(self, size: usize) -> bool {
        match self.kind {
            MoveKind::Rotation => true,
            MoveKind::Block => self.width == size,
            MoveKind::Slice => false,
        }
    }

    /// Checks the move makes sense on a cube of the given size.
    ///
    /// # Errors
    ///
    /// `CubeError::InvalidMove` if the block or slice is wider than the cube.
    pub fn validate(self, size: usize) -> Result<()> {
        let ok = match self.kind {
            MoveKind::Rotation => true,
            MoveKind::Block => (1..=size).contains(&self.width),
            MoveKind::Slice => (2..size).contains(&self.width),
        };
        if ok {
            Ok(())
        } else {
            Err(CubeError::InvalidMove(format!("{self} on a {size}x{size}x{size}")))
        }
    }

    /// Decodes the move into `(face, rows_to_rotate, quarter_turns, reverse)`.
    /// Slices must be expanded first.
    pub(crate) fn decode(self, size: usize) -> (Face, usize, usize, bool) {
        let (quarter_turns, reverse) = match self.turn {
            Turn::Clockwise => (1, false),
            Turn::CounterClockwise => (1, true),
            Turn::Half => (2, false),
        };
        (self.face, self.rows_to_rotate(size), quarter_turns, reverse)
    }

    /// The two block turns a slice move is executed as. Layer `k` alone is the
    /// outer `k` layers followed by the outer `k-1` layers turned back.
    pub(crate) fn slice_expansion(self) -> [Move; 2] {
        let layer = self.width;
        [
            Move::new(self.face, layer, self.turn),
            Move::new(self.face, layer - 1, self.turn.inverse()),
        ]
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = self.turn.suffix();
        match self.kind {
            MoveKind::Rotation => {
                let axis = match self.face {
                    Face::R | Face::L => 'x',
                    Face::U | Face::D => 'y',
                    Face::F | Face::B => 'z',
                };
                write!(f, "{axis}{suffix}")
            }
            MoveKind::Block => match self.width {
                1 => write!(f, "{}{suffix}", self.face),
                2 => write!(f, "{}w{suffix}", self.face),
                width => write!(f, "{width}{}w{suffix}", self.face),
            },
            MoveKind::Slice => write!(f, "{}{}{suffix}", self.width, self.face),
        }
    }
}

impl FromStr for Move {
    type Err = CubeError;

    fn from_str(token: &str) -> Result<Self> {
        let invalid = || CubeError::InvalidMove(token.to_owned());

        let (body, turn) = if let Some(body) = token.strip_suffix("2'") {
            (body, Turn::Half)
        } else if let Some(body) = token.strip_suffix('\'') {
            (body, Turn::CounterClockwise)
        } else if let Some(body) = token.strip_suffix('2') {
            (body, Turn::Half)
        } else {
            (token, Turn::Clockwise)
        };

        match body {
            "x" => return Ok(Move::rotation(Face::R, turn)),
            "y" => return Ok(Move::rotation(Face::U, turn)),
            "z" => return Ok(Move::rotation(Face::F, turn)),
            _ => {}
        }

        let digits = body.bytes().take_while(u8::is_ascii_digit).count();
        let layers = if digits == 0 {
            None
        } else {
            let layers = body[..digits].parse::<usize>().map_err(|_| invalid())?;
            if layers == 0 {
                return Err(invalid());
            }
            Some(layers)
        };

        let rest = &body[digits..];
        let (face, wide) = match rest.as_bytes() {
            [face] => (*face, false),
            [face, b'w'] => (*face, true),
            _ => return Err(invalid()),
        };
        let face = Face::from_label(face).ok_or_else(invalid)?;

        Ok(match (layers, wide) {
            (None, false) | (Some(1), false) => Move::outer(face, turn),
            (None, true) => Move::new(face, 2, turn),
            (Some(width), true) => Move::new(face, width, turn),
            (Some(layer), false) => Move::slice(face, layer, turn),
        })
    }
}

/// Parses a whitespace separated move sequence.
///
/// # Errors
///
/// `CubeError::InvalidMove` for the first token that does not parse.
pub fn parse_moves(seq: &str) -> Result<Vec<Move>> {
    seq.split_whitespace().map(str::parse).collect()
}

#[must_use]
pub fn moves_to_string(moves: &[Move]) -> String {
    moves.iter().join(" ")
}

/// The sequence that undoes `steps`: reversed, with every quarter turn
/// inverted. Half turns are their own inverse.
#[must_use]
pub fn reverse_steps(steps: &[Move]) -> Vec<Move> {
    steps.iter().rev().map(|step| step.inverse()).collect()
}

/// A random sequence of block turns no wider than half the cube, never turning
/// the same face twice in a row.
#[must_use]
pub fn random_moves(size: usize, len: usize, rng: &mut fastrand::Rng) -> Vec<Move> {
    let max_width = (size / 2).max(1);
    let mut moves: Vec<Move> = Vec::with_capacity(len);
    while moves.len() < len {
        let face = Face::ALL[rng.usize(..Face::ALL.len())];
        if moves.last().is_some_and(|last| last.face == face) {
            continue;
        }
        let turn = [Turn::Clockwise, Turn::CounterClockwise, Turn::Half][rng.usize(..3)];
        moves.push(Move::new(face, rng.usize(1..=max_width), turn));
    }
    moves
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grammar() {
        assert_eq!("U".parse::<Move>().unwrap(), Move::outer(Face::U, Turn::Clockwise));
        assert_eq!("R'".parse::<Move>().unwrap(), Move::outer(Face::R, Turn::CounterClockwise));
        assert_eq!("F2".parse::<Move>().unwrap(), Move::outer(Face::F, Turn::Half));
        assert_eq!("Lw".parse::<Move>().unwrap(), Move::new(Face::L, 2, Turn::Clockwise));
        assert_eq!("3Bw2".parse::<Move>().unwrap(), Move::new(Face::B, 3, Turn::Half));
        assert_eq!("2D'".parse::<Move>().unwrap(), Move::slice(Face::D, 2, Turn::CounterClockwise));
        assert_eq!("1U".parse::<Move>().unwrap(), Move::outer(Face::U, Turn::Clockwise));
        assert_eq!("x'".parse::<Move>().unwrap(), Move::rotation(Face::R, Turn::CounterClockwise));
        assert_eq!("y2".parse::<Move>().unwrap(), Move::rotation(Face::U, Turn::Half));
        assert_eq!("U2'".parse::<Move>().unwrap(), Move::outer(Face::U, Turn::Half));
    }

    #[test]
    fn rejects_garbage() {
        for token in ["", "Q", "0U", "u", "Uw'w", "w", "2", "x3", "R3"] {
            assert!(token.parse::<Move>().is_err(), "{token} parsed");
        }
    }

    #[test]
    fn display_round_trips() {
        for token in ["U", "R'", "F2", "Lw", "3Bw2", "2D'", "x", "y'", "z2", "4Uw'"] {
            assert_eq!(token.parse::<Move>().unwrap().to_string(), token);
        }
    }

    #[test]
    fn validates_against_size() {
        assert!(Move::new(Face::U, 4, Turn::Clockwise).validate(4).is_ok());
        assert!(Move::new(Face::U, 5, Turn::Clockwise).validate(4).is_err());
        assert!(Move::slice(Face::U, 3, Turn::Clockwise).validate(4).is_ok());
        assert!(Move::slice(Face::U, 4, Turn::Clockwise).validate(4).is_err());
        assert!(Move::slice(Face::U, 2, Turn::Clockwise).validate(2).is_err());
    }

    #[test]
    fn reverse_steps_inverts_and_reverses() {
        let steps = parse_moves("U R' 2F2 Lw x").unwrap();
        assert_eq!(moves_to_string(&reverse_steps(&steps)), "x' Lw' 2F2 R U'");
    }

    #[test]
    fn random_moves_never_repeat_a_face() {
        let mut rng = fastrand::Rng::with_seed(7);
        let moves = random_moves(6, 200, &mut rng);
        assert_eq!(moves.len(), 200);
        assert!(moves.windows(2).all(|w| w[0].face != w[1].face));
        assert!(moves.iter().all(|m| m.validate(6).is_ok() && m.width <= 3));
    }
}
