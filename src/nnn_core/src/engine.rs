use log::trace;

use crate::{
    cube::Cube,
    errors::{CubeError, Result},
    face::Face,
    moves::{Move, MoveKind, Turn, parse_moves},
};

/// For every face and layer, the four strips of facelets that a clockwise
/// turn of that layer cycles: strip `k` moves onto strip `k + 1`.
pub(crate) type Strips = Vec<Vec<[Vec<usize>; 4]>>;

pub(crate) fn build_strips(size: usize) -> Strips {
    let pos = |face: Face, r: usize, c: usize| face.index() * size * size + r * size + c + 1;
    let row = |face: Face, r: usize| -> Vec<usize> { (0..size).map(|c| pos(face, r, c)).collect() };
    let row_rev =
        |face: Face, r: usize| -> Vec<usize> { (0..size).rev().map(|c| pos(face, r, c)).collect() };
    let col = |face: Face, c: usize| -> Vec<usize> { (0..size).map(|r| pos(face, r, c)).collect() };
    let col_rev =
        |face: Face, c: usize| -> Vec<usize> { (0..size).rev().map(|r| pos(face, r, c)).collect() };
    let last = size - 1;

    Face::ALL
        .into_iter()
        .map(|face| {
            (0..size)
                .map(|l| match face {
                    Face::U => [
                        row(Face::F, l),
                        row(Face::L, l),
                        row(Face::B, l),
                        row(Face::R, l),
                    ],
                    Face::D => [
                        row(Face::F, last - l),
                        row(Face::R, last - l),
                        row(Face::B, last - l),
                        row(Face::L, last - l),
                    ],
                    Face::L => [
                        col(Face::U, l),
                        col(Face::F, l),
                        col(Face::D, l),
                        col_rev(Face::B, last - l),
                    ],
                    Face::R => [
                        col(Face::U, last - l),
                        col_rev(Face::B, l),
                        col(Face::D, last - l),
                        col(Face::F, last - l),
                    ],
                    Face::F => [
                        row(Face::U, last - l),
                        col(Face::R, l),
                        row_rev(Face::D, l),
                        col_rev(Face::L, last - l),
                    ],
                    Face::B => [
                        row_rev(Face::U, l),
                        col(Face::L, l),
                        row(Face::D, last - l),
                        col_rev(Face::R, last - l),
                    ],
                })
                .collect()
        })
        .collect()
}

/// Turns the NxN block of `face` a quarter turn, reading from `old`.
fn rotate_face(state: &mut [u8], old: &[u8], size: usize, face: Face, clockwise: bool) {
    let base = face.index() * size * size + 1;
    for r in 0..size {
        for c in 0..size {
            let from = if clockwise {
                (size - 1 - c) * size + r
            } else {
                c * size + (size - 1 - r)
            };
            state[base + r * size + c] = old[base + from];
        }
    }
}

impl Cube {
    /// Applies a primitive move: a block turn or a whole cube rotation. The
    /// move is appended to the solution.
    ///
    /// # Errors
    ///
    /// `CubeError::InvalidMove` for slice moves, which must go through
    /// `rotate`, and for blocks wider than the cube.
    pub fn rotate_guts(&mut self, mv: Move) -> Result<()> {
        if mv.kind == MoveKind::Slice {
            return Err(CubeError::InvalidMove(format!("{mv} is not a primitive move")));
        }
        mv.validate(self.size())?;

        let size = self.size();
        let (face, rows_to_rotate, quarter_turns, reverse) = mv.decode(size);
        for _ in 0..quarter_turns {
            let old = self.state.clone();
            rotate_face(&mut self.state, &old, size, face, !reverse);
            if rows_to_rotate == size {
                rotate_face(&mut self.state, &old, size, face.opposite(), reverse);
            }

            for strips in &self.strips[face.index()][..rows_to_rotate] {
                for k in 0..4 {
                    let (src, dst) = if reverse {
                        (&strips[(k + 1) % 4], &strips[k])
                    } else {
                        (&strips[k], &strips[(k + 1) % 4])
                    };
                    for (from, to) in src.iter().zip(dst) {
                        self.state[*to] = old[*from];
                    }
                }
            }
        }

        self.solution.push_move(mv);
        Ok(())
    }

    /// Applies any move. Slice moves run as two block turns and are logged as
    /// the single slice move.
    ///
    /// # Errors
    ///
    /// `CubeError::InvalidMove` if the move doesn't fit this cube.
    pub fn rotate(&mut self, mv: Move) -> Result<()> {
        mv.validate(self.size())?;
        if mv.kind != MoveKind::Slice {
            return self.rotate_guts(mv);
        }

        let [first, second] = mv.slice_expansion();
        trace!("Expanding {mv} into {first} {second}");
        self.rotate_guts(first)?;
        self.rotate_guts(second)?;
        self.solution.pop();
        self.solution.pop();
        self.solution.push_move(mv);
        Ok(())
    }

    /// # Errors
    ///
    /// The first move that fails to apply. Earlier moves stay applied.
    pub fn rotate_moves(&mut self, moves: &[Move]) -> Result<()> {
        moves.iter().try_for_each(|mv| self.rotate(*mv))
    }

    /// Parses and applies a whitespace separated sequence.
    ///
    /// # Errors
    ///
    /// `CubeError::InvalidMove` for the first token that doesn't parse or
    /// doesn't fit this cube; nothing is applied in that case.
    pub fn rotate_str(&mut self, seq: &str) -> Result<()> {
        let moves = parse_moves(seq)?;
        moves.iter().try_for_each(|mv| mv.validate(self.size()))?;
        self.rotate_moves(&moves)
    }

    pub(crate) fn rotate_x(&mut self) -> Result<()> {
        self.rotate_guts(Move::rotation(Face::R, Turn::Clockwise))
    }

    pub(crate) fn rotate_y(&mut self) -> Result<()> {
        self.rotate_guts(Move::rotation(Face::U, Turn::Clockwise))
    }

    pub(crate) fn rotate_z(&mut self) -> Result<()> {
        self.rotate_guts(Move::rotation(Face::F, Turn::Clockwise))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::{random_moves, reverse_steps};

    fn every_token(size: usize) -> Vec<Move> {
        let mut moves = vec![];
        for face in Face::ALL {
            for turn in [Turn::Clockwise, Turn::CounterClockwise, Turn::Half] {
                for width in 1..=size {
                    moves.push(Move::new(face, width, turn));
                }
                for layer in 2..size {
                    moves.push(Move::slice(face, layer, turn));
                }
                if matches!(face, Face::R | Face::U | Face::F) {
                    moves.push(Move::rotation(face, turn));
                }
            }
        }
        moves
    }

    #[test]
    fn move_then_inverse_is_identity() {
        for size in 2..=8 {
            let mut rng = fastrand::Rng::with_seed(size as u64);
            let mut cube = Cube::new(size).unwrap();
            cube.rotate_moves(&random_moves(size, 30, &mut rng)).unwrap();
            for mv in every_token(size) {
                let before = cube.state().to_vec();
                cube.rotate(mv).unwrap();
                cube.rotate(mv.inverse()).unwrap();
                assert_eq!(cube.state(), before.as_slice(), "{mv} on {size}");
            }
        }
    }

    #[test]
    fn four_quarter_turns_are_identity() {
        let mut cube = Cube::new(5).unwrap();
        cube.rotate_str("R U2 3Fw' 2B").unwrap();
        let before = cube.state().to_vec();
        for token in ["U", "3Lw", "2F", "x", "5Dw"] {
            let mv: Move = token.parse().unwrap();
            for _ in 0..4 {
                cube.rotate(mv).unwrap();
            }
            assert_eq!(cube.state(), before.as_slice(), "{token}");
        }
    }

    #[test]
    fn face_turns_on_3x3() {
        let mut cube = Cube::new(3).unwrap();
        cube.rotate_str("U").unwrap();
        assert_eq!(
            cube.state_string(),
            "UUUUUUUUUFFFLLLLLLRRRFFFFFFBBBRRRRRRLLLBBBBBBDDDDDDDDD"
        );

        let mut cube = Cube::new(3).unwrap();
        cube.rotate_str("R").unwrap();
        assert_eq!(
            cube.state_string(),
            "UUFUUFUUFLLLLLLLLLFFDFFDFFDRRRRRRRRRUBBUBBUBBDDBDDBDDB"
        );

        let mut cube = Cube::new(3).unwrap();
        cube.rotate_str("F").unwrap();
        assert_eq!(
            cube.state_string(),
            "UUUUUULLLLLDLLDLLDFFFFFFFFFURRURRURRBBBBBBBBBRRRDDDDDD"
        );
    }

    #[test]
    fn whole_cube_turn_matches_rotation() {
        let mut rng = fastrand::Rng::with_seed(11);
        let scramble = random_moves(4, 25, &mut rng);

        let mut a = Cube::new(4).unwrap();
        a.rotate_moves(&scramble).unwrap();
        a.rotate_str("x").unwrap();

        let mut b = Cube::new(4).unwrap();
        b.rotate_moves(&scramble).unwrap();
        b.rotate_str("4Rw").unwrap();

        let mut c = Cube::new(4).unwrap();
        c.rotate_moves(&scramble).unwrap();
        c.rotate_str("R 2R 3R L'").unwrap();

        assert_eq!(a.state(), b.state());
        assert_eq!(a.state(), c.state());
    }

    #[test]
    fn slice_moves_log_as_one_token() {
        let mut cube = Cube::new(5).unwrap();
        cube.rotate_str("U 2R' 3F2 Rw").unwrap();
        assert_eq!(cube.solution().to_string(), "U 2R' 3F2 Rw");
    }

    #[test]
    fn slice_leaves_outer_layers_alone() {
        let mut cube = Cube::new(4).unwrap();
        cube.rotate_str("2U").unwrap();
        for col in 0..4 {
            assert_eq!(cube.state()[cube.pos(Face::F, 0, col)], b'F');
            assert_eq!(cube.state()[cube.pos(Face::F, 1, col)], b'R');
        }
        assert!(cube.side_solved(Face::U));
        assert!(cube.side_solved(Face::D));
    }

    #[test]
    fn scramble_then_reverse_is_solved() {
        for size in 2..=7 {
            let mut rng = fastrand::Rng::with_seed(100 + size as u64);
            for _ in 0..10 {
                let scramble = random_moves(size, 50, &mut rng);
                let mut cube = Cube::new(size).unwrap();
                cube.rotate_moves(&scramble).unwrap();
                cube.rotate_moves(&reverse_steps(&scramble)).unwrap();
                assert!(cube.solved());
            }
        }
    }

    #[test]
    fn wings_stay_together() {
        // A wing is two facelets; moves must carry both to another wing slot.
        let mut rng = fastrand::Rng::with_seed(3);
        for size in 3..=6 {
            let mut cube = Cube::new(size).unwrap();
            cube.rotate_moves(&random_moves(size, 40, &mut rng)).unwrap();
            for side in cube.sides() {
                for position in side.edge_pos() {
                    let a = Face::from_label(cube.state()[position]).unwrap();
                    let partner = cube.wing_partner(position).unwrap();
                    let b = Face::from_label(cube.state()[partner]).unwrap();
                    assert_ne!(a, b);
                    assert_ne!(a.opposite(), b);
                }
            }
        }
    }

    #[test]
    fn rejects_bad_moves() {
        let mut cube = Cube::new(3).unwrap();
        assert!(cube.rotate_str("4Uw").is_err());
        assert!(cube.rotate_str("3U").is_err());
        assert!(cube.rotate_guts(Move::slice(Face::U, 2, Turn::Clockwise)).is_err());
        assert!(cube.solution().is_empty());
    }

    #[test]
    fn bad_sequence_applies_nothing() {
        let mut cube = Cube::new(3).unwrap();
        assert!(matches!(cube.rotate_str("R U 4Uw F"), Err(CubeError::InvalidMove(_))));
        assert!(matches!(cube.rotate_str("R U 2Q"), Err(CubeError::InvalidMove(_))));
        assert!(cube.solved());
        assert!(cube.solution().is_empty());
    }
}
