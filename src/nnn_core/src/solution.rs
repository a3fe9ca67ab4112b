use std::fmt;

use itertools::Itertools;
use log::debug;

use crate::{
    face::Face,
    moves::{Move, MoveKind, Turn},
};

pub const CENTERS_SOLVED: &str = "CENTERS_SOLVED";
pub const EDGES_GROUPED: &str = "EDGES_GROUPED";
pub const REDUCED_TO_333: &str = "REDUCED_TO_333";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Move(Move),
    /// Marks the end of a solving phase so per-phase move counts can be
    /// reported once the solution is compressed.
    Marker(String),
}

/// How many moves each phase of a compressed solution took.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseStats {
    /// Whole cube rotations that were folded into the following moves.
    pub rotations_removed: usize,
    /// `(marker, moves since the previous marker)` in solution order.
    pub phases: Vec<(String, usize)>,
    /// Moves after the last marker.
    pub remaining: usize,
}

impl PhaseStats {
    #[must_use]
    pub fn total(&self) -> usize {
        self.phases.iter().map(|(_, count)| count).sum::<usize>() + self.remaining
    }
}

/// The log of everything done to a cube. Only the move engine appends moves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Solution {
    steps: Vec<Step>,
}

impl Solution {
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn moves(&self) -> impl Iterator<Item = Move> + '_ {
        self.steps.iter().filter_map(|step| match step {
            Step::Move(mv) => Some(*mv),
            Step::Marker(_) => None,
        })
    }

    pub(crate) fn push_move(&mut self, mv: Move) {
        self.steps.push(Step::Move(mv));
    }

    pub(crate) fn pop(&mut self) -> Option<Step> {
        self.steps.pop()
    }

    pub fn push_marker(&mut self, marker: impl Into<String>) {
        self.steps.push(Step::Marker(marker.into()));
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps, markers included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Forgets every step after the first `len`. Used to rewind the log after
    /// undoing moves during a search.
    pub fn truncate(&mut self, len: usize) {
        self.steps.truncate(len);
    }

    /// Number of moves that are not whole cube rotations.
    #[must_use]
    pub fn len_minus_rotations(&self, size: usize) -> usize {
        self.moves().filter(|mv| !mv.is_whole_cube(size)).count()
    }

    /// Removes whole cube rotations by relabelling every later move, then
    /// merges runs of moves on the same layers. Markers are kept (they block
    /// merging) and the per-phase statistics are returned.
    pub fn compress(&mut self, size: usize) -> PhaseStats {
        let before = self.moves().count();
        let mut frame = Frame::default();
        let mut rotations_removed = 0;
        let mut relabelled = Vec::with_capacity(self.steps.len());

        for step in self.steps.drain(..) {
            match step {
                Step::Marker(_) => relabelled.push(step),
                Step::Move(mv) if mv.is_whole_cube(size) => {
                    frame.rotate(mv);
                    rotations_removed += 1;
                }
                Step::Move(mv) => relabelled.push(Step::Move(Move {
                    face: frame.original(mv.face),
                    ..mv
                })),
            }
        }

        let mut merged: Vec<Step> = Vec::with_capacity(relabelled.len());
        for step in relabelled {
            let Step::Move(mv) = step else {
                merged.push(step);
                continue;
            };
            match merged.last_mut() {
                Some(Step::Move(last)) if same_layers(*last, mv) => {
                    match Turn::from_quarters(last.turn.quarters() + mv.turn.quarters()) {
                        Some(turn) => last.turn = turn,
                        None => {
                            merged.pop();
                        }
                    }
                }
                _ => merged.push(Step::Move(mv)),
            }
        }
        self.steps = merged;

        let stats = self.phase_stats(rotations_removed);
        debug!(
            "Compressed solution from {before} to {} moves, {rotations_removed} rotations removed",
            stats.total()
        );
        stats
    }

    fn phase_stats(&self, rotations_removed: usize) -> PhaseStats {
        let mut stats = PhaseStats {
            rotations_removed,
            ..PhaseStats::default()
        };
        let mut count = 0;
        for step in &self.steps {
            match step {
                Step::Move(_) => count += 1,
                Step::Marker(marker) => {
                    stats.phases.push((marker.clone(), count));
                    count = 0;
                }
            }
        }
        stats.remaining = count;
        stats
    }

    /// Renders moves and markers, markers in brackets.
    #[must_use]
    pub fn with_markers(&self) -> String {
        self.steps
            .iter()
            .map(|step| match step {
                Step::Move(mv) => mv.to_string(),
                Step::Marker(marker) => format!("[{marker}]"),
            })
            .join(" ")
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.moves().join(" "))
    }
}

fn same_layers(a: Move, b: Move) -> bool {
    a.face == b.face && a.kind == b.kind && a.width == b.width && a.kind != MoveKind::Rotation
}

/// Tracks, for every face position, which face of the unrotated cube is
/// currently sitting there.
#[derive(Debug, Clone, Copy)]
struct Frame([Face; 6]);

impl Default for Frame {
    fn default() -> Self {
        Frame(Face::ALL)
    }
}

impl Frame {
    fn original(self, position: Face) -> Face {
        self.0[position.index()]
    }

    fn rotate(&mut self, mv: Move) {
        // Width-N turns of D, L and B are y', x' and z'
        let (axis, quarters) = match mv.face {
            Face::U | Face::R | Face::F => (mv.face, mv.turn.quarters()),
            Face::D | Face::L | Face::B => (mv.face.opposite(), mv.turn.inverse().quarters()),
        };
        for _ in 0..quarters {
            let before = *self;
            for position in Face::ALL {
                self.0[position.index()] = before.original(comes_from(axis, position));
            }
        }
    }
}

/// For a clockwise quarter rotation about `axis`, the position whose contents
/// end up at `position`.
fn comes_from(axis: Face, position: Face) -> Face {
    use Face::*;
    match (axis, position) {
        (U, L) => F,
        (U, F) => R,
        (U, R) => B,
        (U, B) => L,
        (R, U) => F,
        (R, F) => D,
        (R, D) => B,
        (R, B) => U,
        (F, U) => L,
        (F, L) => D,
        (F, D) => R,
        (F, R) => U,
        _ => position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::parse_moves;

    fn solution_of(seq: &str) -> Solution {
        let mut solution = Solution::default();
        for mv in parse_moves(seq).unwrap() {
            solution.push_move(mv);
        }
        solution
    }

    #[test]
    fn merges_and_cancels() {
        let mut solution = solution_of("U U' R R F2 F2 L L L B Rw Rw' 2U 2U");
        let stats = solution.compress(4);
        assert_eq!(solution.to_string(), "R2 L' B 2U2");
        assert_eq!(stats.remaining, 4);
        assert_eq!(stats.rotations_removed, 0);
    }

    #[test]
    fn cascading_cancellation() {
        let mut solution = solution_of("R U F F' U' R");
        solution.compress(3);
        assert_eq!(solution.to_string(), "R2");
    }

    #[test]
    fn rotations_relabel_following_moves() {
        let mut solution = solution_of("y F x F 3Uw R");
        let stats = solution.compress(3);
        // After y the front is the old right. After x the front is the old
        // down and the right is the old back. 3Uw on a 3x3x3 is another y,
        // which brings the old up to the right.
        assert_eq!(solution.to_string(), "R D U");
        assert_eq!(stats.rotations_removed, 3);
    }

    #[test]
    fn markers_block_merging_and_count_phases() {
        let mut solution = solution_of("U R");
        solution.push_marker(CENTERS_SOLVED);
        solution.push_move("R".parse().unwrap());
        solution.push_move("F".parse().unwrap());
        solution.push_marker(EDGES_GROUPED);
        solution.push_move("F".parse().unwrap());
        let stats = solution.compress(4);
        assert_eq!(solution.to_string(), "U R R F F");
        assert_eq!(
            stats.phases,
            vec![(CENTERS_SOLVED.to_owned(), 2), (EDGES_GROUPED.to_owned(), 2)]
        );
        assert_eq!(stats.remaining, 1);
        assert_eq!(stats.total(), 5);
        assert_eq!(solution.with_markers(), "U R [CENTERS_SOLVED] R F [EDGES_GROUPED] F");
    }
}
