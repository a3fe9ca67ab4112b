#![warn(clippy::pedantic)]

use std::time::Instant;

use itertools::Itertools;
use log::{Level, debug, info, log_enabled};
use lookup_table::{Heuristic, LookupError};
use nnn_core::{Cube, CubeError, Face, Move, Turn, start, success, working};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("No solution within {0} moves")]
    MaxDepthExceeded(usize),
    #[error("Heuristic failed: {0}")]
    Heuristic(#[from] LookupError),
    #[error("Could not apply a move: {0}")]
    Cube(#[from] CubeError),
}

/// What a subtree reported back.
enum Outcome {
    Found,
    /// The smallest cost bound that got pruned, the next threshold to try.
    Pruned(usize),
}

/// Iterative deepening A* over a set of moves on a `Cube`.
///
/// The heuristic must never overestimate the number of moves left, otherwise
/// the solutions are still valid but no longer the shortest.
pub struct IdaSearch<'a, H: Heuristic<Cube>> {
    moves: Vec<Move>,
    heuristic: H,
    is_goal: Box<dyn Fn(&Cube) -> bool + 'a>,
    max_depth: usize,
    nodes_visited: u64,
}

/// The eighteen outer face turns.
#[must_use]
pub fn outer_turns() -> Vec<Move> {
    Face::ALL
        .into_iter()
        .cartesian_product([Turn::Clockwise, Turn::CounterClockwise, Turn::Half])
        .map(|(face, turn)| Move::outer(face, turn))
        .collect()
}

impl<'a, H: Heuristic<Cube>> IdaSearch<'a, H> {
    pub fn new(moves: Vec<Move>, heuristic: H, is_goal: impl Fn(&Cube) -> bool + 'a) -> Self {
        IdaSearch {
            moves,
            heuristic,
            is_goal: Box::new(is_goal),
            max_depth: 20,
            nodes_visited: 0,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn nodes_visited(&self) -> u64 {
        self.nodes_visited
    }

    pub fn into_heuristic(self) -> H {
        self.heuristic
    }

    /// Whether `mv` may follow `last`. Turns about the same axis commute, so
    /// a run of them is only searched in one order. Two turns of the same
    /// layers always collapse into one, so they never follow each other.
    fn allowed_after(last: Option<Move>, mv: Move) -> bool {
        let Some(last) = last else {
            return true;
        };
        if last.face != mv.face && last.face.opposite() != mv.face {
            return true;
        }
        Self::axis_order(mv) > Self::axis_order(last)
    }

    fn axis_order(mv: Move) -> (usize, u8, usize) {
        (mv.face.index(), mv.kind as u8, mv.width)
    }

    fn search(
        &mut self,
        cube: &mut Cube,
        path: &mut Vec<Move>,
        cost: usize,
        threshold: usize,
    ) -> Result<Outcome, SearchError> {
        if log_enabled!(Level::Debug) {
            self.nodes_visited += 1;
        }
        let estimate = cost + usize::from(self.heuristic.heuristic(cube)?);
        if estimate > threshold {
            return Ok(Outcome::Pruned(estimate));
        }
        if (self.is_goal)(cube) {
            return Ok(Outcome::Found);
        }

        let mut next = usize::MAX;
        let log_len = cube.solution().len();
        for index in 0..self.moves.len() {
            let mv = self.moves[index];
            if !Self::allowed_after(path.last().copied(), mv) {
                continue;
            }

            cube.rotate(mv)?;
            path.push(mv);
            match self.search(cube, path, cost + 1, threshold)? {
                Outcome::Found => return Ok(Outcome::Found),
                Outcome::Pruned(bound) => next = next.min(bound),
            }
            path.pop();
            cube.rotate(mv.inverse())?;
            cube.solution_mut().truncate(log_len);
        }
        Ok(Outcome::Pruned(next))
    }

    /// Finds a sequence of moves that takes `cube` to a goal state. The cube
    /// is left as it was.
    ///
    /// # Errors
    ///
    /// `SearchError::MaxDepthExceeded` when no solution is within the depth
    /// limit, or whatever the heuristic fails with.
    pub fn solve(&mut self, cube: &mut Cube) -> Result<Vec<Move>, SearchError> {
        info!(start!("Searching with IDA*"));
        let start = Instant::now();
        let snapshot = cube.snapshot();
        let result = self.solve_inner(cube);
        cube.restore(snapshot);

        if let Ok(moves) = &result {
            info!(
                success!("Found {} ({} moves) in {:.3}s"),
                nnn_core::moves_to_string(moves),
                moves.len(),
                start.elapsed().as_secs_f64()
            );
        }
        result
    }

    fn solve_inner(&mut self, cube: &mut Cube) -> Result<Vec<Move>, SearchError> {
        self.nodes_visited = 0;
        let mut threshold = usize::from(self.heuristic.heuristic(cube)?);
        let mut path = vec![];

        while threshold <= self.max_depth {
            debug!(working!("Searching depth {}..."), threshold);
            let depth_start = Instant::now();
            let outcome = self.search(cube, &mut path, 0, threshold)?;
            debug!(
                working!("Traversed {} nodes in {:.3}s"),
                self.nodes_visited,
                depth_start.elapsed().as_secs_f64()
            );
            match outcome {
                Outcome::Found => return Ok(path),
                // Nothing was pruned so no deeper threshold can help
                Outcome::Pruned(usize::MAX) => break,
                Outcome::Pruned(bound) => threshold = bound,
            }
        }
        Err(SearchError::MaxDepthExceeded(self.max_depth))
    }
}
