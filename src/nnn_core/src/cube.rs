use std::fmt::{self, Write as _};

use fxhash::FxHashMap;
use itertools::Itertools;
use log::{error, warn};
use owo_colors::{AnsiColors, OwoColorize};

use crate::{
    config::Config,
    engine::{Strips, build_strips},
    errors::{CubeError, Result},
    face::Face,
    side::{EdgeDir, Side},
    solution::Solution,
};

/// Labels that stand for "don't care" in masked states and lookup table keys.
pub const FILLERS: [u8; 2] = [b'x', b'.'];

/// Set on a facelet label to follow it through a sequence of moves.
pub(crate) const MARKER: u8 = 0x80;

/// Face orderings that `load_state` understands.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FaceOrder {
    /// U, L, F, R, B, D, the order the facelet array is stored in.
    Ulfrbd,
    /// U, R, F, D, L, B, the order kociemba uses.
    Urfdlb,
}

impl FaceOrder {
    #[must_use]
    pub fn faces(self) -> [Face; 6] {
        match self {
            FaceOrder::Ulfrbd => Face::ALL,
            FaceOrder::Urfdlb => Face::KOCIEMBA_ORDER,
        }
    }
}

/// A full copy of everything a move can change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    state: Vec<u8>,
    solution: Solution,
}

/// An NxNxN cube as a flat array of facelet labels.
///
/// Index 0 is unused so that positions read the same as in most published
/// lookup tables. Face `f`, row `r`, column `c` lives at
/// `f*N*N + r*N + c + 1` with faces stored U, L, F, R, B, D.
#[derive(Debug, Clone)]
pub struct Cube {
    size: usize,
    pub(crate) state: Vec<u8>,
    pub(crate) solution: Solution,
    sides: [Side; 6],
    pub(crate) strips: Strips,
    pub(crate) max_loop_iterations: usize,
}

impl Cube {
    /// A solved cube.
    ///
    /// # Errors
    ///
    /// Cubes smaller than 2x2x2 don't exist.
    pub fn new(size: usize) -> Result<Self> {
        if size < 2 {
            return Err(CubeError::InvalidState(format!("cube size {size} is too small")));
        }
        Ok(Cube::build(size))
    }

    /// `new` for sizes known to be valid.
    pub(crate) fn build(size: usize) -> Self {
        let mut sides = Face::ALL.map(|face| Side::new(face, size));
        for (a, b) in wing_partner_pairs(&sides) {
            sides[face_of(size, a).index()].wing_partner.insert(a, b);
            sides[face_of(size, b).index()].wing_partner.insert(b, a);
        }

        let mut state = Vec::with_capacity(6 * size * size + 1);
        state.push(b'.');
        for face in Face::ALL {
            state.extend(std::iter::repeat_n(face.label(), size * size));
        }

        Cube {
            size,
            state,
            solution: Solution::default(),
            sides,
            strips: build_strips(size),
            max_loop_iterations: 30,
        }
    }

    /// Like `new`, but takes the loop cap from `config` and warns when the
    /// caller already holds `live_instances` cubes and that exceeds the
    /// configured limit.
    ///
    /// # Errors
    ///
    /// See `Cube::new`.
    pub fn with_config(size: usize, config: &Config, live_instances: usize) -> Result<Self> {
        if live_instances >= config.max_instances {
            warn!(
                "Creating cube number {} while the limit is {}",
                live_instances + 1,
                config.max_instances
            );
        }
        let mut cube = Cube::new(size)?;
        cube.max_loop_iterations = config.max_loop_iterations;
        Ok(cube)
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn squares_per_side(&self) -> usize {
        self.size * self.size
    }

    #[must_use]
    pub fn state(&self) -> &[u8] {
        &self.state
    }

    #[must_use]
    pub fn solution(&self) -> &Solution {
        &self.solution
    }

    pub fn solution_mut(&mut self) -> &mut Solution {
        &mut self.solution
    }

    #[must_use]
    pub fn side(&self, face: Face) -> &Side {
        &self.sides[face.index()]
    }

    #[must_use]
    pub fn sides(&self) -> &[Side; 6] {
        &self.sides
    }

    #[must_use]
    pub fn pos(&self, face: Face, row: usize, col: usize) -> usize {
        face.index() * self.squares_per_side() + row * self.size + col + 1
    }

    /// The side that owns `position`.
    ///
    /// # Errors
    ///
    /// `CubeError::Unreachable` when `position` is the sentinel or past the
    /// end of the array.
    pub fn get_side_for_index(&self, position: usize) -> Result<&Side> {
        if position == 0 || position >= self.state.len() {
            return Err(CubeError::Unreachable(format!(
                "position {position} is not on a {0}x{0}x{0}",
                self.size
            )));
        }
        Ok(&self.sides[(position - 1) / self.squares_per_side()])
    }

    /// The cross-face partner of an edge position.
    ///
    /// # Errors
    ///
    /// `CubeError::Unreachable` for positions that are not on an edge.
    pub fn wing_partner(&self, position: usize) -> Result<usize> {
        self.get_side_for_index(position)?
            .get_wing_partner(position)
            .ok_or_else(|| CubeError::Unreachable(format!("{position} is not an edge position")))
    }

    /// Replaces the state with `raw`, given in `order`, and clears the
    /// solution.
    ///
    /// # Errors
    ///
    /// `CubeError::InvalidState` when the length is wrong or a label is not a
    /// face or filler.
    pub fn load_state(&mut self, raw: &str, order: FaceOrder) -> Result<()> {
        let raw = raw.trim().as_bytes();
        let per_side = self.squares_per_side();
        if raw.len() != 6 * per_side {
            return Err(CubeError::InvalidState(format!(
                "expected {} facelets but got {}",
                6 * per_side,
                raw.len()
            )));
        }
        if let Some(bad) = raw
            .iter()
            .find(|label| Face::from_label(**label).is_none() && !FILLERS.contains(label))
        {
            return Err(CubeError::InvalidState(format!(
                "unknown facelet label {:?}",
                char::from(*bad)
            )));
        }

        for (face, chunk) in order.faces().into_iter().zip(raw.chunks_exact(per_side)) {
            let start = face.index() * per_side + 1;
            self.state[start..start + per_side].copy_from_slice(chunk);
        }
        self.solution.clear();
        Ok(())
    }

    /// All facelets in U, L, F, R, B, D order without the sentinel.
    #[must_use]
    pub fn state_string(&self) -> String {
        self.state[1..].iter().map(|label| char::from(*label)).collect()
    }

    /// All facelets in `order`.
    #[must_use]
    pub fn state_string_in(&self, order: FaceOrder) -> String {
        let per_side = self.squares_per_side();
        order
            .faces()
            .into_iter()
            .flat_map(|face| {
                let start = face.index() * per_side + 1;
                self.state[start..start + per_side].iter()
            })
            .map(|label| char::from(*label))
            .collect()
    }

    /// The labels at `positions`, the usual shape of a lookup table key.
    #[must_use]
    pub fn state_key(&self, positions: &[usize]) -> String {
        positions
            .iter()
            .map(|position| char::from(self.state[*position]))
            .collect()
    }

    /// The whole cube with every label outside `keep` replaced by `filler`.
    #[must_use]
    pub fn masked_state(&self, keep: &[u8], filler: u8) -> String {
        self.state[1..]
            .iter()
            .map(|label| {
                if keep.contains(label) {
                    char::from(*label)
                } else {
                    char::from(filler)
                }
            })
            .collect()
    }

    /// Checks that every face label appears exactly N*N times.
    ///
    /// # Errors
    ///
    /// See `sanity_check_at`.
    pub fn sanity_check(&self) -> Result<()> {
        let positions = (1..self.state.len()).collect_vec();
        self.sanity_check_at(&positions, self.squares_per_side())
    }

    /// Checks that every face label occurs `expected` times among
    /// `positions`. Fillers are not counted.
    ///
    /// # Errors
    ///
    /// `CubeError::InvalidCubeReduction` naming the first label that is off.
    /// The cube is logged before returning.
    pub fn sanity_check_at(&self, positions: &[usize], expected: usize) -> Result<()> {
        let mut counts: FxHashMap<u8, usize> = FxHashMap::default();
        for position in positions {
            let label = self.state[*position];
            if !FILLERS.contains(&label) {
                *counts.entry(label).or_default() += 1;
            }
        }

        for face in Face::ALL {
            let actual = counts.get(&face.label()).copied().unwrap_or(0);
            if actual != expected {
                error!("Sanity check failed for {face}, cube is:\n{self}");
                return Err(CubeError::InvalidCubeReduction {
                    label: char::from(face.label()),
                    expected,
                    actual,
                });
            }
        }

        if let Some(stray) = counts.keys().find(|label| Face::from_label(**label).is_none()) {
            error!("Sanity check failed, cube is:\n{self}");
            return Err(CubeError::InvalidCubeReduction {
                label: char::from(*stray & !MARKER),
                expected: 0,
                actual: counts[stray],
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn side_solved(&self, face: Face) -> bool {
        let side = self.side(face);
        let first = self.state[side.min_pos];
        self.state[side.min_pos..=side.max_pos]
            .iter()
            .all(|label| *label == first)
    }

    #[must_use]
    pub fn solved(&self) -> bool {
        Face::ALL.into_iter().all(|face| self.side_solved(face))
    }

    #[must_use]
    pub fn centers_solved(&self) -> bool {
        self.sides.iter().all(|side| {
            side.center_pos
                .iter()
                .map(|position| self.state[*position])
                .all_equal()
        })
    }

    /// True when every wing on `dir` of `face` matches its neighbour, which is
    /// what paired means for a single edge.
    #[must_use]
    pub fn edge_paired(&self, face: Face, dir: EdgeDir) -> bool {
        let side = self.side(face);
        side.edge(dir)
            .iter()
            .map(|position| {
                let partner = side.get_wing_partner(*position).unwrap_or(*position);
                (self.state[*position], self.state[partner])
            })
            .all_equal()
    }

    #[must_use]
    pub fn edges_paired(&self) -> bool {
        Face::ALL
            .into_iter()
            .all(|face| EdgeDir::ALL.into_iter().all(|dir| self.edge_paired(face, dir)))
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state.clone(),
            solution: self.solution.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.state = snapshot.state;
        self.solution = snapshot.solution;
    }

    /// Runs `probe` and then puts the state and solution back the way they
    /// were, whether `probe` succeeded or not.
    ///
    /// # Errors
    ///
    /// Whatever `probe` returns.
    pub fn with_probe<T>(&mut self, probe: impl FnOnce(&mut Cube) -> Result<T>) -> Result<T> {
        let snapshot = self.snapshot();
        let result = probe(self);
        self.restore(snapshot);
        result
    }

    /// The unfolded net with ANSI colors, for terminals.
    #[must_use]
    pub fn colored_net(&self) -> String {
        self.render(true)
    }

    fn render(&self, colored: bool) -> String {
        let size = self.size;
        let mut out = String::new();
        let cell = |out: &mut String, position: usize| {
            let label = self.state[position];
            let text = char::from(label & !MARKER);
            let marked = if label & MARKER == 0 { ' ' } else { '*' };
            if colored {
                let color = match Face::from_label(label & !MARKER) {
                    Some(Face::U) => AnsiColors::White,
                    Some(Face::L) => AnsiColors::Magenta,
                    Some(Face::F) => AnsiColors::Green,
                    Some(Face::R) => AnsiColors::Red,
                    Some(Face::B) => AnsiColors::Blue,
                    Some(Face::D) => AnsiColors::Yellow,
                    None => AnsiColors::Default,
                };
                let _ = write!(out, "{}{marked}", text.color(color).bold());
            } else {
                let _ = write!(out, "{text}{marked}");
            }
        };
        let indent = " ".repeat(2 * size);

        for row in 0..size {
            out.push_str(&indent);
            for col in 0..size {
                cell(&mut out, self.pos(Face::U, row, col));
            }
            out.push('\n');
        }
        for row in 0..size {
            for face in [Face::L, Face::F, Face::R, Face::B] {
                for col in 0..size {
                    cell(&mut out, self.pos(face, row, col));
                }
            }
            out.push('\n');
        }
        for row in 0..size {
            out.push_str(&indent);
            for col in 0..size {
                cell(&mut out, self.pos(Face::D, row, col));
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Cube {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

fn face_of(size: usize, position: usize) -> Face {
    Face::ALL[(position - 1) / (size * size)]
}

/// Every pair of facelets that meet across an edge, read off the twelve edges
/// of the cube. Each edge is listed once from the side that sorts first.
fn wing_partner_pairs(sides: &[Side; 6]) -> Vec<(usize, usize)> {
    use EdgeDir::{East, North, South, West};
    use Face::{B, D, F, L, R, U};

    let edge = |face: Face, dir: EdgeDir| sides[face.index()].edge(dir).to_vec();
    let reversed = |face: Face, dir: EdgeDir| {
        let mut positions = edge(face, dir);
        positions.reverse();
        positions
    };

    let edges = [
        (edge(U, North), reversed(B, North)),
        (edge(U, West), edge(L, North)),
        (edge(U, South), edge(F, North)),
        (edge(U, East), reversed(R, North)),
        (edge(F, West), edge(L, East)),
        (edge(F, East), edge(R, West)),
        (edge(F, South), edge(D, North)),
        (edge(L, West), edge(B, East)),
        (edge(L, South), reversed(D, West)),
        (edge(R, South), edge(D, East)),
        (edge(R, East), edge(B, West)),
        (reversed(B, South), edge(D, South)),
    ];

    edges
        .into_iter()
        .flat_map(|(a, b)| a.into_iter().zip(b))
        .collect()
}
