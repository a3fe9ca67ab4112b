use itertools::Itertools;
use log::{debug, info, warn};

use crate::{
    cube::{Cube, MARKER},
    edge_slots::{
        EDGE_SLOTS, UF, edge_setup, oll_flip_moves, pll_setup, pll_swap_moves, slot_index,
        wing_str,
    },
    errors::{CubeError, Result},
    face::Face,
    moves::reverse_steps,
    start, success,
};

const NEEDED_CORNERS: [&str; 8] = ["BLU", "BRU", "FLU", "FRU", "DFL", "DFR", "BDL", "BDR"];

/// Sorts `current` into `needed` with left to right transpositions and returns
/// how many were needed. Repeated symbols are allowed; each mismatch is fixed
/// with the nearest matching symbol to its right.
///
/// # Errors
///
/// `CubeError::SolveError` if the lengths differ or `current` is missing a
/// symbol that `needed` has.
pub fn get_swap_count<T: PartialEq + Clone + std::fmt::Debug>(
    needed: &[T],
    current: &[T],
) -> Result<usize> {
    if needed.len() != current.len() {
        return Err(CubeError::SolveError(format!(
            "needed has {} entries but current has {}",
            needed.len(),
            current.len()
        )));
    }

    let mut current = current.to_vec();
    let mut swaps = 0;
    for i in 0..needed.len() {
        if current[i] == needed[i] {
            continue;
        }
        let j = (i + 1..current.len())
            .find(|j| current[*j] == needed[i])
            .ok_or_else(|| {
                CubeError::SolveError(format!(
                    "could not find {:?} after index {i} in {current:?}",
                    needed[i]
                ))
            })?;
        current.swap(i, j);
        swaps += 1;
    }
    Ok(swaps)
}

/// Whether wing `index` of an edge belongs to `orbit`. Orbit 0 is the pair of
/// wings next to the corners, orbit 1 the next pair in, and so on. `None`
/// matches every wing.
#[must_use]
pub fn orbit_matches(edges_per_side: usize, orbit: Option<usize>, index: usize) -> bool {
    match orbit {
        None => true,
        Some(orbit) => index == orbit || index + orbit + 1 == edges_per_side,
    }
}

impl Cube {
    fn corner_positions(&self) -> [[usize; 3]; 8] {
        let c = |face: Face, index: usize| self.side(face).corner_pos[index];
        use Face::{B, D, F, L, R, U};
        [
            [c(U, 0), c(L, 0), c(B, 1)],
            [c(U, 1), c(R, 1), c(B, 0)],
            [c(U, 2), c(L, 1), c(F, 0)],
            [c(U, 3), c(F, 1), c(R, 0)],
            [c(D, 0), c(L, 3), c(F, 2)],
            [c(D, 1), c(F, 3), c(R, 2)],
            [c(D, 2), c(L, 2), c(B, 3)],
            [c(D, 3), c(R, 3), c(B, 2)],
        ]
    }

    /// Transpositions needed to sort the eight corners.
    ///
    /// # Errors
    ///
    /// `CubeError::SolveError` if the corners are not a permutation of the
    /// solved corners.
    pub fn get_corner_swap_count(&self) -> Result<usize> {
        let current = self
            .corner_positions()
            .iter()
            .map(|positions| {
                positions
                    .iter()
                    .map(|position| char::from(self.state[*position] & !MARKER))
                    .sorted()
                    .collect::<String>()
            })
            .collect_vec();
        let needed = NEEDED_CORNERS.map(str::to_owned);
        get_swap_count(&needed, &current)
    }

    /// Transpositions needed to sort the edges.
    ///
    /// With `edges_paired` only the first wing of every slot is looked at,
    /// otherwise every wing in `orbit` (or every wing when `orbit` is `None`)
    /// is identified individually. Wings of the same colors are told apart by
    /// carrying them home and seeing which end of the home edge they land on.
    /// The cube is left exactly as it was.
    ///
    /// # Errors
    ///
    /// `CubeError::SolveError` for a wing made of two faces that can't be
    /// adjacent, or when asked for an orbit of paired edges.
    pub fn get_edge_swap_count(
        &mut self,
        edges_paired: bool,
        orbit: Option<usize>,
        debug: bool,
    ) -> Result<usize> {
        if edges_paired && orbit.is_some() {
            return Err(CubeError::SolveError(format!(
                "edges_paired is true and orbit is {orbit:?}"
            )));
        }

        let edges_per_side = self.size().saturating_sub(2);
        let mut needed = vec![];
        let mut to_check = vec![];
        for slot in &EDGE_SLOTS {
            for (index, position) in self.slot_positions(slot).into_iter().enumerate() {
                if edges_paired {
                    needed.push(slot.name.to_owned());
                    to_check.push(position);
                    break;
                }
                if orbit_matches(edges_per_side, orbit, index) {
                    needed.push(format!("{}{index}", slot.name));
                    to_check.push(position);
                }
            }
        }

        let mut current = Vec::with_capacity(to_check.len());
        for position in &to_check {
            let wing = self.identify_wing(*position, edges_paired)?;
            current.push(wing);
        }

        if debug {
            info!("to_check     : {}", to_check.iter().join(" "));
            info!("needed edges : {}", needed.join(" "));
            info!("current edges: {}", current.join(" "));
        }
        get_swap_count(&needed, &current)
    }

    /// Names the wing at `position`: its edge, plus with `!edges_paired` the
    /// index it has when sitting in its home slot.
    fn identify_wing(&mut self, position: usize, edges_paired: bool) -> Result<String> {
        let partner = self.wing_partner(position)?;
        let (label, partner_label) = (self.state[position], self.state[partner]);
        let name = wing_str(label, partner_label).ok_or_else(|| {
            CubeError::SolveError(format!(
                "could not determine wing_str for ({}, {})",
                char::from(label),
                char::from(partner_label)
            ))
        })?;
        if edges_paired {
            return Ok(name.to_owned());
        }

        let target_index = slot_index(name)
            .ok_or_else(|| CubeError::Unreachable(format!("no slot named {name}")))?;
        let target = EDGE_SLOTS[target_index];
        let side = self.get_side_for_index(position)?;
        let (face, dir) = side
            .edge_dir_of(position)
            .map(|dir| (side.face, dir))
            .ok_or_else(|| CubeError::Unreachable(format!("{position} is not on an edge")))?;
        let setup = edge_setup(face, dir, target_index).ok_or_else(|| {
            CubeError::Unreachable(format!("no way to move {face} {dir:?} to {name}"))
        })?;

        self.with_probe(|cube| {
            cube.state[position] |= MARKER;
            cube.state[partner] |= MARKER;
            for mv in setup {
                cube.rotate_guts(*mv)?;
            }

            let home = cube.slot_positions(&target);
            let max_index = home.len() - 1;
            let (index, marked) = home
                .iter()
                .enumerate()
                .find(|(_, home_position)| cube.state[**home_position] & MARKER != 0)
                .ok_or_else(|| {
                    CubeError::SolveError(format!(
                        "could not find wing {name} ({position}, {partner}) among {home:?}"
                    ))
                })?;

            if cube.state[*marked] & !MARKER == target.face.label() {
                Ok(format!("{name}{index}"))
            } else {
                Ok(format!("{name}{}", max_index - index))
            }
        })
    }

    /// # Errors
    ///
    /// See `get_corner_swap_count`.
    pub fn corner_swaps_even(&self) -> Result<bool> {
        Ok(self.get_corner_swap_count()? % 2 == 0)
    }

    /// # Errors
    ///
    /// See `get_corner_swap_count`.
    pub fn corner_swaps_odd(&self) -> Result<bool> {
        Ok(!self.corner_swaps_even()?)
    }

    /// # Errors
    ///
    /// See `get_edge_swap_count`.
    pub fn edge_swaps_even(
        &mut self,
        edges_paired: bool,
        orbit: Option<usize>,
        debug: bool,
    ) -> Result<bool> {
        Ok(self.get_edge_swap_count(edges_paired, orbit, debug)? % 2 == 0)
    }

    /// # Errors
    ///
    /// See `get_edge_swap_count`.
    pub fn edge_swaps_odd(
        &mut self,
        edges_paired: bool,
        orbit: Option<usize>,
        debug: bool,
    ) -> Result<bool> {
        Ok(!self.edge_swaps_even(edges_paired, orbit, debug)?)
    }

    /// On a reduced cube, true when the dedge permutation and the corner
    /// permutation disagree in parity. Such a cube can't be finished with
    /// outer face turns alone.
    ///
    /// # Errors
    ///
    /// Propagates orientation and swap counting failures.
    pub fn edge_solution_leads_to_pll_parity(&mut self, debug: bool) -> Result<bool> {
        self.with_probe(|cube| {
            cube.rotate_u_to_u()?;
            cube.rotate_f_to_f()?;
            let parity = cube.edge_swaps_even(true, None, debug)? != cube.corner_swaps_even()?;
            if debug {
                if parity {
                    info!("Predict we have PLL parity");
                } else {
                    info!("Predict we are free of PLL parity");
                }
            }
            Ok(parity)
        })
    }

    /// The edge orbits whose wings are in an odd permutation. Pairing the
    /// edges of such an orbit leaves a single flipped dedge.
    ///
    /// # Errors
    ///
    /// Propagates orientation and swap counting failures.
    pub fn center_solution_leads_to_oll_parity(&mut self, debug: bool) -> Result<Vec<usize>> {
        self.with_probe(|cube| {
            cube.rotate_u_to_u()?;
            cube.rotate_f_to_f()?;
            let orbits = cube.size().saturating_sub(2) / 2;
            let mut odd = vec![];
            for orbit in 0..orbits {
                if cube.edge_swaps_odd(false, Some(orbit), debug)? {
                    odd.push(orbit);
                }
            }
            if odd.is_empty() {
                debug!("Predict we are free of OLL parity");
            } else {
                debug!("Predict OLL parity on orbits {odd:?}");
            }
            Ok(odd)
        })
    }

    /// Turns the whole cube until the side showing `label` is at `target`.
    ///
    /// # Errors
    ///
    /// `CubeError::StuckInALoop` if that never happens, which means the
    /// centers are not solved.
    pub fn rotate_side_x_to_y(&mut self, label: Face, target: Face) -> Result<()> {
        for _ in 0..self.max_loop_iterations {
            if self.state[self.side(target).reference_pos()] == label.label() {
                return Ok(());
            }
            let current = Face::ALL
                .into_iter()
                .find(|face| self.state[self.side(*face).reference_pos()] == label.label());
            let on_axis = |faces: [Face; 2]| current.is_some_and(|face| faces.contains(&face));
            match target {
                Face::U | Face::D if on_axis([Face::L, Face::R]) => self.rotate_z()?,
                Face::U | Face::D => self.rotate_x()?,
                Face::F | Face::B if on_axis([Face::U, Face::D]) => self.rotate_x()?,
                Face::F | Face::B => self.rotate_y()?,
                Face::L | Face::R if on_axis([Face::U, Face::D]) => self.rotate_z()?,
                Face::L | Face::R => self.rotate_y()?,
            }
        }
        Err(CubeError::StuckInALoop {
            what: "rotating a side into place",
            iterations: self.max_loop_iterations,
        })
    }

    /// # Errors
    ///
    /// See `rotate_side_x_to_y`.
    pub fn rotate_u_to_u(&mut self) -> Result<()> {
        self.rotate_side_x_to_y(Face::U, Face::U)
    }

    /// # Errors
    ///
    /// See `rotate_side_x_to_y`.
    pub fn rotate_f_to_f(&mut self) -> Result<()> {
        self.rotate_side_x_to_y(Face::F, Face::F)
    }

    /// Slots whose first wing does not show the slot's own two colors.
    pub(crate) fn hosed_slots(&self) -> Vec<usize> {
        EDGE_SLOTS
            .iter()
            .enumerate()
            .filter(|(_, slot)| !self.slot_home(slot.face, slot.dir))
            .map(|(index, _)| index)
            .collect()
    }

    fn slot_home(&self, face: Face, dir: crate::side::EdgeDir) -> bool {
        let side = self.side(face);
        let Some(position) = side.edge(dir).first().copied() else {
            return true;
        };
        let Some(partner) = side.get_wing_partner(position) else {
            return true;
        };
        let partner_face = (partner - 1) / self.squares_per_side();
        self.state[position] == face.label() && self.state[partner] == Face::ALL[partner_face].label()
    }

    /// Whether the dedge in `slot` is flipped relative to the slot, using the
    /// usual 3x3x3 convention: the U/D color (or F/B color when it has none)
    /// must sit on the slot's U/D facelet (or F/B facelet when it has none).
    fn dedge_misoriented(&self, slot: usize) -> Result<bool> {
        let slot = EDGE_SLOTS[slot];
        // A 2x2x2 has no wings, so nothing can be flipped
        let Some(position) = self.slot_positions(&slot).first().copied() else {
            return Ok(false);
        };
        let partner = self.wing_partner(position)?;
        let partner_face = self.get_side_for_index(partner)?.face;

        let primary = |face: Face| matches!(face, Face::U | Face::D);
        let secondary = |face: Face| matches!(face, Face::F | Face::B);
        let slot_primary = if primary(slot.face) || (!primary(partner_face) && secondary(slot.face))
        {
            position
        } else {
            partner
        };

        let label_face = |label: u8| {
            Face::from_label(label & !MARKER).ok_or_else(|| {
                CubeError::SolveError(format!("unknown label {:?}", char::from(label)))
            })
        };
        let a = label_face(self.state[position])?;
        let b = label_face(self.state[partner])?;
        let piece_primary = if primary(a) || (!primary(b) && secondary(a)) {
            a
        } else {
            b
        };
        Ok(self.state[slot_primary] & !MARKER != piece_primary.label())
    }

    /// The slots holding a flipped dedge.
    ///
    /// # Errors
    ///
    /// `CubeError::SolveError` for unknown labels.
    pub fn misoriented_dedges(&self) -> Result<Vec<usize>> {
        let mut flipped = vec![];
        for slot in 0..EDGE_SLOTS.len() {
            if self.dedge_misoriented(slot)? {
                flipped.push(slot);
            }
        }
        Ok(flipped)
    }

    /// Fixes OLL parity on a reduced even cube: while an odd number of
    /// dedges is flipped, flip one of them back in place.
    ///
    /// Returns how many corrections were applied.
    ///
    /// # Errors
    ///
    /// `CubeError::SolveError` on an odd cube with OLL parity, which means it
    /// was not reduced, and `CubeError::StuckInALoop` if the parity won't go
    /// away.
    pub fn solve_oll(&mut self) -> Result<usize> {
        if self.size() < 3 {
            return Ok(0);
        }
        info!(start!("Checking for OLL parity"));
        self.rotate_u_to_u()?;
        self.rotate_f_to_f()?;

        for fixes in 0..self.max_loop_iterations {
            let flipped = self.misoriented_dedges()?;
            if flipped.len() % 2 == 0 {
                if fixes > 0 {
                    info!(success!("Fixed OLL parity"));
                }
                return Ok(fixes);
            }
            if self.size() % 2 == 1 {
                return Err(CubeError::SolveError(format!(
                    "{} flipped dedges on an odd cube",
                    flipped.len()
                )));
            }

            let slot = EDGE_SLOTS[flipped[0]];
            warn!("OLL parity, flipping the dedge in {}", slot.name);
            let setup = edge_setup(slot.face, slot.dir, UF).ok_or_else(|| {
                CubeError::Unreachable(format!("no way to move {} to UF", slot.name))
            })?;
            let setup = setup.to_vec();
            self.rotate_moves(&setup)?;
            self.rotate_moves(&oll_flip_moves(self.size()))?;
            self.rotate_moves(&reverse_steps(&setup))?;
        }

        Err(CubeError::StuckInALoop {
            what: "fixing OLL parity",
            iterations: self.max_loop_iterations,
        })
    }

    /// Fixes PLL parity on an even cube that is solved apart from two
    /// exchanged dedges.
    ///
    /// # Errors
    ///
    /// `CubeError::Unreachable` for anything other than exactly two exchanged
    /// dedges, `CubeError::SolveError` on odd cubes.
    pub fn solve_pll(&mut self) -> Result<()> {
        self.rotate_u_to_u()?;
        self.rotate_f_to_f()?;

        let hosed = self.hosed_slots();
        let pll_id = match hosed[..] {
            [] => {
                debug!("No hosed edges, nothing to do for PLL");
                return Ok(());
            }
            [a, b] => (a, b),
            _ => {
                return Err(CubeError::Unreachable(format!(
                    "PLL with hosed edges {}",
                    hosed.iter().map(|slot| EDGE_SLOTS[*slot].name).join(" ")
                )));
            }
        };
        if self.size() % 2 == 1 {
            return Err(CubeError::SolveError(format!(
                "hosed edges {pll_id:?} on an odd cube"
            )));
        }

        // The two slots must hold each other's dedge
        let (a, b) = (EDGE_SLOTS[pll_id.0], EDGE_SLOTS[pll_id.1]);
        let holds = |at: usize, slot: &str| -> Result<bool> {
            let position = self.slot_positions(&EDGE_SLOTS[at])[0];
            let partner = self.wing_partner(position)?;
            Ok(wing_str(self.state[position], self.state[partner]) == Some(slot))
        };
        if !(holds(pll_id.0, b.name)? && holds(pll_id.1, a.name)?) {
            return Err(CubeError::Unreachable(format!(
                "{} and {} are hosed but not exchanged",
                a.name, b.name
            )));
        }

        let setup = pll_setup(pll_id.0, pll_id.1)
            .ok_or_else(|| CubeError::Unreachable(format!("no PLL setup for {pll_id:?}")))?
            .to_vec();
        warn!("Solving PLL parity, exchanging {} and {}", a.name, b.name);
        self.rotate_moves(&setup)?;
        self.rotate_moves(&pll_swap_moves(self.size()))?;
        self.rotate_moves(&reverse_steps(&setup))?;
        Ok(())
    }
}
