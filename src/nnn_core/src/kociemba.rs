//! Hand-off of a reduced cube to an external 3x3x3 solver.

use std::process::Command;

use log::{debug, error, info, warn};

use crate::{
    config::Config,
    cube::{Cube, FaceOrder},
    errors::{CubeError, Result},
    face::Face,
    moves::parse_moves,
    solution::REDUCED_TO_333,
    start, success,
};

impl Cube {
    /// The cube as a kociemba facelet string, faces in URFDLB order.
    ///
    /// A reduced cube reads like a 3x3x3: corners, the first wing of every
    /// edge and the center (or a center corner on even cubes) of every face,
    /// 54 characters in all. With `all_squares` every facelet is written.
    ///
    /// # Errors
    ///
    /// `CubeError::InvalidState` for a 2x2x2, which has no edges to reduce.
    pub fn get_kociemba_string(&self, all_squares: bool) -> Result<String> {
        if all_squares {
            return Ok(self.state_string_in(FaceOrder::Urfdlb));
        }
        if self.size() < 3 {
            return Err(CubeError::InvalidState(format!(
                "a {0}x{0}x{0} can't be written as a 3x3x3",
                self.size()
            )));
        }

        let mut out = String::with_capacity(54);
        for face in Face::KOCIEMBA_ORDER {
            let side = self.side(face);
            let center = side
                .mid_pos
                .or_else(|| side.center_corner_pos.first().copied())
                .ok_or_else(|| CubeError::Unreachable(format!("{face} has no center")))?;
            let positions = [
                side.corner_pos[0],
                side.edge_north_pos[0],
                side.corner_pos[1],
                side.edge_west_pos[0],
                center,
                side.edge_east_pos[0],
                side.corner_pos[2],
                side.edge_south_pos[0],
                side.corner_pos[3],
            ];
            out.extend(positions.iter().map(|position| char::from(self.state[*position])));
        }
        Ok(out)
    }

    /// Runs the configured kociemba executable on the reduced cube and
    /// returns the moves it printed on its last line.
    ///
    /// # Errors
    ///
    /// `CubeError::SolveError` if the solver can't be started, exits with an
    /// error or prints something that doesn't parse as moves.
    pub fn solve_with_kociemba(&self, config: &Config) -> Result<Vec<crate::moves::Move>> {
        let facelets = self.get_kociemba_string(false)?;
        debug!("kociemba input {facelets}");

        let output = Command::new(&config.kociemba_path)
            .arg(&facelets)
            .output()
            .map_err(|e| {
                CubeError::SolveError(format!(
                    "could not run {}: {e}",
                    config.kociemba_path.display()
                ))
            })?;
        if !output.status.success() {
            return Err(CubeError::SolveError(format!(
                "{} exited with {}: {}",
                config.kociemba_path.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let last = stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .unwrap_or_default();
        if last.to_ascii_lowercase().starts_with("error") {
            return Err(CubeError::SolveError(format!("kociemba: {last}")));
        }
        parse_moves(last)
            .map_err(|e| CubeError::SolveError(format!("kociemba printed {last:?}: {e}")))
    }

    /// Finishes a cube whose centers are solved and edges paired.
    ///
    /// On even cubes OLL parity is fixed first and PLL parity is fixed before
    /// the 3x3x3 stage when it can be predicted. Any leftover exchanged pair
    /// of dedges is fixed afterwards.
    ///
    /// # Errors
    ///
    /// `CubeError::SolveError` when the external solver fails or the cube is
    /// still not solved at the end, `CubeError::InvalidState` for a 2x2x2.
    /// Parity failures are propagated.
    pub fn solve_333(&mut self, config: &Config) -> Result<()> {
        info!(start!("Solving the reduced cube"));
        let result = self.solve_333_inner(config);
        if result.is_err() && config.print_cube_on_error {
            error!("Failed to solve the reduced cube:\n{self}");
        }
        result
    }

    fn solve_333_inner(&mut self, config: &Config) -> Result<()> {
        if self.size() < 3 {
            return Err(CubeError::InvalidState(format!(
                "a {0}x{0}x{0} has no edges to reduce",
                self.size()
            )));
        }
        self.solution.push_marker(REDUCED_TO_333);
        self.rotate_u_to_u()?;
        self.rotate_f_to_f()?;

        if self.size() % 2 == 0 {
            self.solve_oll()?;
            if self.edge_solution_leads_to_pll_parity(false)? {
                warn!("PLL parity predicted, exchanging UL and UF first");
                let swap = crate::edge_slots::pll_swap_moves(self.size());
                self.rotate_moves(&swap)?;
            }
        }

        if self.solved() {
            info!(success!("Already solved"));
            return Ok(());
        }

        let moves = self.solve_with_kociemba(config)?;
        debug!("kociemba returned {} moves", moves.len());
        self.rotate_moves(&moves)?;

        if !self.solved() {
            self.solve_pll()?;
        }
        if !self.solved() {
            return Err(CubeError::SolveError(
                "the cube is not solved after the 3x3x3 stage".to_owned(),
            ));
        }
        info!(success!("Solved"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn solved_strings() {
        for size in 3..=6 {
            let cube = Cube::new(size).unwrap();
            assert_eq!(
                cube.get_kociemba_string(false).unwrap(),
                "UUUUUUUUURRRRRRRRRFFFFFFFFFDDDDDDDDDLLLLLLLLLBBBBBBBBB"
            );
        }
        assert!(Cube::new(2).unwrap().get_kociemba_string(false).is_err());
        assert_eq!(
            Cube::new(2).unwrap().get_kociemba_string(true).unwrap(),
            "UUUURRRRFFFFDDDDLLLLBBBB"
        );
    }

    #[test]
    fn reduced_string_reads_like_a_3x3() {
        let mut big = Cube::new(5).unwrap();
        let mut small = Cube::new(3).unwrap();
        for cube in [&mut big, &mut small] {
            cube.rotate_str("R U F' D2 L B'").unwrap();
        }
        assert_eq!(
            big.get_kociemba_string(false).unwrap(),
            small.get_kociemba_string(false).unwrap()
        );
    }

    fn missing_solver() -> Config {
        Config {
            kociemba_path: PathBuf::from("/nonexistent/kociemba"),
            print_cube_on_error: false,
            ..Config::default()
        }
    }

    #[test]
    fn missing_solver_is_a_solve_error() {
        let mut cube = Cube::new(3).unwrap();
        cube.rotate_str("R U").unwrap();
        assert!(matches!(
            cube.solve_333(&missing_solver()),
            Err(CubeError::SolveError(_))
        ));
    }

    #[test]
    fn two_by_two_is_rejected_without_touching_the_cube() {
        let mut cube = Cube::new(2).unwrap();
        cube.rotate_str("R U").unwrap();
        let before = cube.snapshot();
        assert!(matches!(
            cube.solve_333(&missing_solver()),
            Err(CubeError::InvalidState(_))
        ));
        assert_eq!(cube.snapshot(), before);
    }

    #[test]
    fn parity_only_cases_never_need_the_solver() {
        let mut cube = Cube::new(4).unwrap();
        cube.rotate_moves(&crate::edge_slots::pll_swap_moves(4))
            .unwrap();
        cube.solve_333(&missing_solver()).unwrap();
        assert!(cube.solved());

        let mut cube = Cube::new(4).unwrap();
        cube.rotate_moves(&crate::edge_slots::oll_flip_moves(4))
            .unwrap();
        cube.solve_333(&missing_solver()).unwrap();
        assert!(cube.solved());
    }
}
