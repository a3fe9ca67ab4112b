#![warn(clippy::pedantic)]
#![allow(clippy::similar_names, clippy::too_many_lines)]

pub mod config;
pub mod cube;
pub mod edge_slots;
mod engine;
pub mod errors;
pub mod face;
mod kociemba;
pub mod moves;
mod parity;
pub mod side;
pub mod solution;

pub use config::Config;
pub use cube::{Cube, FILLERS, FaceOrder, Snapshot};
pub use errors::{CubeError, Result};
pub use face::Face;
pub use moves::{Move, MoveKind, Turn, moves_to_string, parse_moves, random_moves, reverse_steps};
pub use parity::{get_swap_count, orbit_matches};
pub use solution::{PhaseStats, Solution, Step};

#[macro_export]
macro_rules! start {
    ($msg:expr) => {
        concat!("⏳ ", $msg)
    };
}

#[macro_export]
macro_rules! working {
    ($msg:expr) => {
        concat!("🛠  ", $msg)
    };
}

#[macro_export]
macro_rules! success {
    ($msg:expr) => {
        concat!("✅ ", $msg)
    };
}
