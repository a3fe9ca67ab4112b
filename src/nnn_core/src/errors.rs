use thiserror::Error;

/// Everything that can go wrong while manipulating a cube. None of these are
/// recoverable in a correct solve; they propagate up to the driver which dumps
/// the cube and bails.
#[derive(Error, Debug)]
pub enum CubeError {
    #[error(
        "Invalid cube reduction: expected {expected} facelets labelled {label:?} but found {actual}"
    )]
    InvalidCubeReduction {
        label: char,
        expected: usize,
        actual: usize,
    },
    #[error("Solve error: {0}")]
    SolveError(String),
    #[error("Stuck in a loop while {what} after {iterations} iterations")]
    StuckInALoop {
        what: &'static str,
        iterations: usize,
    },
    #[error("Invalid move {0:?}")]
    InvalidMove(String),
    #[error("Unreachable cube configuration: {0}")]
    Unreachable(String),
    #[error("Invalid cube state: {0}")]
    InvalidState(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = CubeError> = std::result::Result<T, E>;
