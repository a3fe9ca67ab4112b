#![warn(clippy::pedantic)]

//! Read-only access to pattern databases: sorted `state:value` text files
//! searched in place on disk.

pub mod bisect;
pub mod fixed_width;
pub mod heuristic;
pub mod table;

use thiserror::Error;

pub use bisect::{bisect_interval, bisect_left, bisect_right, bisect_way, get_line_startswith};
pub use fixed_width::{FileVitals, binary_search, binary_search_multiple, get_file_vitals};
pub use heuristic::{Heuristic, Keyed, MaxHeuristic};
pub use table::{Layout, LookupTable, value_cost};

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Lookup table I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Lookup table is malformed: {0}")]
    Malformed(String),
}
