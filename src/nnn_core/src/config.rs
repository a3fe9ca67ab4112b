use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::{CubeError, Result};

/// Solver configuration, usually read from a TOML file.
///
/// ```toml
/// lookup_table_dir = "/var/cache/nnn/lookup-tables"
/// kociemba_path = "kociemba"
/// max_loop_iterations = 30
/// max_instances = 2
/// print_cube_on_error = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where pattern database files live.
    pub lookup_table_dir: PathBuf,
    /// The external 3x3x3 solver, looked up on `PATH` when not absolute.
    pub kociemba_path: PathBuf,
    /// Cap for every bounded retry loop.
    pub max_loop_iterations: usize,
    /// Warn when more cubes than this are alive at once. Each cube holds its
    /// own copy of the strip tables.
    pub max_instances: usize,
    /// Dump the cube when a solve fails.
    pub print_cube_on_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        let mut lookup_table_dir = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        lookup_table_dir.push("nnn-lookup-tables");

        Config {
            lookup_table_dir,
            kociemba_path: PathBuf::from("kociemba"),
            max_loop_iterations: 30,
            max_instances: 2,
            print_cube_on_error: true,
        }
    }
}

impl Config {
    /// # Errors
    ///
    /// Fails if the file can't be read or is not valid TOML for `Config`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = toml::from_str::<Config>(&text)
            .map_err(|e| CubeError::InvalidState(format!("{}: {e}", path.display())))?;
        if config.max_loop_iterations == 0 {
            warn!("max_loop_iterations is zero, every bounded loop will fail immediately");
        }
        Ok(config)
    }

    #[must_use]
    pub fn lookup_table_path(&self, name: &str) -> PathBuf {
        self.lookup_table_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_uses_defaults() {
        let config = toml::from_str::<Config>("max_loop_iterations = 12\n").unwrap();
        assert_eq!(config.max_loop_iterations, 12);
        assert_eq!(config.kociemba_path, PathBuf::from("kociemba"));
        assert_eq!(config.max_instances, 2);
        assert!(config.lookup_table_dir.ends_with("nnn-lookup-tables"));
    }

    #[test]
    fn lookup_table_path_joins() {
        let config = Config {
            lookup_table_dir: PathBuf::from("/tables"),
            ..Config::default()
        };
        assert_eq!(
            config.lookup_table_path("lookup-table-4x4x4-step10.txt"),
            PathBuf::from("/tables/lookup-table-4x4x4-step10.txt")
        );
    }
}
