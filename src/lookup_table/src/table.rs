use std::{
    fs::File,
    io::{BufReader, Seek, SeekFrom},
    path::{Path, PathBuf},
    time::Instant,
};

use fxhash::FxHashMap;
use log::{debug, info, warn};

use crate::{
    LookupError,
    bisect::get_line_startswith,
    fixed_width::{FileVitals, binary_search, binary_search_multiple},
    heuristic::Heuristic,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Every line padded to the same width.
    Fixed(FileVitals),
    /// Lines of any width, searched by bisection.
    Variable,
}

/// A sorted `state:value` file opened for lookups.
///
/// Values are either a cost or the move sequence that solves the state; a
/// move sequence costs one per move.
#[derive(Debug)]
pub struct LookupTable {
    path: PathBuf,
    reader: BufReader<File>,
    layout: Layout,
    default_cost: u8,
    hits: u64,
    misses: u64,
}

impl LookupTable {
    /// Opens `path`. With `fixed` the file must have equal width lines.
    ///
    /// # Errors
    ///
    /// I/O errors and files that don't have the expected layout.
    pub fn open(path: &Path, fixed: bool) -> Result<Self, LookupError> {
        let start = Instant::now();
        let size = std::fs::metadata(path)?.len();
        let mut reader = BufReader::new(File::open(path)?);
        let layout = if fixed {
            let vitals = FileVitals::from_reader(&mut reader, size)?;
            if vitals.linecount * vitals.width != size {
                return Err(LookupError::Malformed(format!(
                    "{}: {size} bytes is not a multiple of the {} byte line width",
                    path.display(),
                    vitals.width
                )));
            }
            Layout::Fixed(vitals)
        } else {
            Layout::Variable
        };
        reader.seek(SeekFrom::Start(0))?;
        info!(
            "Opened {} ({size} bytes, {layout:?}) in {:.3}s",
            path.display(),
            start.elapsed().as_secs_f64()
        );
        Ok(LookupTable {
            path: path.to_owned(),
            reader,
            layout,
            default_cost: 0,
            hits: 0,
            misses: 0,
        })
    }

    /// The cost reported for states that are not in the file.
    #[must_use]
    pub fn with_default_cost(mut self, default_cost: u8) -> Self {
        self.default_cost = default_cost;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// `(hits, misses)` so far.
    #[must_use]
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    /// The value stored for `key`, `None` if the key isn't there.
    ///
    /// # Errors
    ///
    /// I/O errors and malformed lines.
    pub fn get(&mut self, key: &str) -> Result<Option<String>, LookupError> {
        let value = match self.layout {
            Layout::Fixed(vitals) => binary_search(&mut self.reader, vitals, key)?,
            Layout::Variable => {
                let prefix = format!("{key}:");
                get_line_startswith(&mut self.reader, &prefix)?
                    .map(|line| line[prefix.len()..].trim_end().to_owned())
            }
        };
        if value.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        Ok(value)
    }

    /// Looks up every key, batching the search for fixed-width files. Only
    /// keys that were found are in the map.
    ///
    /// # Errors
    ///
    /// I/O errors and malformed lines.
    pub fn get_multiple(&mut self, keys: &[&str]) -> Result<FxHashMap<String, String>, LookupError> {
        match self.layout {
            Layout::Fixed(vitals) => {
                let found = binary_search_multiple(&mut self.reader, vitals, keys)?;
                debug!("{} of {} keys found in {}", found.len(), keys.len(), self.path.display());
                Ok(found)
            }
            Layout::Variable => {
                let mut found = FxHashMap::default();
                for key in keys {
                    if let Some(value) = self.get(key)? {
                        found.insert((*key).to_owned(), value);
                    }
                }
                Ok(found)
            }
        }
    }
}

/// The cost of a stored value: a number is the cost itself, anything else is
/// a move sequence that costs one per move.
///
/// # Errors
///
/// `LookupError::Malformed` for costs that don't fit in a `u8`.
pub fn value_cost(value: &str) -> Result<u8, LookupError> {
    let value = value.trim();
    if !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_digit()) {
        return value
            .parse()
            .map_err(|_| LookupError::Malformed(format!("cost {value} is too large")));
    }
    let moves = value.split_whitespace().count();
    u8::try_from(moves)
        .map_err(|_| LookupError::Malformed(format!("{moves} moves is too many")))
}

impl Heuristic<str> for LookupTable {
    fn heuristic(&mut self, key: &str) -> Result<u8, LookupError> {
        match self.get(key)? {
            Some(value) => value_cost(&value),
            None => {
                if self.misses == 1 {
                    warn!(
                        "{} has no entry for {key}, using the default cost {}",
                        self.path.display(),
                        self.default_cost
                    );
                }
                Ok(self.default_cost)
            }
        }
    }
}
