//! Binary search over files where every line has the same width, so line `i`
//! starts at `i * width` and no newline hunting is needed.

use std::{
    cmp::Ordering,
    fs::File,
    io::{BufRead, BufReader, Read, Seek, SeekFrom},
    path::Path,
};

use fxhash::FxHashMap;
use log::debug;

use crate::LookupError;

/// The shape of a fixed-width file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileVitals {
    /// Bytes per line, newline included.
    pub width: u64,
    /// Bytes before the `:` of every line.
    pub state_width: usize,
    pub linecount: u64,
}

impl FileVitals {
    /// Reads the first line of `reader` and derives the rest from `size`.
    ///
    /// # Errors
    ///
    /// `LookupError::Malformed` if the first line has no `:` separator.
    pub fn from_reader<R: BufRead>(reader: &mut R, size: u64) -> Result<Self, LookupError> {
        let mut first = Vec::new();
        reader.read_until(b'\n', &mut first)?;
        let state_width = first
            .iter()
            .position(|byte| *byte == b':')
            .ok_or_else(|| LookupError::Malformed("first line has no ':'".to_owned()))?;
        let width = first.len() as u64;
        Ok(FileVitals {
            width,
            state_width,
            linecount: size / width,
        })
    }
}

/// The line width, state width and line count of the file at `path`.
///
/// # Errors
///
/// I/O errors, or `LookupError::Malformed` for a file without a `:` on its
/// first line.
pub fn get_file_vitals(path: &Path) -> Result<FileVitals, LookupError> {
    let size = std::fs::metadata(path)?.len();
    let mut reader = BufReader::new(File::open(path)?);
    let vitals = FileVitals::from_reader(&mut reader, size)?;
    debug!(
        "{}: width {}, state width {}, {} lines",
        path.display(),
        vitals.width,
        vitals.state_width,
        vitals.linecount
    );
    Ok(vitals)
}

fn read_state<R: Read + Seek>(
    file: &mut R,
    vitals: FileVitals,
    line: u64,
    state: &mut [u8],
) -> Result<(), LookupError> {
    file.seek(SeekFrom::Start(line * vitals.width))?;
    file.read_exact(state)?;
    Ok(())
}

/// The value after the `:` on `line`, trailing padding removed.
fn read_value<R: Read + Seek>(
    file: &mut R,
    vitals: FileVitals,
    line: u64,
) -> Result<String, LookupError> {
    file.seek(SeekFrom::Start(line * vitals.width))?;
    let mut buf = vec![0; usize::try_from(vitals.width).unwrap_or(usize::MAX)];
    let read = file.read(&mut buf)?;
    buf.truncate(read);
    let text = String::from_utf8(buf)
        .map_err(|_| LookupError::Malformed(format!("line {line} is not UTF-8")))?;
    let (_, value) = text
        .split_once(':')
        .ok_or_else(|| LookupError::Malformed(format!("line {line} has no ':'")))?;
    Ok(value.trim_end().to_owned())
}

/// Searches lines `first..=last` for `key`. Returns the line it is on, or
/// `Err(insertion point)`.
fn search_window<R: Read + Seek>(
    file: &mut R,
    vitals: FileVitals,
    key: &[u8],
    mut first: u64,
    mut last: u64,
    state: &mut [u8],
) -> Result<Result<u64, u64>, LookupError> {
    // `last` is one past the window so the window can be empty without
    // underflowing
    last += 1;
    while first < last {
        let mid = first + (last - first) / 2;
        read_state(file, vitals, mid, state)?;
        match key.cmp(state) {
            Ordering::Less => last = mid,
            Ordering::Equal => return Ok(Ok(mid)),
            Ordering::Greater => first = mid + 1,
        }
    }
    Ok(Err(first))
}

/// Looks up `key` in a fixed-width file. Only the first `state_width` bytes
/// of a line are read until the match is found. A miss is `Ok(None)`.
///
/// # Errors
///
/// I/O errors and malformed lines.
pub fn binary_search<R: Read + Seek>(
    file: &mut R,
    vitals: FileVitals,
    key: &str,
) -> Result<Option<String>, LookupError> {
    if key.len() != vitals.state_width || vitals.linecount == 0 {
        return Ok(None);
    }
    let mut state = vec![0; vitals.state_width];
    match search_window(file, vitals, key.as_bytes(), 0, vitals.linecount - 1, &mut state)? {
        Ok(line) => read_value(file, vitals, line).map(Some),
        Err(_) => Ok(None),
    }
}

/// Looks up many keys at once. The keys are sorted first so that each search
/// starts where the previous one ended. Only keys that were found are in the
/// returned map.
///
/// # Errors
///
/// I/O errors and malformed lines.
pub fn binary_search_multiple<R: Read + Seek>(
    file: &mut R,
    vitals: FileVitals,
    keys: &[&str],
) -> Result<FxHashMap<String, String>, LookupError> {
    let mut results = FxHashMap::default();
    if vitals.linecount == 0 {
        return Ok(results);
    }

    let mut keys = keys
        .iter()
        .filter(|key| key.len() == vitals.state_width)
        .copied()
        .collect::<Vec<_>>();
    keys.sort_unstable();
    keys.dedup();

    let mut state_first = vec![0; vitals.state_width];
    let mut state_last = vec![0; vitals.state_width];
    read_state(file, vitals, 0, &mut state_first)?;
    read_state(file, vitals, vitals.linecount - 1, &mut state_last)?;

    let mut state = vec![0; vitals.state_width];
    let (mut skipped, mut looked_for) = (0, 0);
    let mut first = 0;
    for key in &keys {
        let bytes = key.as_bytes();
        if bytes < state_first.as_slice() {
            skipped += 1;
            continue;
        }
        if bytes > state_last.as_slice() {
            break;
        }
        looked_for += 1;
        match search_window(file, vitals, bytes, first, vitals.linecount - 1, &mut state)? {
            Ok(line) => {
                results.insert((*key).to_owned(), read_value(file, vitals, line)?);
                first = line + 1;
            }
            Err(insertion) => first = insertion,
        }
    }

    debug!(
        "{skipped} keys were before the first entry, {looked_for} were looked for, {} were after the last entry",
        keys.len() - skipped - looked_for
    );
    Ok(results)
}
