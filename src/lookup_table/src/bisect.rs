//! Binary search over the lines of a sorted text file whose lines may have
//! any length. Offsets handed out are always line starts.

use std::io::{BufRead, Seek, SeekFrom};

use log::trace;

use crate::LookupError;

/// A line looked at during one bisection.
#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    /// Where the line starts.
    line_start: u64,
    /// Whether the key sorts before (or, for `bisect_left`, equal to) it.
    result: bool,
    /// The smallest probe offset known to resolve to this line.
    last_offset: u64,
}

impl CacheEntry {
    fn covers(&self, offset: u64) -> bool {
        self.last_offset <= offset && offset <= self.line_start
    }
}

/// Reads one line starting at `start`, newline included, cut off at `size`.
fn read_line_at<R: BufRead + Seek>(
    file: &mut R,
    start: u64,
    size: u64,
) -> Result<Vec<u8>, LookupError> {
    file.seek(SeekFrom::Start(start))?;
    let mut line = Vec::new();
    file.read_until(b'\n', &mut line)?;
    line.truncate(usize::try_from(size - start).unwrap_or(usize::MAX));
    Ok(line)
}

/// Resolves `offset` to the line that starts at or after it and tests it.
/// At most two lines are remembered; a bisection keeps hitting the same two
/// lines near its end so this saves most of the reads.
fn read_and_compare<R: BufRead + Seek>(
    cache: &mut Vec<CacheEntry>,
    offset: u64,
    file: &mut R,
    size: u64,
    tester: &impl Fn(&[u8]) -> bool,
) -> Result<CacheEntry, LookupError> {
    if cache.first().is_some_and(|entry| entry.covers(offset)) {
        cache.reverse();
        return Ok(cache[cache.len() - 1]);
    }
    if cache.len() > 1 && cache[cache.len() - 1].covers(offset) {
        return Ok(cache[cache.len() - 1]);
    }

    let line_start = if offset == 0 {
        0
    } else {
        file.seek(SeekFrom::Start(offset - 1))?;
        let mut skipped = Vec::new();
        let read = file.read_until(b'\n', &mut skipped)? as u64;
        size.min(offset - 1 + read)
    };

    if cache.first().is_some_and(|entry| entry.line_start == line_start) {
        cache.reverse();
        let last = cache.len() - 1;
        cache[last].last_offset = cache[last].last_offset.min(offset);
        return Ok(cache[last]);
    }
    if cache.len() > 1 && cache[cache.len() - 1].line_start == line_start {
        let last = cache.len() - 1;
        cache[last].last_offset = cache[last].last_offset.min(offset);
        return Ok(cache[last]);
    }

    // Past the end sorts after every key
    let mut result = true;
    if line_start < size {
        let line = read_line_at(file, line_start, size)?;
        if !line.is_empty() {
            result = tester(line.strip_suffix(b"\n").unwrap_or(&line));
        }
    }

    if cache.len() > 1 {
        cache.remove(0);
    }
    let entry = CacheEntry {
        line_start,
        result,
        last_offset: offset,
    };
    cache.push(entry);
    Ok(entry)
}

/// The byte offset where a line equal to `key` would be inserted into the
/// sorted `file`. With `is_left` this is the first line `>= key`
/// (`bisect_left`), otherwise the first line `> key` (`bisect_right`). Keys
/// below every line give 0 and keys above every line give the file size.
///
/// Only the first `size` bytes are looked at; `None` means the whole file.
/// Lines compare as raw bytes, so the file must be sorted with `LC_ALL=C`.
///
/// # Errors
///
/// I/O errors from the underlying file.
pub fn bisect_way<R: BufRead + Seek>(
    file: &mut R,
    key: &str,
    is_left: bool,
    size: Option<u64>,
) -> Result<u64, LookupError> {
    let key = key.trim_end_matches('\n').as_bytes();
    if is_left && key.is_empty() {
        return Ok(0);
    }

    let size = match size {
        Some(size) => size,
        None => file.seek(SeekFrom::End(0))?,
    };
    if size == 0 {
        return Ok(0);
    }

    let tester = |line: &[u8]| {
        if is_left { key <= line } else { key < line }
    };

    let (mut lo, mut hi, mut mid) = (0, size - 1, 1);
    let mut cache = Vec::with_capacity(2);
    let mut found = 0;
    while lo < hi {
        mid = (lo + hi) >> 1;
        let entry = read_and_compare(&mut cache, mid, file, size, &tester)?;
        found = entry.line_start;
        if entry.result {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    if mid != lo {
        found = read_and_compare(&mut cache, lo, file, size, &tester)?.line_start;
    }

    trace!(
        "bisect_{} for {:?} landed on {found}",
        if is_left { "left" } else { "right" },
        String::from_utf8_lossy(key)
    );
    Ok(found)
}

/// # Errors
///
/// See `bisect_way`.
pub fn bisect_left<R: BufRead + Seek>(
    file: &mut R,
    key: &str,
    size: Option<u64>,
) -> Result<u64, LookupError> {
    bisect_way(file, key, true, size)
}

/// # Errors
///
/// See `bisect_way`.
pub fn bisect_right<R: BufRead + Seek>(
    file: &mut R,
    key: &str,
    size: Option<u64>,
) -> Result<u64, LookupError> {
    bisect_way(file, key, false, size)
}

/// The `(start, end)` byte range holding the lines between `start_key` and
/// `stop_key` (`start_key` when `None`). With `is_open` the range is
/// `start_key <= line < stop_key`, otherwise `stop_key` is included.
///
/// # Errors
///
/// See `bisect_way`.
pub fn bisect_interval<R: BufRead + Seek>(
    file: &mut R,
    start_key: &str,
    stop_key: Option<&str>,
    is_open: bool,
    size: Option<u64>,
) -> Result<(u64, u64), LookupError> {
    let start_key = start_key.trim_end_matches('\n');
    let stop_key = stop_key.map_or(start_key, |key| key.trim_matches('\n'));

    let end = bisect_way(file, stop_key, is_open, size)?;
    if is_open && start_key == stop_key {
        return Ok((end, end));
    }
    let start = bisect_way(file, start_key, true, Some(end))?;
    Ok((start, end))
}

/// The first line starting with `prefix`, without its newline. A miss is
/// `Ok(None)`.
///
/// # Errors
///
/// I/O errors and lines that aren't UTF-8.
pub fn get_line_startswith<R: BufRead + Seek>(
    file: &mut R,
    prefix: &str,
) -> Result<Option<String>, LookupError> {
    let start = bisect_left(file, prefix, None)?;
    file.seek(SeekFrom::Start(start))?;
    let mut line = String::new();
    file.read_line(&mut line)?;
    if line.starts_with(prefix) && !line.is_empty() {
        line.truncate(line.trim_end_matches('\n').len());
        Ok(Some(line))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn file(text: &str) -> Cursor<Vec<u8>> {
        Cursor::new(text.as_bytes().to_vec())
    }

    #[test]
    fn prefix_lookup() {
        let mut f = file("A:1\nAB:2\nABC:3\n");
        assert_eq!(get_line_startswith(&mut f, "AB").unwrap().as_deref(), Some("AB:2"));
        assert_eq!(get_line_startswith(&mut f, "ABC:").unwrap().as_deref(), Some("ABC:3"));
        assert_eq!(get_line_startswith(&mut f, "A:").unwrap().as_deref(), Some("A:1"));
        assert_eq!(get_line_startswith(&mut f, "B").unwrap(), None);
        assert_eq!(get_line_startswith(&mut f, "AA").unwrap(), None);
    }

    #[test]
    fn bounds() {
        let text = "BB:1\nCC:2\nDD:3\n";
        let mut f = file(text);
        assert_eq!(bisect_left(&mut f, "AA", None).unwrap(), 0);
        assert_eq!(bisect_right(&mut f, "AA", None).unwrap(), 0);
        assert_eq!(bisect_left(&mut f, "ZZ", None).unwrap(), text.len() as u64);
        assert_eq!(bisect_right(&mut f, "ZZ", None).unwrap(), text.len() as u64);
        assert_eq!(bisect_left(&mut f, "", None).unwrap(), 0);
        assert_eq!(bisect_left(&mut file(""), "AA", None).unwrap(), 0);
    }

    #[test]
    fn left_and_right_around_equal_lines() {
        let text = "a\nb\nb\nb\nc\n";
        let mut f = file(text);
        assert_eq!(bisect_left(&mut f, "b", None).unwrap(), 2);
        assert_eq!(bisect_right(&mut f, "b", None).unwrap(), 8);
        assert_eq!(bisect_interval(&mut f, "b", None, false, None).unwrap(), (2, 8));
        assert_eq!(bisect_interval(&mut f, "b", None, true, None).unwrap(), (2, 2));
        assert_eq!(bisect_interval(&mut f, "a", Some("c"), true, None).unwrap(), (0, 8));
        assert_eq!(bisect_interval(&mut f, "a", Some("c"), false, None).unwrap(), (0, 10));
    }

    #[test]
    fn size_limit_hides_the_tail() {
        let mut f = file("a\nb\nc\nd\n");
        assert_eq!(bisect_left(&mut f, "d", Some(4)).unwrap(), 4);
        assert_eq!(bisect_left(&mut f, "b", Some(4)).unwrap(), 2);
    }

    #[test]
    fn matches_a_linear_scan() {
        let mut rng = fastrand::Rng::with_seed(9);
        for _ in 0..50 {
            let mut lines = (0..rng.usize(1..40))
                .map(|_| {
                    (0..rng.usize(1..6))
                        .map(|_| rng.char('a'..='e'))
                        .collect::<String>()
                })
                .collect::<Vec<_>>();
            lines.sort();
            let text = lines.iter().map(|line| format!("{line}\n")).collect::<String>();
            let mut f = file(&text);

            for _ in 0..20 {
                let key = (0..rng.usize(1..6))
                    .map(|_| rng.char('a'..='e'))
                    .collect::<String>();
                let mut offset = 0;
                let mut left = None;
                let mut right = None;
                for line in &lines {
                    if left.is_none() && key.as_str() <= line.as_str() {
                        left = Some(offset);
                    }
                    if right.is_none() && key.as_str() < line.as_str() {
                        right = Some(offset);
                    }
                    offset += line.len() as u64 + 1;
                }
                let end = text.len() as u64;
                assert_eq!(bisect_left(&mut f, &key, None).unwrap(), left.unwrap_or(end));
                assert_eq!(bisect_right(&mut f, &key, None).unwrap(), right.unwrap_or(end));
            }
        }
    }
}
