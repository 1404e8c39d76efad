//! Streaming reader for the metadata dump.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::core::metadata::MetadataEntry;

/// Line counts from one pass over the dump.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanTotals {
    pub lines: usize,
    pub invalid: usize,
}

/// Call `visit` for every parseable record, in file order.
///
/// Blank lines are ignored; lines that are not valid UTF-8 JSON are logged and
/// skipped. Errors from `visit` abort the scan.
pub fn scan_metadata<F>(path: &Path, mut visit: F) -> Result<ScanTotals>
where
    F: FnMut(MetadataEntry) -> Result<()>,
{
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut totals = ScanTotals::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("read {} line {}", path.display(), totals.lines + 1))?;
        if read == 0 {
            break;
        }
        totals.lines += 1;
        let parsed = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => MetadataEntry::parse_line(line).map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };
        match parsed {
            Ok(entry) => visit(entry)?,
            Err(error) => {
                totals.invalid += 1;
                warn!(line = totals.lines, %error, "skipping invalid metadata line");
            }
        }
    }
    Ok(totals)
}
