//! Sideband log parsing
//!
//! The sideband log records which binary was mapped where, in which
//! address-space context. One record per line:
//!
//! ```text
//! <timestamp-hex> <context-id-hex> <load-address-hex> <path-to-binary>
//! ```
//!
//! The timestamp is kept for reference only; it could later distinguish
//! reused context ids. Any malformed line fails the whole log.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{ContextId, LoadBias, SetupError};

/// One mapping record from the sideband log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebandRecord {
    pub timestamp: u64,
    pub context: ContextId,
    pub load_address: LoadBias,
    pub binary: PathBuf,
}

/// Read and parse a sideband log file
///
/// # Errors
/// Returns an error if the file cannot be read or any line is malformed
pub fn parse_sideband_file<P: AsRef<Path>>(path: P) -> Result<Vec<SidebandRecord>, SetupError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|source| SetupError::SidebandUnreadable { path: path.to_path_buf(), source })?;
    parse_sideband(path, &text)
}

/// Parse sideband log text; `source` names the log in error messages
///
/// Blank lines and lines starting with `#` are skipped.
///
/// # Errors
/// Returns [`SetupError::SidebandParse`] for the first malformed line
pub fn parse_sideband(source: &Path, text: &str) -> Result<Vec<SidebandRecord>, SetupError> {
    let mut records = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let record = parse_record(line).map_err(|reason| SetupError::SidebandParse {
            path: source.to_path_buf(),
            line: idx + 1,
            reason,
        })?;
        records.push(record);
    }

    Ok(records)
}

fn parse_record(line: &str) -> Result<SidebandRecord, String> {
    let mut rest = line;
    let mut fields = [0u64; 3];

    for (slot, what) in fields.iter_mut().zip(["timestamp", "context id", "load address"]) {
        let (field, tail) = split_field(rest);
        if field.is_empty() {
            return Err(format!("missing {what}"));
        }
        *slot = parse_hex(field).map_err(|e| format!("bad {what} {field:?}: {e}"))?;
        rest = tail;
    }

    // The path is the remainder of the line and may contain spaces
    let path = rest.trim();
    if path.is_empty() {
        return Err("missing binary path".to_string());
    }

    Ok(SidebandRecord {
        timestamp: fields[0],
        context: ContextId(fields[1]),
        load_address: LoadBias(fields[2]),
        binary: PathBuf::from(path),
    })
}

fn split_field(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((field, tail)) => (field, tail),
        None => (s, ""),
    }
}

/// Parse a hexadecimal number with an optional `0x` prefix
pub(crate) fn parse_hex(field: &str) -> Result<u64, std::num::ParseIntError> {
    let digits =
        field.strip_prefix("0x").or_else(|| field.strip_prefix("0X")).unwrap_or(field);
    u64::from_str_radix(digits, 16)
}
