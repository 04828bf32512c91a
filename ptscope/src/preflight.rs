//! Pre-flight checks for ptscope
//!
//! Validates inputs before any file is parsed, so that setup fails with a
//! clear, actionable message instead of halfway through loading symbols.

use anyhow::{bail, Context, Result};
use object::{Object, ObjectSection};
use std::path::Path;

use crate::domain::SetupError;
use crate::symbolization::BinarySpec;

/// Run all pre-flight checks before loading anything
///
/// # Errors
/// Returns an error for a missing input file or an invalid frequency
pub fn run_preflight_checks(
    trace: &Path,
    binaries: &[BinarySpec],
    sidebands: &[impl AsRef<Path>],
    freq_ghz: f64,
    quiet: bool,
) -> Result<()> {
    check_frequency(freq_ghz)?;
    check_input_file("Trace file", trace, "--trace")?;
    for sideband in sidebands {
        check_input_file("Sideband log", sideband.as_ref(), "--sideband")?;
    }
    for binary in binaries {
        check_input_file("Binary", &binary.path, "--elf")?;
        check_symbol_table(&binary.path, quiet)?;
    }
    Ok(())
}

/// The TSC frequency must be usable as a divisor (or zero for raw counts)
///
/// # Errors
/// Returns [`SetupError::InvalidFrequency`] for negative or non-finite values
pub fn check_frequency(freq_ghz: f64) -> Result<(), SetupError> {
    if freq_ghz.is_finite() && freq_ghz >= 0.0 {
        Ok(())
    } else {
        Err(SetupError::InvalidFrequency(freq_ghz))
    }
}

/// Check that an input exists and is a regular file
fn check_input_file(what: &str, path: &Path, option: &str) -> Result<()> {
    if !path.exists() {
        bail!(
            "{what} not found: {}\n\n\
             Make sure the path given to {option} is correct.",
            path.display()
        );
    }
    if !path.is_file() {
        bail!(
            "Not a file: {}\n\n\
             {option} must point to a file, not a directory.",
            path.display()
        );
    }
    Ok(())
}

/// Warn when a binary has no symbol table, since its addresses will print raw
fn check_symbol_table(path: &Path, quiet: bool) -> Result<()> {
    if quiet {
        return Ok(());
    }

    let file_data =
        std::fs::read(path).with_context(|| format!("Failed to read binary: {}", path.display()))?;

    let Ok(obj) = object::File::parse(&*file_data) else {
        // Not a valid object file, let symbol loading report it
        return Ok(());
    };

    let has_symtab = obj.section_by_name(".symtab").is_some_and(|s| s.size() > 0);
    let has_dynsym = obj.section_by_name(".dynsym").is_some_and(|s| s.size() > 0);

    if !has_symtab && !has_dynsym {
        eprintln!("warning: {} is stripped, its addresses will print raw", path.display());
    } else if !has_symtab {
        eprintln!("warning: {} has only dynamic symbols, internal functions will print as offsets", path.display());
    }

    Ok(())
}
