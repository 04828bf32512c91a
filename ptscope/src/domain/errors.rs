//! Structured error types for ptscope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the run before any annotation happens
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Cannot open trace file {path}: {source}")]
    TraceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read binary {path}: {source}")]
    BinaryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse symbols of {path}: {source}")]
    SymbolParseFailed {
        path: PathBuf,
        #[source]
        source: object::Error,
    },

    #[error("Cannot open sideband log {path}: {source}")]
    SidebandUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: Parse error: {reason}")]
    SidebandParse { path: PathBuf, line: usize, reason: String },

    #[error("Invalid binary specification {spec:?}: {reason}")]
    InvalidBinarySpec { spec: String, reason: String },

    #[error("Invalid frequency {0}: must be a finite, non-negative number of GHz")]
    InvalidFrequency(f64),
}

/// Errors that abort an annotation pass
///
/// Decode faults are not listed here: they end a segment, are reported
/// inline, and annotation continues at the next synchronization point.
#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("Failed to write timeline: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sideband_parse_error_display() {
        let err = SetupError::SidebandParse {
            path: PathBuf::from("maps.log"),
            line: 3,
            reason: "missing load address".to_string(),
        };
        assert_eq!(err.to_string(), "maps.log:3: Parse error: missing load address");
    }

    #[test]
    fn test_binary_spec_error() {
        let err = SetupError::InvalidBinarySpec {
            spec: ":400000".to_string(),
            reason: "missing path".to_string(),
        };
        assert!(err.to_string().contains(":400000"));
        assert!(err.to_string().contains("missing path"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: AnnotateError = io.into();
        assert!(err.to_string().contains("pipe closed"));
    }
}
