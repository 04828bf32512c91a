use log::{info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use super::address_space::AddressSpaceRegistry;
use super::sideband::{parse_hex, SidebandRecord};
use super::symbol_index::SymbolIndex;
use crate::domain::{ContextId, LoadBias, SetupError};

/// A binary named on the command line: `PATH[:LOAD[:CONTEXT]]`
///
/// Load address and context are hexadecimal and default to 0, which puts
/// the binary in the default context at its static addresses. Only
/// trailing fields that parse as hex are taken as load address and
/// context, so a path may itself contain `:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySpec {
    pub path: PathBuf,
    pub load_bias: LoadBias,
    pub context: ContextId,
}

impl BinarySpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), load_bias: LoadBias::default(), context: ContextId::DEFAULT }
    }
}

impl FromStr for BinarySpec {
    type Err = SetupError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut path = spec;
        let mut numbers = Vec::with_capacity(2);
        while numbers.len() < 2 {
            let Some((head, tail)) = path.rsplit_once(':') else { break };
            let Ok(value) = parse_hex(tail) else { break };
            numbers.push(value);
            path = head;
        }

        if path.is_empty() {
            return Err(SetupError::InvalidBinarySpec {
                spec: spec.to_string(),
                reason: "missing path".to_string(),
            });
        }

        // Collected right to left: [load] or [context, load]
        let (load, context) = match numbers[..] {
            [] => (0, 0),
            [load] => (load, 0),
            [context, load, ..] => (load, context),
        };
        Ok(Self { load_bias: LoadBias(load), context: ContextId(context), ..Self::new(path) })
    }
}

/// Loads symbol tables and registers them, parsing each binary once
///
/// A binary that appears in many sideband records (a shared library mapped
/// into every process) shares one [`SymbolIndex`] across its bindings.
#[derive(Default)]
pub struct SymbolLoader {
    cache: HashMap<PathBuf, Arc<SymbolIndex>>,
}

impl SymbolLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbol index of `path`, loading it on first use
    ///
    /// # Errors
    /// Returns an error if the binary cannot be read or parsed
    pub fn load(&mut self, path: &Path) -> Result<Arc<SymbolIndex>, SetupError> {
        if let Some(cached) = self.cache.get(path) {
            return Ok(Arc::clone(cached));
        }

        let index = Arc::new(SymbolIndex::from_file(path)?);
        if index.is_empty() {
            warn!("{} has no function symbols, its addresses will print raw", path.display());
        } else {
            info!("Loaded {} symbols from {}", index.len(), path.display());
        }
        self.cache.insert(path.to_path_buf(), Arc::clone(&index));
        Ok(index)
    }

    /// Load a command-line binary and register it
    ///
    /// # Errors
    /// Returns an error if the binary cannot be loaded
    pub fn register_binary(
        &mut self,
        registry: &mut AddressSpaceRegistry,
        spec: &BinarySpec,
    ) -> Result<(), SetupError> {
        let symbols = self.load(&spec.path)?;
        registry.register(spec.context, spec.load_bias, &spec.path, symbols);
        Ok(())
    }

    /// Load and register every binary of a sideband log, in log order
    ///
    /// # Errors
    /// Returns an error for the first binary that cannot be loaded
    pub fn register_sideband(
        &mut self,
        registry: &mut AddressSpaceRegistry,
        records: &[SidebandRecord],
    ) -> Result<(), SetupError> {
        for record in records {
            let symbols = self.load(&record.binary)?;
            registry.register(record.context, record.load_address, &record.binary, symbols);
        }
        Ok(())
    }

    /// Number of distinct binaries loaded so far
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_path_only() {
        let spec: BinarySpec = "/bin/ls".parse().unwrap();
        assert_eq!(spec, BinarySpec::new("/bin/ls"));
    }

    #[test]
    fn test_spec_with_load_and_context() {
        let spec: BinarySpec = "./a.out:0x7f0000:1a".parse().unwrap();
        assert_eq!(spec.path, PathBuf::from("./a.out"));
        assert_eq!(spec.load_bias, LoadBias(0x7f_0000));
        assert_eq!(spec.context, ContextId(0x1a));
    }

    #[test]
    fn test_spec_with_load_only() {
        let spec: BinarySpec = "lib.so:400000".parse().unwrap();
        assert_eq!(spec.load_bias, LoadBias(0x40_0000));
        assert_eq!(spec.context, ContextId::DEFAULT);
    }

    #[test]
    fn test_spec_errors() {
        assert!("".parse::<BinarySpec>().is_err());
        assert!(":1000".parse::<BinarySpec>().is_err());
        assert!(":1000:2".parse::<BinarySpec>().is_err());
    }

    #[test]
    fn test_spec_path_with_colons() {
        let spec: BinarySpec = "/opt/app:v2/bin/app".parse().unwrap();
        assert_eq!(spec, BinarySpec::new("/opt/app:v2/bin/app"));

        let spec: BinarySpec = "/opt/app:v2/bin/app:400000:3".parse().unwrap();
        assert_eq!(spec.path, PathBuf::from("/opt/app:v2/bin/app"));
        assert_eq!(spec.load_bias, LoadBias(0x40_0000));
        assert_eq!(spec.context, ContextId(3));

        // A non-hex field ends the numeric suffix and stays in the path
        let spec: BinarySpec = "a.out:xyz".parse().unwrap();
        assert_eq!(spec.path, PathBuf::from("a.out:xyz"));
        let spec: BinarySpec = "a.out:nope:10".parse().unwrap();
        assert_eq!(spec.path, PathBuf::from("a.out:nope"));
        assert_eq!(spec.load_bias, LoadBias(0x10));
    }

    #[test]
    fn test_missing_binary_is_a_setup_error() {
        let mut loader = SymbolLoader::new();
        let err = loader.load(Path::new("/nonexistent/ptscope-test-binary")).unwrap_err();
        assert!(matches!(err, SetupError::BinaryUnreadable { .. }));
        assert_eq!(loader.loaded_count(), 0);
    }
}
