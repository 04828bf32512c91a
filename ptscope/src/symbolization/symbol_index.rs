use object::{Object, ObjectSymbol, SymbolKind};
use rustc_demangle::demangle;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::domain::SetupError;

/// A function symbol of one binary, in the binary's static address space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub start: u64,
    pub size: u64,
}

impl Symbol {
    pub fn new(name: impl Into<String>, start: u64, size: u64) -> Self {
        Self { name: name.into(), start, size }
    }
}

/// Sorted symbol table of one binary
///
/// Lookups return the nearest preceding symbol, whether or not the address
/// falls inside that symbol's size. Stripped or size-less tables still
/// produce useful `name+offset` output this way.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    symbols: Vec<Symbol>,
}

impl SymbolIndex {
    /// Build an index, sorting by start address
    ///
    /// When several symbols share a start address the first one given wins.
    #[must_use]
    pub fn new(mut symbols: Vec<Symbol>) -> Self {
        symbols.sort_by_key(|s| s.start);
        symbols.dedup_by_key(|s| s.start);
        Self { symbols }
    }

    /// Load the function symbols of a binary file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not an object file
    /// `object` understands. A binary without symbols yields an empty index.
    pub fn from_file<P: AsRef<Path>>(binary_path: P) -> Result<Self, SetupError> {
        let path = binary_path.as_ref();
        let binary_data = fs::read(path)
            .map_err(|source| SetupError::BinaryUnreadable { path: path.to_path_buf(), source })?;

        Self::from_object_data(&binary_data)
            .map_err(|source| SetupError::SymbolParseFailed { path: path.to_path_buf(), source })
    }

    /// Extract defined text symbols from the static and dynamic tables
    ///
    /// # Errors
    /// Returns the parse error if `data` is not a recognized object file
    pub fn from_object_data(data: &[u8]) -> Result<Self, object::Error> {
        let obj_file = object::File::parse(data)?;

        let symbols = obj_file
            .symbols()
            .chain(obj_file.dynamic_symbols())
            .filter(|sym| sym.kind() == SymbolKind::Text && sym.is_definition())
            .filter(|sym| sym.address() != 0)
            .filter_map(|sym| {
                let name = sym.name().ok().filter(|n| !n.is_empty())?;
                Some(Symbol::new(demangle_symbol(name), sym.address(), sym.size()))
            })
            .collect();

        Ok(Self::new(symbols))
    }

    /// Find the symbol with the greatest start address `<= addr`
    ///
    /// Returns the symbol and the offset of `addr` from its start.
    #[must_use]
    pub fn lookup(&self, addr: u64) -> Option<(&Symbol, u64)> {
        let idx = self.symbols.partition_point(|s| s.start <= addr);
        let symbol = self.symbols.get(idx.checked_sub(1)?)?;
        Some((symbol, addr - symbol.start))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }
}

/// Demangle a Rust symbol name (other names pass through unchanged)
#[must_use]
pub fn demangle_symbol(symbol: &str) -> String {
    format!("{:#}", demangle(symbol))
}

/// A resolved address: the nearest preceding symbol and the distance to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub symbol: &'a Symbol,
    pub offset: u64,
}

impl fmt::Display for Resolution<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.offset > 0 {
            write!(f, "{}+{:#x}", self.symbol.name, self.offset)
        } else {
            f.write_str(&self.symbol.name)
        }
    }
}
