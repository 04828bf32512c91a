//! # Symbol Resolution Across Address Spaces
//!
//! This module turns the raw instruction pointers of a trace into
//! `function+offset` names. Unlike a single-process profiler, a hardware
//! trace can interleave several processes, and every process may load the
//! same binary at a different base address.
//!
//! ## Key Concepts
//!
//! ### Address-Space Context
//!
//! The trace tags instructions with a context id (on x86, the value of
//! CR3 when the instruction ran). Binaries are registered per context, so
//! `0x401000` in one process and `0x401000` in another can resolve to
//! different functions.
//!
//! Context **0** is the default context. Binaries given without sideband
//! information land there, and every lookup that misses in its own context
//! retries the default context. Single-binary traces therefore work
//! without any context setup.
//!
//! ### Load Bias
//!
//! Symbol tables hold static addresses; the trace holds runtime addresses.
//!
//! ```text
//! Runtime Address = Load Bias + Static Address
//! Static Address  = Runtime Address - Load Bias
//! ```
//!
//! ### Nearest Preceding Symbol
//!
//! Lookups return the symbol with the greatest start address at or below
//! the static address, regardless of the symbol's size. Stripped binaries
//! and hand-written assembly often carry size-less symbols, and a distant
//! `name+offset` is still more useful than a bare number.
//!
//! ## Resolution Flow
//!
//! ```text
//! 1. Sideband log / --elf options
//!    "0 1 10000 /usr/bin/a"  →  context 1, bias 0x10000, a's symbols
//!
//! 2. Instruction at ip 0x10050 in context 1
//!
//! 3. For each binding of context 1, newest first:
//!      static = 0x10050 - 0x10000 = 0x50
//!      nearest symbol <= 0x50 in a's table  →  a_func (start 0x0)
//!
//! 4. Display: "a_func+0x50"
//!
//! 5. No match in context 1?  Repeat step 3 for context 0.
//!    Still nothing?  Display the raw address "10050".
//! ```
//!
//! ## Module Structure
//!
//! - **`symbol_index`**: per-binary sorted symbol table (`object` +
//!   `rustc-demangle`)
//! - **`address_space`**: context → bindings registry and resolution
//! - **`sideband`**: sideband log parser
//! - **`loader`**: command-line binary specs and a per-path index cache

pub mod address_space;
pub mod loader;
pub mod sideband;
pub mod symbol_index;

pub use address_space::{AddressSpaceRegistry, ModuleBinding};
pub use loader::{BinarySpec, SymbolLoader};
pub use sideband::{parse_sideband, parse_sideband_file, SidebandRecord};
pub use symbol_index::{demangle_symbol, Resolution, Symbol, SymbolIndex};
