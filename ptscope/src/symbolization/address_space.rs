//! Context-scoped, bias-corrected symbol resolution
//!
//! A trace may interleave instructions from several processes, each with
//! its own binaries mapped at their own base addresses. The registry keeps
//! the bindings of each address-space context in registration order and
//! resolves an instruction pointer against them, falling back to the
//! default context.

use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::symbol_index::{Resolution, SymbolIndex};
use crate::domain::{ContextId, LoadBias};

/// One binary mapped into one address-space context at one load address
#[derive(Debug, Clone)]
pub struct ModuleBinding {
    pub binary: PathBuf,
    pub context: ContextId,
    pub load_bias: LoadBias,
    pub symbols: Arc<SymbolIndex>,
}

impl ModuleBinding {
    /// Resolve a runtime address against this binding's symbols
    #[must_use]
    pub fn resolve(&self, ip: u64) -> Option<Resolution<'_>> {
        let static_addr = self.load_bias.to_static(ip)?;
        self.symbols.lookup(static_addr).map(|(symbol, offset)| Resolution { symbol, offset })
    }
}

/// Maps address-space contexts to the binaries loaded in them
///
/// Built once during setup, read-only during annotation.
#[derive(Debug, Default)]
pub struct AddressSpaceRegistry {
    contexts: HashMap<ContextId, Vec<ModuleBinding>>,
}

impl AddressSpaceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binary mapped at `load_bias` in `context`
    ///
    /// There is no unmap: on overlap the most recently registered binding
    /// wins.
    pub fn register(
        &mut self,
        context: ContextId,
        load_bias: LoadBias,
        binary: impl AsRef<Path>,
        symbols: Arc<SymbolIndex>,
    ) {
        let binary = binary.as_ref().to_path_buf();
        debug!("Binding {} at {load_bias} in {context} ({} symbols)", binary.display(), symbols.len());
        self.contexts.entry(context).or_default().push(ModuleBinding {
            binary,
            context,
            load_bias,
            symbols,
        });
    }

    /// Resolve `ip` as seen in `context`
    ///
    /// Searches the context's bindings most recent first, then the default
    /// context. Returns None when no reachable binding has a symbol at or
    /// below the address.
    #[must_use]
    pub fn resolve(&self, context: ContextId, ip: u64) -> Option<Resolution<'_>> {
        let scoped = self.resolve_in(context, ip);
        if scoped.is_some() || context.is_default() {
            return scoped;
        }
        self.resolve_in(ContextId::DEFAULT, ip)
    }

    fn resolve_in(&self, context: ContextId, ip: u64) -> Option<Resolution<'_>> {
        self.bindings(context).iter().rev().find_map(|binding| binding.resolve(ip))
    }

    /// Bindings registered for `context`, in registration order
    #[must_use]
    pub fn bindings(&self, context: ContextId) -> &[ModuleBinding] {
        self.contexts.get(&context).map_or(&[], Vec::as_slice)
    }

    /// Total number of bindings across all contexts
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.contexts.values().map(Vec::len).sum()
    }

    /// Number of contexts with at least one binding
    #[must_use]
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
