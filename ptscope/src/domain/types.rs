//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep the three `u64`s that flow through symbol
//! resolution apart: an address-space context id, a load bias and a raw
//! timestamp are all plain integers in the trace.

use std::fmt;

/// Address-space context identifier
///
/// Distinguishes independent virtual-address mappings (separate processes)
/// within one trace. Context 0 is the default context used for binaries
/// registered without sideband information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ContextId(pub u64);

impl ContextId {
    /// The default context
    pub const DEFAULT: ContextId = ContextId(0);

    /// Returns true for the default context
    #[must_use]
    pub fn is_default(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CTX:{:#x}", self.0)
    }
}

/// Load bias of a binary
///
/// The runtime base address a binary was mapped at. Subtracting it from a
/// runtime instruction pointer yields the binary's static address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LoadBias(pub u64);

impl LoadBias {
    /// Translate a runtime address into the binary's static address space
    ///
    /// Returns None for addresses below the load bias, which cannot belong
    /// to this binary.
    #[must_use]
    pub fn to_static(self, runtime_addr: u64) -> Option<u64> {
        runtime_addr.checked_sub(self.0)
    }
}

impl fmt::Display for LoadBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Raw trace timestamp (TSC ticks, or an opaque counter)
///
/// Zero means "no timing information yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Tsc(pub u64);

impl Tsc {
    #[must_use]
    pub fn is_known(self) -> bool {
        self.0 != 0
    }

    /// Ticks elapsed since `earlier` (saturating for non-monotonic clocks)
    #[must_use]
    pub fn since(self, earlier: Tsc) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}
