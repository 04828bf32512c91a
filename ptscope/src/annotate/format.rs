//! Timeline line rendering
//!
//! Column widths are cosmetic. Field order (time, delta, instruction
//! count, operation) is what readers and tests rely on.

use std::fmt::Write as _;

use ptscope_common::InsnEvent;

use crate::domain::ContextId;
use crate::symbolization::AddressSpaceRegistry;

/// Width of the time/delta column
pub const TIME_WIDTH: usize = 24;

/// Column header printed before the timeline
#[must_use]
pub fn header() -> String {
    format!("{:<10} {:<5}  {:>7}   {}", "TIME", "DELTA", "INSNs", "OPERATION")
}

/// `name+0xoff`, `name`, or the raw hex address when nothing resolves
#[must_use]
pub fn symbolize(registry: &AddressSpaceRegistry, context: ContextId, ip: u64) -> String {
    match registry.resolve(context, ip) {
        Some(resolution) => resolution.to_string(),
        None => format!("{ip:x}"),
    }
}

/// Raw instruction bytes: `401000 insn: 55 48 89 e5`
#[must_use]
pub fn insn_bytes(insn: &InsnEvent) -> String {
    let mut line = format!("{:x} insn:", insn.ip);
    for byte in insn.bytes() {
        let _ = write!(line, " {byte:02x}");
    }
    line
}

/// Transaction and lifecycle markers, indented to the current level
#[must_use]
pub fn marker(indent: usize, name: &str) -> String {
    format!("{:indent$}{name}", "")
}

/// Operation line for a non-call instruction
#[must_use]
pub fn operation(stamp: &str, indent: usize, insns: u64, is_return: bool, target: &str) -> String {
    let ret = if is_return { "return " } else { "" };
    format!("{stamp:<TIME_WIDTH$}{:indent$}[+{insns:>4}] {ret}{target}", "")
}

/// Call line; blank time column when no time field is due
#[must_use]
pub fn call(stamp: Option<&str>, insns: u64, indent: usize, origin: &str, target: &str) -> String {
    let stamp = stamp.unwrap_or_default();
    format!("{stamp:<TIME_WIDTH$}[+{insns:>4}] {:indent$}call {origin} -> {target}", "")
}
