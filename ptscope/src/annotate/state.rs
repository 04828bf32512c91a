use crate::domain::Tsc;

/// Indentation added per call level or open transaction
pub const INDENT_STEP: u32 = 4;

/// Per-segment annotation state
///
/// Created fresh at every synchronization point and dropped when the
/// segment ends; nothing carries over between segments.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AnnotatorState {
    indent: u32,
    prev_speculative: bool,
    insn_count: u64,
    last_timestamp: Tsc,
    first_timestamp: Tsc,
}

impl AnnotatorState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current indentation in columns (always a multiple of [`INDENT_STEP`])
    #[must_use]
    pub fn indent(&self) -> usize {
        self.indent as usize
    }

    pub fn push_indent(&mut self) {
        self.indent = self.indent.saturating_add(INDENT_STEP);
    }

    /// Remove one level, never going below zero
    pub fn pop_indent(&mut self) {
        self.indent = self.indent.saturating_sub(INDENT_STEP);
    }

    pub fn count_insn(&mut self) {
        self.insn_count += 1;
    }

    /// Return the pending instruction count and restart it
    pub fn take_insn_count(&mut self) -> u64 {
        std::mem::take(&mut self.insn_count)
    }

    /// Record the speculation flag of an instruction
    ///
    /// Returns true when execution enters a transaction, i.e. on the
    /// transition from non-speculative to speculative.
    pub fn enter_speculation(&mut self, speculative: bool) -> bool {
        let entered = speculative && !self.prev_speculative;
        self.prev_speculative = speculative;
        entered
    }

    /// Observe the current trace timestamp
    ///
    /// Returns `(elapsed, delta)` ticks when a time field is due: the
    /// timestamp changed since the last known one. Unknown (zero)
    /// timestamps never become the reference point.
    pub fn observe_time(&mut self, now: Tsc) -> Option<(u64, u64)> {
        let due = self.last_timestamp.is_known() && now != self.last_timestamp;
        let fields =
            due.then(|| (now.since(self.first_timestamp), now.since(self.last_timestamp)));

        if now.is_known() {
            self.last_timestamp = now;
            if !self.first_timestamp.is_known() {
                self.first_timestamp = now;
            }
        }

        fields
    }
}
