//! Trace timestamp scaling
//!
//! Without a clock frequency, raw timestamps are shown as an opaque,
//! monotonically increasing counter. With a TSC frequency in GHz they are
//! shown as microseconds.

// Tick counts are shown as floating point; precision loss is acceptable for display
#![allow(clippy::cast_precision_loss)]

/// Convert raw ticks to microseconds at `freq_ghz`
///
/// A frequency of zero leaves the value unscaled.
#[must_use]
pub fn normalize(raw_ticks: u64, freq_ghz: f64) -> f64 {
    if freq_ghz == 0.0 {
        return raw_ticks as f64;
    }
    raw_ticks as f64 / (freq_ghz * 1000.0)
}

/// Formats elapsed/delta time fields for the timeline
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeNormalizer {
    freq_ghz: f64,
}

impl TimeNormalizer {
    #[must_use]
    pub fn new(freq_ghz: f64) -> Self {
        Self { freq_ghz }
    }

    #[must_use]
    pub fn freq_ghz(&self) -> f64 {
        self.freq_ghz
    }

    /// True when timestamps are shown as real time
    #[must_use]
    pub fn has_frequency(&self) -> bool {
        self.freq_ghz != 0.0
    }

    #[must_use]
    pub fn normalize(&self, raw_ticks: u64) -> f64 {
        normalize(raw_ticks, self.freq_ghz)
    }

    /// Decimal places shown: 3 for microseconds, none for raw counters
    #[must_use]
    pub fn precision(&self) -> usize {
        if self.has_frequency() {
            3
        } else {
            0
        }
    }

    /// Render `"{elapsed} [+{delta}]"` from raw tick counts
    #[must_use]
    pub fn format_stamp(&self, elapsed_ticks: u64, delta_ticks: u64) -> String {
        let prec = self.precision();
        format!(
            "{:<9.prec$} [+{:.prec$}]",
            self.normalize(elapsed_ticks),
            self.normalize(delta_ticks)
        )
    }
}
