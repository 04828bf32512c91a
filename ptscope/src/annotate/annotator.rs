//! # Instruction Event Annotation
//!
//! Consumes decoded instructions segment by segment and writes the
//! symbolicated timeline.
//!
//! ## Per-Instruction Steps
//!
//! ```text
//! count → [raw bytes] → transaction markers → lifecycle markers
//!       → timestamp gate → call | return | default report
//! ```
//!
//! The timestamp gate decides output density: with coarse timestamps many
//! instructions share one time value, and only the instruction at which
//! the time changes gets an operation line (carrying the count of the
//! instructions folded into it). Calls are the exception: every call is
//! printed, with a blank time column when no time field is due. The
//! instruction after a call is its target: it is consumed by the call and
//! only counted, as the first instruction of the callee's group.
//!
//! ## Segments and Errors
//!
//! Each synchronization point starts a segment with fresh
//! [`AnnotatorState`]. A decode fault ends the segment with an inline
//! `offset:ip: error ...` line and annotation continues at the next
//! synchronization point. End-of-stream ends the pass.

use log::{debug, info, warn};
use ptscope_common::{DecodeError, InsnDecoder};
use std::fmt;
use std::io::{self, Write};

use super::format;
use super::stream::{Decoded, EventStream};
use super::state::AnnotatorState;
use crate::domain::AnnotateError;
use crate::symbolization::AddressSpaceRegistry;
use crate::timing::TimeNormalizer;

/// What an annotation pass went through
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AnnotationSummary {
    /// Synchronization points reached
    pub segments: usize,
    /// Instructions processed, call targets included
    pub instructions: u64,
    /// Segments ended by a decode fault
    pub segment_errors: usize,
    /// Set when synchronization itself failed for a reason other than end-of-stream
    pub sync_failure: Option<DecodeError>,
}

impl fmt::Display for AnnotationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} instructions in {} segments, {} decode errors",
            self.instructions, self.segments, self.segment_errors
        )?;
        if let Some(ref err) = self.sync_failure {
            write!(f, ", sync failed: {err}")?;
        }
        Ok(())
    }
}

/// Why processing of one instruction stopped early
enum Stop {
    /// The segment ended while reading a call target
    Decode(DecodeError),
    Output(io::Error),
}

impl From<io::Error> for Stop {
    fn from(err: io::Error) -> Self {
        Stop::Output(err)
    }
}

/// Writes the annotated timeline of a decoded trace
pub struct Annotator<'a, W: Write> {
    registry: &'a AddressSpaceRegistry,
    time: TimeNormalizer,
    dump_insn: bool,
    out: W,
}

impl<'a, W: Write> Annotator<'a, W> {
    pub fn new(registry: &'a AddressSpaceRegistry, time: TimeNormalizer, out: W) -> Self {
        Self { registry, time, dump_insn: false, out }
    }

    /// Also print the raw bytes of every instruction
    #[must_use]
    pub fn with_insn_dump(mut self, dump_insn: bool) -> Self {
        self.dump_insn = dump_insn;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Annotate a whole trace: header, then every segment until end-of-stream
    ///
    /// # Errors
    /// Only output failures abort the pass; decode faults are reported inline
    pub fn run<D: InsnDecoder>(&mut self, decoder: D) -> Result<AnnotationSummary, AnnotateError> {
        let mut stream = EventStream::new(decoder);
        let mut summary = AnnotationSummary::default();

        writeln!(self.out, "{}", format::header())?;

        loop {
            if let Err(err) = stream.sync_forward() {
                if !err.is_end_of_stream() {
                    warn!("Synchronization failed at {:#x}: {err}", stream.offset());
                    writeln!(self.out, "{:x}: sync forward: {err}", stream.offset())?;
                    summary.sync_failure = Some(err);
                }
                break;
            }

            summary.segments += 1;
            debug!("Segment {} starts at {:#x}", summary.segments, stream.offset());

            let (err, last_ip) = self.run_segment(&mut stream, &mut summary)?;
            if err.is_end_of_stream() {
                break;
            }

            summary.segment_errors += 1;
            warn!("Decode error at {:#x} (ip {last_ip:#x}): {err}", stream.offset());
            writeln!(self.out, "{:x}:{last_ip:x}: error {err}", stream.offset())?;
        }

        self.out.flush()?;
        info!("Annotated {summary}");
        Ok(summary)
    }

    /// Process one segment; returns the error that ended it and the last ip seen
    fn run_segment<D: InsnDecoder>(
        &mut self,
        stream: &mut EventStream<D>,
        summary: &mut AnnotationSummary,
    ) -> Result<(DecodeError, u64), AnnotateError> {
        let mut state = AnnotatorState::new();
        let mut last_ip = 0;

        loop {
            let decoded = match stream.next_decoded() {
                Ok(decoded) => decoded,
                Err(err) => return Ok((err, last_ip)),
            };
            last_ip = decoded.insn.ip;
            summary.instructions += 1;

            match self.process(&mut state, &decoded, stream, summary) {
                Ok(ip) => last_ip = ip,
                Err(Stop::Decode(err)) => return Ok((err, last_ip)),
                Err(Stop::Output(err)) => return Err(err.into()),
            }
        }
    }

    /// Annotate one instruction; returns the ip of the last instruction
    /// consumed, which is the call target for calls
    fn process<D: InsnDecoder>(
        &mut self,
        state: &mut AnnotatorState,
        decoded: &Decoded,
        stream: &mut EventStream<D>,
        summary: &mut AnnotationSummary,
    ) -> Result<u64, Stop> {
        let insn = &decoded.insn;

        state.count_insn();
        if self.dump_insn {
            writeln!(self.out, "{}", format::insn_bytes(insn))?;
        }

        if state.enter_speculation(insn.speculative) {
            writeln!(self.out, "{}", format::marker(state.indent(), "transaction"))?;
            state.push_indent();
        }
        if insn.aborted {
            writeln!(self.out, "{}", format::marker(state.indent(), "aborted"))?;
            state.pop_indent();
        }
        if insn.committed {
            writeln!(self.out, "{}", format::marker(state.indent(), "committed"))?;
            state.pop_indent();
        }

        if insn.has_lifecycle_event() {
            let lifecycle = [
                (insn.disabled, "disabled"),
                (insn.enabled, "enabled"),
                (insn.resumed, "resumed"),
                (insn.interrupted, "interrupted"),
                (insn.resynced, "resynced"),
            ];
            for (_, name) in lifecycle.iter().filter(|(set, _)| *set) {
                writeln!(self.out, "{name}")?;
            }
        }

        let stamp = state
            .observe_time(decoded.time)
            .map(|(elapsed, delta)| self.time.format_stamp(elapsed, delta));

        if insn.iclass.is_call() {
            let target = stream.next_decoded().map_err(Stop::Decode)?;
            summary.instructions += 1;

            let origin = format::symbolize(self.registry, decoded.context, insn.ip);
            let callee = format::symbolize(self.registry, target.context, target.insn.ip);
            let insns = state.take_insn_count();
            let line = format::call(stamp.as_deref(), insns, state.indent(), &origin, &callee);
            writeln!(self.out, "{line}")?;

            // The target opens the callee's group
            state.count_insn();
            state.push_indent();
            return Ok(target.insn.ip);
        }

        let is_return = insn.iclass.is_return();
        if is_return {
            state.pop_indent();
        }

        if let Some(stamp) = stamp {
            let target = format::symbolize(self.registry, decoded.context, insn.ip);
            let insns = state.take_insn_count();
            let line = format::operation(&stamp, state.indent(), insns, is_return, &target);
            writeln!(self.out, "{line}")?;
        }

        Ok(insn.ip)
    }
}
