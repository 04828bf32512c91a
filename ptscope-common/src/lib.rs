//! # Shared Instruction Event Model (Decoder ↔ Annotator)
//!
//! Defines the instruction events a trace decoder hands to the annotator,
//! and the [`InsnDecoder`] trait every decoder implements. Keeping these in
//! their own crate lets alternative decoders (a hardware trace library
//! binding, a replayed event log, a test script) plug in without depending
//! on the annotator.
//!
//! ## Key Types
//!
//! - [`InsnEvent`] - One retired (or speculatively executed) instruction
//! - [`InsnClass`] - Control-flow classification the annotator branches on
//! - [`InsnDecoder`] - Restartable, synchronizing event source
//! - [`DecodeError`] - Why the decoder could not produce the next event

use thiserror::Error;

// ============================================================================
// Instruction Classification
// ============================================================================

/// Control-flow class of an instruction
///
/// Only the classes the annotator reacts to are distinguished; every other
/// instruction (jumps, arithmetic, ...) is [`InsnClass::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InsnClass {
    Call,
    FarCall,
    Return,
    FarReturn,
    #[default]
    Other,
}

impl InsnClass {
    /// Near or far call
    #[must_use]
    pub fn is_call(self) -> bool {
        matches!(self, Self::Call | Self::FarCall)
    }

    /// Near or far return
    #[must_use]
    pub fn is_return(self) -> bool {
        matches!(self, Self::Return | Self::FarReturn)
    }
}

// ============================================================================
// Instruction Event
// ============================================================================

/// Maximum encoded length of one x86 instruction
pub const MAX_INSN_SIZE: usize = 15;

/// One decoded instruction and the trace state attached to it
///
/// The lifecycle flags (`disabled` .. `resynced`) and the transaction flags
/// (`speculative`, `aborted`, `committed`) describe tracing events the
/// decoder observed right before this instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsnEvent {
    pub ip: u64,
    pub raw: [u8; MAX_INSN_SIZE],
    pub size: u8,
    pub iclass: InsnClass,

    /// Tracing was disabled after this instruction
    pub disabled: bool,
    /// Tracing was (re-)enabled at this instruction
    pub enabled: bool,
    /// Tracing resumed at this instruction after an interrupt
    pub resumed: bool,
    /// Execution was interrupted after this instruction
    pub interrupted: bool,
    /// The decoder re-synchronized at this instruction
    pub resynced: bool,

    /// Executed inside a hardware transaction
    pub speculative: bool,
    /// The enclosing transaction aborted
    pub aborted: bool,
    /// The enclosing transaction committed
    pub committed: bool,
}

impl InsnEvent {
    /// Plain instruction at `ip`
    #[must_use]
    pub fn new(ip: u64, iclass: InsnClass) -> Self {
        Self { ip, iclass, ..Self::default() }
    }

    /// The encoded bytes actually used by this instruction
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        let len = usize::from(self.size).min(MAX_INSN_SIZE);
        &self.raw[..len]
    }

    /// Copy `bytes` into the raw buffer, truncating at [`MAX_INSN_SIZE`]
    #[allow(clippy::cast_possible_truncation)] // len <= MAX_INSN_SIZE
    pub fn set_bytes(&mut self, bytes: &[u8]) {
        let len = bytes.len().min(MAX_INSN_SIZE);
        self.raw = [0; MAX_INSN_SIZE];
        self.raw[..len].copy_from_slice(&bytes[..len]);
        self.size = len as u8;
    }

    /// Any tracing lifecycle flag set
    #[must_use]
    pub fn has_lifecycle_event(&self) -> bool {
        self.disabled || self.enabled || self.resumed || self.interrupted || self.resynced
    }
}

// ============================================================================
// Decoder Interface
// ============================================================================

/// Why the decoder could not produce an event or a synchronization point
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// No more data. Not a failure: annotation ends successfully.
    #[error("end of stream")]
    EndOfStream,

    /// Decoding lost synchronization with the trace
    #[error("no synchronization")]
    NoSync,

    /// Any other decode fault, described by the decoder
    #[error("{0}")]
    Fault(String),
}

impl DecodeError {
    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }
}

/// A restartable source of instruction events
///
/// Decoding proceeds in segments: [`sync_forward`](Self::sync_forward)
/// positions the decoder at the next synchronization point, then
/// [`next_insn`](Self::next_insn) yields events until it fails. After a
/// failure other than [`DecodeError::EndOfStream`] the caller may sync
/// forward again to skip the damaged region.
pub trait InsnDecoder {
    /// Move to the next synchronization point
    ///
    /// # Errors
    /// [`DecodeError::EndOfStream`] when no synchronization point is left,
    /// any other variant when synchronizing failed.
    fn sync_forward(&mut self) -> Result<(), DecodeError>;

    /// Decode the next instruction of the current segment
    ///
    /// # Errors
    /// [`DecodeError::EndOfStream`] at the end of the trace, any other
    /// variant when the segment is broken.
    fn next_insn(&mut self) -> Result<InsnEvent, DecodeError>;

    /// Timestamp of the most recently decoded instruction (0 if unknown)
    fn time(&self) -> u64;

    /// Address-space context of the most recently decoded instruction
    /// (0 if the trace carries none)
    fn context(&self) -> u64;

    /// Byte offset of the decoder in the trace
    fn offset(&self) -> u64;
}

impl<D: InsnDecoder + ?Sized> InsnDecoder for Box<D> {
    fn sync_forward(&mut self) -> Result<(), DecodeError> {
        (**self).sync_forward()
    }

    fn next_insn(&mut self) -> Result<InsnEvent, DecodeError> {
        (**self).next_insn()
    }

    fn time(&self) -> u64 {
        (**self).time()
    }

    fn context(&self) -> u64 {
        (**self).context()
    }

    fn offset(&self) -> u64 {
        (**self).offset()
    }
}
