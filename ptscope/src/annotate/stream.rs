use ptscope_common::{DecodeError, InsnDecoder, InsnEvent};

use crate::domain::{ContextId, Tsc};

/// An instruction together with the decoder state captured right after it
/// was decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub insn: InsnEvent,
    pub time: Tsc,
    pub context: ContextId,
}

/// Decoder wrapper yielding [`Decoded`] events
///
/// Call handling pulls the call target from the same stream as the main
/// loop, so a target is consumed exactly once.
pub struct EventStream<D> {
    decoder: D,
}

impl<D: InsnDecoder> EventStream<D> {
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }

    /// Move to the next synchronization point
    ///
    /// # Errors
    /// Propagates the decoder's synchronization error
    pub fn sync_forward(&mut self) -> Result<(), DecodeError> {
        self.decoder.sync_forward()
    }

    /// Decode the next event and capture its time and context
    ///
    /// # Errors
    /// Propagates the decoder's error, including end-of-stream
    pub fn next_decoded(&mut self) -> Result<Decoded, DecodeError> {
        let insn = self.decoder.next_insn()?;
        Ok(Decoded {
            insn,
            time: Tsc(self.decoder.time()),
            context: ContextId(self.decoder.context()),
        })
    }

    /// Byte offset of the underlying decoder
    pub fn offset(&self) -> u64 {
        self.decoder.offset()
    }
}
