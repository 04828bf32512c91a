//! Event-log trace decoder
//!
//! Reads traces that were already decoded to instruction level and stored
//! as JSON lines, one record per line:
//!
//! ```text
//! {"kind":"sync"}
//! {"kind":"insn","ip":4194304,"raw":"55","time":1200,"context":1,"enabled":true}
//! {"kind":"insn","ip":4194305,"raw":"e8 fa 00 00 00","iclass":"call"}
//! {"kind":"error","message":"packet overflow"}
//! ```
//!
//! The start of the log is a synchronization point, and so is every `sync`
//! record. `time` and `context` stay in effect until a later record
//! changes them. `error` records and lines that fail to parse are decode
//! faults at their byte offset; decoding resumes at the next `sync`.

use ptscope_common::{DecodeError, InsnClass, InsnDecoder, InsnEvent};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::domain::SetupError;

/// One line of the event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Sync,
    Insn(InsnRecord),
    Error { message: String },
}

/// An instruction record; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsnRecord {
    pub ip: u64,
    /// Instruction bytes as hex, whitespace ignored
    pub raw: String,
    pub iclass: InsnClass,
    pub time: Option<u64>,
    pub context: Option<u64>,
    pub disabled: bool,
    pub enabled: bool,
    pub resumed: bool,
    pub interrupted: bool,
    pub resynced: bool,
    pub speculative: bool,
    pub aborted: bool,
    pub committed: bool,
}

impl InsnRecord {
    pub fn new(ip: u64, iclass: InsnClass) -> Self {
        Self { ip, iclass, ..Self::default() }
    }

    fn to_event(&self) -> Result<InsnEvent, String> {
        let mut insn = InsnEvent::new(self.ip, self.iclass);
        insn.set_bytes(&parse_bytes(&self.raw)?);
        insn.disabled = self.disabled;
        insn.enabled = self.enabled;
        insn.resumed = self.resumed;
        insn.interrupted = self.interrupted;
        insn.resynced = self.resynced;
        insn.speculative = self.speculative;
        insn.aborted = self.aborted;
        insn.committed = self.committed;
        Ok(insn)
    }
}

fn parse_bytes(hex: &str) -> Result<Vec<u8>, String> {
    let digits: Vec<u8> = hex.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits in {hex:?}"));
    }
    digits
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| format!("bad instruction bytes {hex:?}"))
        })
        .collect()
}

/// [`InsnDecoder`] over a JSON-lines event log
///
/// Records are parsed lazily as the annotator asks for them.
pub struct EventLogDecoder {
    text: String,
    /// Byte position of the next unread line
    pos: usize,
    /// Byte offset of the record decoded last
    offset: u64,
    time: u64,
    context: u64,
    started: bool,
}

impl EventLogDecoder {
    /// Decoder over an event log already in memory
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into(), pos: 0, offset: 0, time: 0, context: 0, started: false }
    }

    /// Read an event log file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SetupError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|source| SetupError::TraceUnreadable { path: path.to_path_buf(), source })?;
        Ok(Self::from_text(text))
    }

    /// Next non-blank line and its byte offset
    fn next_line(&mut self) -> Option<(u64, &str)> {
        while self.pos < self.text.len() {
            let start = self.pos;
            let end = self.text[start..].find('\n').map_or(self.text.len(), |i| start + i);
            self.pos = end + 1;

            let line = self.text[start..end].trim();
            if !line.is_empty() {
                return Some((start as u64, line));
            }
        }
        None
    }
}

impl InsnDecoder for EventLogDecoder {
    fn sync_forward(&mut self) -> Result<(), DecodeError> {
        if !self.started {
            self.started = true;
            if !self.text.trim().is_empty() {
                return Ok(());
            }
        }

        while let Some((offset, line)) = self.next_line() {
            if matches!(serde_json::from_str::<Record>(line), Ok(Record::Sync)) {
                self.offset = offset;
                return Ok(());
            }
        }
        Err(DecodeError::EndOfStream)
    }

    fn next_insn(&mut self) -> Result<InsnEvent, DecodeError> {
        loop {
            let Some((offset, line)) = self.next_line() else {
                return Err(DecodeError::EndOfStream);
            };
            let record = serde_json::from_str::<Record>(line);
            self.offset = offset;

            match record {
                Ok(Record::Sync) => {}
                Ok(Record::Insn(record)) => {
                    let insn = record.to_event().map_err(DecodeError::Fault)?;
                    if let Some(time) = record.time {
                        self.time = time;
                    }
                    if let Some(context) = record.context {
                        self.context = context;
                    }
                    return Ok(insn);
                }
                Ok(Record::Error { message }) => return Err(DecodeError::Fault(message)),
                Err(err) => return Err(DecodeError::Fault(format!("malformed record: {err}"))),
            }
        }
    }

    fn time(&self) -> u64 {
        self.time
    }

    fn context(&self) -> u64 {
        self.context
    }

    fn offset(&self) -> u64 {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_format() {
        let record: Record = serde_json::from_str(
            r#"{"kind":"insn","ip":4096,"iclass":"far_call","raw":"ff 1c 25","time":7}"#,
        )
        .unwrap();
        let Record::Insn(insn) = record else { panic!("not an insn record") };
        assert_eq!(insn.ip, 0x1000);
        assert_eq!(insn.iclass, InsnClass::FarCall);
        assert_eq!(insn.time, Some(7));
        assert_eq!(insn.context, None);
        assert!(!insn.speculative);

        assert_eq!(serde_json::from_str::<Record>(r#"{"kind":"sync"}"#).unwrap(), Record::Sync);
    }

    #[test]
    fn test_decodes_with_sticky_time_and_context() {
        let mut decoder = EventLogDecoder::from_text(
            r#"{"kind":"insn","ip":16,"time":100,"context":2}
{"kind":"insn","ip":20,"raw":"c3","iclass":"return"}
"#,
        );
        decoder.sync_forward().unwrap();

        let first = decoder.next_insn().unwrap();
        assert_eq!(first.ip, 16);
        assert_eq!((decoder.time(), decoder.context()), (100, 2));

        let second = decoder.next_insn().unwrap();
        assert_eq!(second.iclass, InsnClass::Return);
        assert_eq!(second.bytes(), &[0xc3]);
        assert_eq!((decoder.time(), decoder.context()), (100, 2));

        assert_eq!(decoder.next_insn().unwrap_err(), DecodeError::EndOfStream);
    }

    #[test]
    fn test_fault_then_resync() {
        let text = "{\"kind\":\"insn\",\"ip\":1}\n\
                    not json\n\
                    {\"kind\":\"insn\",\"ip\":2}\n\
                    {\"kind\":\"sync\"}\n\
                    {\"kind\":\"insn\",\"ip\":3}\n";
        let mut decoder = EventLogDecoder::from_text(text);

        decoder.sync_forward().unwrap();
        assert_eq!(decoder.next_insn().unwrap().ip, 1);

        let err = decoder.next_insn().unwrap_err();
        assert!(matches!(err, DecodeError::Fault(ref m) if m.starts_with("malformed record")));
        assert_eq!(decoder.offset(), text.find("not json").unwrap() as u64);

        // Skips ip 2, which lies before the next sync point
        decoder.sync_forward().unwrap();
        assert_eq!(decoder.next_insn().unwrap().ip, 3);
        assert_eq!(decoder.sync_forward().unwrap_err(), DecodeError::EndOfStream);
    }

    #[test]
    fn test_error_record_is_a_fault() {
        let mut decoder =
            EventLogDecoder::from_text("{\"kind\":\"error\",\"message\":\"overflow\"}\n");
        decoder.sync_forward().unwrap();
        assert_eq!(decoder.next_insn().unwrap_err(), DecodeError::Fault("overflow".into()));
    }

    #[test]
    fn test_empty_log_has_no_sync_point() {
        let mut decoder = EventLogDecoder::from_text("\n  \n");
        assert_eq!(decoder.sync_forward().unwrap_err(), DecodeError::EndOfStream);
    }

    #[test]
    fn test_parse_bytes() {
        assert_eq!(parse_bytes("55 48 89e5").unwrap(), vec![0x55, 0x48, 0x89, 0xe5]);
        assert_eq!(parse_bytes("").unwrap(), Vec::<u8>::new());
        assert!(parse_bytes("5").is_err());
        assert!(parse_bytes("zz").is_err());
    }

    #[test]
    fn test_missing_trace_file() {
        let err = EventLogDecoder::open("/nonexistent/trace.jsonl").err().unwrap();
        assert!(matches!(err, SetupError::TraceUnreadable { .. }));
    }
}
