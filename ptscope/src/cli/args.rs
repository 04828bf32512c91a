//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::symbolization::BinarySpec;

#[derive(Parser, Debug)]
#[command(
    name = "ptscope",
    version,
    about = "Annotate an instruction trace with calls, returns, timing and symbols",
    after_help = "\
EXAMPLES:
    ptscope -p trace.jsonl -e ./app                      Single binary, default context
    ptscope -p trace.jsonl -e ./lib.so:7f0000000000:1a   Binary loaded at 0x7f0000000000 in context 0x1a
    ptscope -p trace.jsonl -s sideband.log -f 2.4        Binaries from a sideband log, 2.4 GHz TSC

Set RUST_LOG=info (or debug) for setup and segment diagnostics on stderr."
)]
pub struct Args {
    /// Trace to annotate (JSON-lines instruction event log)
    #[arg(short = 'p', long, value_name = "FILE")]
    pub trace: PathBuf,

    /// Binary for symbol resolution as PATH[:LOAD[:CONTEXT]], hex, repeatable.
    /// Only trailing hex fields are read as LOAD/CONTEXT, so PATH may contain ':'
    #[arg(short, long, value_name = "SPEC")]
    pub elf: Vec<BinarySpec>,

    /// Sideband log of "<ts> <context> <load> <path>" records, repeatable
    #[arg(short, long, value_name = "FILE")]
    pub sideband: Vec<PathBuf>,

    /// TSC frequency in GHz to convert timestamps to microseconds (0 = raw ticks)
    #[arg(short, long, value_name = "GHZ", default_value = "0")]
    pub freq: f64,

    /// Dump raw instruction bytes for every instruction
    #[arg(short, long)]
    pub insn: bool,

    /// Write the timeline to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContextId, LoadBias};

    #[test]
    fn test_minimal_args() {
        let args = Args::try_parse_from(["ptscope", "--trace", "t.jsonl"]).unwrap();
        assert_eq!(args.trace, PathBuf::from("t.jsonl"));
        assert!(args.elf.is_empty());
        assert!(args.sideband.is_empty());
        assert_eq!(args.freq, 0.0);
        assert!(!args.insn);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_short_flags_and_repeats() {
        let args = Args::try_parse_from([
            "ptscope", "-p", "t.jsonl", "-e", "a.out", "-e", "lib.so:10000:2", "-s", "sb.log",
            "-f", "2.5", "-i", "-q",
        ])
        .unwrap();

        assert_eq!(args.elf.len(), 2);
        assert_eq!(args.elf[1].load_bias, LoadBias(0x10000));
        assert_eq!(args.elf[1].context, ContextId(2));
        assert_eq!(args.sideband, vec![PathBuf::from("sb.log")]);
        assert_eq!(args.freq, 2.5);
        assert!(args.insn);
        assert!(args.quiet);
    }

    #[test]
    fn test_trace_is_required() {
        assert!(Args::try_parse_from(["ptscope", "-e", "a.out"]).is_err());
    }

    #[test]
    fn test_bad_binary_spec_rejected() {
        assert!(Args::try_parse_from(["ptscope", "-p", "t", "-e", "a.out:nothex"]).is_err());
    }
}
