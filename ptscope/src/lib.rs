//! # ptscope - Symbolicated Instruction Trace Timeline
//!
//! ptscope renders a hardware instruction-execution trace as a readable
//! timeline: calls and returns indented by call depth, hardware
//! transactions, tracing start/stop events, elapsed time, and function
//! names resolved across every binary and process in the trace.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Trace file  │   │ Sideband log │   │  --elf bins  │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        │                  │                  │
//!        ▼                  ▼                  ▼
//! ┌──────────────┐   ┌─────────────────────────────────┐
//! │   Decoder    │   │   Symbol loader (object ELF)    │
//! │ (InsnDecoder)│   └───────────────┬─────────────────┘
//! └──────┬───────┘                   ▼
//!        │            ┌─────────────────────────────────┐
//!        │            │      Address space registry     │
//!        │            │  context → [binding + bias]...  │
//!        │            └───────────────┬─────────────────┘
//!        │ instruction events         │ resolve(ctx, ip)
//!        ▼                            ▼
//! ┌─────────────────────────────────────────────────────┐
//! │                     Annotator                       │
//! │  per-segment state: call depth, transactions, time  │
//! │  + time normalizer (TSC ticks → µs)                 │
//! └──────────────────────────┬──────────────────────────┘
//!                            ▼
//!                  annotated text timeline
//! ```
//!
//! ## Module Structure
//!
//! - [`annotate`]: the per-instruction state machine and line rendering
//! - [`symbolization`]: symbol tables, the address space registry, sideband
//!   logs
//! - [`timing`]: timestamp scaling
//! - [`decoding`]: the JSON-lines event-log decoder
//! - [`preflight`]: input validation before setup
//! - [`cli`]: command-line arguments
//! - [`domain`]: newtypes ([`domain::ContextId`], [`domain::LoadBias`],
//!   [`domain::Tsc`]) and errors
//!
//! Instruction events and the decoder trait live in `ptscope-common`, so
//! other decoders can feed the annotator.
//!
//! ## Output
//!
//! ```text
//! TIME       DELTA    INSNs   OPERATION
//! enabled
//!                         [+   2] call main -> helper
//! 12        [+12]         [+   3] return helper+0x20
//! ```
//!
//! Operation lines carry the number of instructions executed since the
//! previous operation line. With coarse timestamps most instructions are
//! folded into the next line whose time differs.

pub mod annotate;
pub mod cli;
pub mod decoding;
pub mod domain;
pub mod preflight;
pub mod symbolization;
pub mod timing;
