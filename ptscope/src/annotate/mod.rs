//! Timeline annotation
//!
//! - `state`: per-segment call depth, transaction and timing state
//! - `stream`: decoded events with their time and context
//! - `format`: line rendering
//! - `annotator`: the per-instruction state machine

pub mod annotator;
pub mod format;
pub mod state;
pub mod stream;

pub use annotator::{AnnotationSummary, Annotator};
pub use state::AnnotatorState;
pub use stream::{Decoded, EventStream};
