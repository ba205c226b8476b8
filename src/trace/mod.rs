//! Transition tracing.
//!
//! Every transition an automaton resolves is reported once, as a [`Transit`],
//! to the automaton's trace sink (if one is set). Two sinks are built in:
//!
//! - [`tracing_sink`] writes each transit as a structured `tracing` event
//! - [`TraceLog`] records transits with timestamps for later inspection

mod history;
mod sink;

pub use history::{TraceEntry, TraceHistory, TraceLog};
pub use sink::{sink_fn, tracing_sink, TraceSink, Transit};
