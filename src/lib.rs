//! Baton: cooperative finite state machines that pass control like a relay baton.
//!
//! Every state of an automaton is a suspendable unit wrapping a handler. An
//! event sent to an automaton wakes its current state; the handler inspects or
//! rewrites the event, and the automaton routes the outgoing event to the next
//! state, possibly a state of another automaton. The chain runs on the calling
//! thread until a handler invalidates its event, which parks the machine.
//!
//! # Core Concepts
//!
//! - **Family**: compile-time choice of id and payload types for a set of
//!   cooperating automatons
//! - **Event**: an id plus a payload, invalidated to mean "stop here"
//! - **State unit**: a named, suspendable handler
//! - **Automaton**: states, a transition table and the resolution loop
//! - **Trace**: an observer notified of every resolved transition
//!
//! # Example
//!
//! ```rust
//! use baton::builder::AutomatonBuilder;
//! use baton::core::{Event, Family};
//! use baton::trace::TraceLog;
//!
//! struct Relay;
//!
//! impl Family for Relay {
//!     type AutomatonId = &'static str;
//!     type StateId = &'static str;
//!     type EventId = &'static str;
//!     type Payload = ();
//! }
//!
//! let log = TraceLog::new();
//! let green = AutomatonBuilder::<Relay>::new("green_fsm")
//!     .state("idle", |_fsm, event| {
//!         event.invalidate();
//!         Ok(())
//!     })
//!     .tracer(log.sink())
//!     .initial("idle")
//!     .build()
//!     .unwrap();
//! let red = AutomatonBuilder::<Relay>::new("red_fsm")
//!     .state("idle", |_fsm, _event| Ok(()))
//!     .remote_transition("idle", "hand_over", "idle", &green)
//!     .tracer(log.sink())
//!     .initial("idle")
//!     .build()
//!     .unwrap();
//!
//! red.send_event(Event::signal("hand_over")).unwrap();
//!
//! assert!(!red.is_active());
//! assert_eq!(log.snapshot().get_baton_path(), vec!["red_fsm", "green_fsm"]);
//! ```

pub mod automaton;
pub mod builder;
pub mod core;
pub mod trace;

// Re-export commonly used types
pub use automaton::{Automaton, FsmError, HandlerError, HandlerResult, MachineView, Transition};
pub use builder::{AutomatonBuilder, BuildError};
pub use crate::core::{Event, Family, Label, StateUnit};
pub use trace::{TraceLog, TraceSink, Transit};
