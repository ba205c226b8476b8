//! Automatons and the transition-resolution engine.
//!
//! # Key Concepts
//!
//! - **Automaton**: owns state units and a transition table, and drives them
//!   cooperatively from whichever thread calls `send_event`
//! - **Transition table**: `(state, event id) -> (state, automaton)`; the
//!   destination may live in another automaton (a hand-off)
//! - **Parking**: a handler that invalidates its event stops the chain and
//!   returns control to the caller of `send_event`

mod error;
mod machine;
mod transition;

pub use error::{FsmError, HandlerError, HandlerResult, Result};
pub use machine::{Automaton, MachineView};
pub use transition::{Transition, TransitionRecord};
