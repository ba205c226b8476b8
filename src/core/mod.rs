//! Building blocks of a machine family.
//!
//! - Identifier traits via `Label` and `Family`
//! - Events that carry an id and a payload
//! - State units, the suspendable computations behind every state

mod event;
mod label;
mod unit;

pub use event::Event;
pub use label::{Family, Label};
pub use unit::{Handler, Phase, StateUnit};

pub(crate) use unit::ResumeFault;
