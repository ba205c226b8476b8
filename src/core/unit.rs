//! State units: the suspendable computations behind every state.
//!
//! A state unit loops forever: wait for an event, run the handler, hand the
//! event back to the automaton, wait again. The loop is not a language
//! coroutine; its position is the explicit [`Phase`] below, and the automaton
//! drives it by taking the handler out while it runs and putting it back when
//! the unit suspends.

use super::event::Event;
use super::label::Family;
use crate::automaton::{HandlerResult, MachineView};
use std::fmt;

/// Callable run by a state unit each time it receives an event.
///
/// The handler mutates the event in place to select the next outgoing event,
/// or invalidates it to park the automaton.
pub type Handler<F> =
    Box<dyn FnMut(&MachineView<'_, F>, &mut Event<F>) -> HandlerResult + Send + 'static>;

/// Position of a state unit in its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Created but never started.
    Initial,
    /// Suspended, waiting for the next event.
    Awaiting,
    /// Handler is executing.
    Running,
}

/// Why a unit refused to resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResumeFault {
    NotStarted,
    AlreadyRunning,
    Hollow,
}

/// A named, move-only suspendable computation.
///
/// # Example
///
/// ```rust
/// use baton::core::{Family, StateUnit};
///
/// struct Tick;
///
/// impl Family for Tick {
///     type AutomatonId = u8;
///     type StateId = &'static str;
///     type EventId = &'static str;
///     type Payload = ();
/// }
///
/// let unit = StateUnit::<Tick>::new("idle", |_fsm, event| {
///     event.invalidate();
///     Ok(())
/// });
///
/// assert_eq!(unit.id(), "idle");
/// assert!(!unit.is_started());
/// ```
pub struct StateUnit<F: Family> {
    id: F::StateId,
    phase: Phase,
    handler: Option<Handler<F>>,
}

impl<F: Family> StateUnit<F> {
    /// Create a unit suspended before its first step.
    pub fn new<H>(id: F::StateId, handler: H) -> Self
    where
        H: FnMut(&MachineView<'_, F>, &mut Event<F>) -> HandlerResult + Send + 'static,
    {
        Self {
            id,
            phase: Phase::Initial,
            handler: Some(Box::new(handler)),
        }
    }

    pub fn id(&self) -> F::StateId {
        self.id
    }

    /// Rename the unit. Only meaningful before it is added to an automaton.
    pub fn with_id(mut self, id: F::StateId) -> Self {
        self.id = id;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns false while the unit still waits at its initial suspension.
    pub fn is_started(&self) -> bool {
        self.phase != Phase::Initial
    }

    /// Returns true if the unit owns an execution context.
    pub fn is_valid(&self) -> bool {
        self.handler.is_some() || self.phase == Phase::Running
    }

    /// Move the execution context into a new unit with the same id.
    ///
    /// `self` is left hollow and is rejected by `Automaton::add_state`.
    pub fn transfer(&mut self) -> Self {
        Self {
            id: self.id,
            phase: self.phase,
            handler: self.handler.take(),
        }
    }

    /// Leave the initial suspension. Returns false if already started.
    pub(crate) fn prime(&mut self) -> bool {
        if self.phase != Phase::Initial {
            return false;
        }
        self.phase = Phase::Awaiting;
        true
    }

    /// Take the handler out for one run.
    pub(crate) fn resume(&mut self) -> Result<Handler<F>, ResumeFault> {
        match self.phase {
            Phase::Initial => Err(ResumeFault::NotStarted),
            Phase::Running => Err(ResumeFault::AlreadyRunning),
            Phase::Awaiting => {
                let handler = self.handler.take().ok_or(ResumeFault::Hollow)?;
                self.phase = Phase::Running;
                Ok(handler)
            }
        }
    }

    /// Give the handler back and wait for the next event.
    pub(crate) fn suspend(&mut self, handler: Handler<F>) {
        self.handler = Some(handler);
        self.phase = Phase::Awaiting;
    }
}

impl<F: Family> fmt::Debug for StateUnit<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateUnit")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("valid", &self.is_valid())
            .finish()
    }
}
