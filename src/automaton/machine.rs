//! Automaton: owner of state units, transition table and the resolution loop.
//!
//! `send_event` runs a trampoline on the caller's thread. Each turn resumes
//! one state unit, runs its handler without holding any lock, then resolves
//! the outgoing event to the next unit (possibly in another automaton). The
//! loop ends when a handler invalidates its event (the chain parks) or when
//! an error is raised.

use super::error::{FsmError, HandlerResult, Result};
use super::transition::{Destination, StateKey, Transition, TransitionRecord, TransitionTable};
use crate::core::{Event, Family, Phase, ResumeFault, StateUnit};
use crate::trace::{TraceSink, Transit};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, trace, warn};

/// Mutable part of an automaton, guarded by one mutex.
struct Core<F: Family> {
    states: Vec<StateUnit<F>>,
    index: HashMap<F::StateId, StateKey>,
    transitions: TransitionTable<F>,
    current: Option<StateKey>,
    event: Event<F>,
    tracer: Option<TraceSink<F>>,
}

impl<F: Family> Core<F> {
    fn key(&self, state: F::StateId) -> Option<StateKey> {
        self.index.get(&state).copied()
    }

    fn unit(&self, key: StateKey) -> &StateUnit<F> {
        &self.states[key.0]
    }

    fn unit_mut(&mut self, key: StateKey) -> &mut StateUnit<F> {
        &mut self.states[key.0]
    }
}

pub(crate) struct Shared<F: Family> {
    id: F::AutomatonId,
    active: AtomicBool,
    core: Mutex<Core<F>>,
}

impl<F: Family> Shared<F> {
    fn lock(&self) -> MutexGuard<'_, Core<F>> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }
}

/// What the trampoline does after one turn.
enum Step<F: Family> {
    Park,
    Resume(Automaton<F>),
}

/// Owned copy of a table destination.
enum Route<F: Family> {
    Local(StateKey, F::StateId),
    Remote(Weak<Shared<F>>, StateKey, F::StateId),
}

/// A finite state machine whose states are suspendable units.
///
/// `Automaton` is a handle: clones refer to the same machine, so one clone can
/// be moved to the thread that drives it while another is kept for polling
/// [`is_active`](Self::is_active) or for wiring cross-machine transitions.
///
/// # Example
///
/// ```rust
/// use baton::automaton::Automaton;
/// use baton::core::{Event, Family};
///
/// struct PingPong;
///
/// impl Family for PingPong {
///     type AutomatonId = &'static str;
///     type StateId = &'static str;
///     type EventId = &'static str;
///     type Payload = u8;
/// }
///
/// fn bounce(next: &'static str) -> impl FnMut(&baton::automaton::MachineView<'_, PingPong>, &mut Event<PingPong>) -> baton::automaton::HandlerResult + Send {
///     move |_fsm, event| {
///         match event.payload().copied() {
///             Some(0) | None => event.invalidate(),
///             Some(n) => event.set(next, n - 1),
///         }
///         Ok(())
///     }
/// }
///
/// let fsm = Automaton::<PingPong>::new("ping_pong_fsm");
/// fsm.add_handler("ping", bounce("to_pong")).unwrap();
/// fsm.add_handler("pong", bounce("to_ping")).unwrap();
/// fsm.add_transition("ping", "to_pong", "pong").unwrap();
/// fsm.add_transition("pong", "to_ping", "ping").unwrap();
///
/// fsm.start().go_to("ping").unwrap();
/// fsm.send_event(Event::with("to_ping", 3)).unwrap();
///
/// assert_eq!(fsm.state_id(), Some("pong"));
/// assert!(!fsm.is_active());
/// ```
pub struct Automaton<F: Family> {
    shared: Arc<Shared<F>>,
}

impl<F: Family> Clone for Automaton<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: Family> Automaton<F> {
    /// Create an empty automaton.
    pub fn new(id: F::AutomatonId) -> Self {
        Self {
            shared: Arc::new(Shared {
                id,
                active: AtomicBool::new(false),
                core: Mutex::new(Core {
                    states: Vec::new(),
                    index: HashMap::new(),
                    transitions: TransitionTable::new(),
                    current: None,
                    event: Event::new(),
                    tracer: None,
                }),
            }),
        }
    }

    pub fn id(&self) -> F::AutomatonId {
        self.shared.id
    }

    /// Returns true while a state unit of this automaton is running or about
    /// to run, false once it is parked or has handed control to another
    /// automaton. Safe to poll from any thread.
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Acquire)
    }

    /// Id of the current state: where the next event will be delivered.
    pub fn state_id(&self) -> Option<F::StateId> {
        let core = self.shared.lock();
        core.current.map(|key| core.unit(key).id())
    }

    /// Returns true if an event is waiting to be consumed by a state unit.
    pub fn has_pending_event(&self) -> bool {
        self.shared.lock().event.is_valid()
    }

    /// Id of the event waiting to be consumed, if any.
    pub fn pending_event_id(&self) -> Option<F::EventId> {
        self.shared.lock().event.id()
    }

    /// Returns true if both handles refer to the same automaton.
    pub fn same_as(&self, other: &Automaton<F>) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    fn render_id(&self) -> String {
        self.shared.id.to_string()
    }

    // -------- States --------

    /// Register a state unit. Returns its index in registration order.
    pub fn add_state(&self, unit: StateUnit<F>) -> Result<usize> {
        let mut core = self.shared.lock();
        let state = unit.id();
        if core.index.contains_key(&state) {
            return Err(FsmError::DuplicateState {
                automaton: self.render_id(),
                state: state.to_string(),
            });
        }
        if !unit.is_valid() {
            return Err(FsmError::InvalidState {
                automaton: self.render_id(),
                state: state.to_string(),
            });
        }

        let index = core.states.len();
        core.states.push(unit);
        core.index.insert(state, StateKey(index));
        debug!(automaton = %self.shared.id, state = %state, index, "state added");
        Ok(index)
    }

    /// Register a handler as a new state unit.
    pub fn add_handler<H>(&self, state: F::StateId, handler: H) -> Result<usize>
    where
        H: FnMut(&MachineView<'_, F>, &mut Event<F>) -> HandlerResult + Send + 'static,
    {
        self.add_state(StateUnit::new(state, handler))
    }

    pub fn has_state(&self, state: F::StateId) -> bool {
        self.shared.lock().index.contains_key(&state)
    }

    pub fn state_count(&self) -> usize {
        self.shared.lock().states.len()
    }

    /// State ids in registration order.
    pub fn state_ids(&self) -> Vec<F::StateId> {
        self.shared.lock().states.iter().map(StateUnit::id).collect()
    }

    /// Id of the state registered at `index`.
    pub fn state_at(&self, index: usize) -> Option<F::StateId> {
        self.shared.lock().states.get(index).map(StateUnit::id)
    }

    /// Registration index of `state`, as returned by [`Automaton::add_state`].
    pub fn index_of(&self, state: F::StateId) -> Option<usize> {
        self.shared.lock().key(state).map(|key| key.0)
    }

    /// Returns `None` if the state is unknown.
    pub fn is_state_started(&self, state: F::StateId) -> Option<bool> {
        let core = self.shared.lock();
        core.key(state).map(|key| core.unit(key).is_started())
    }

    // -------- Transitions --------

    fn unknown_state(automaton: &Automaton<F>, state: F::StateId) -> FsmError {
        FsmError::UnknownState {
            automaton: automaton.render_id(),
            state: state.to_string(),
        }
    }

    /// Route `event` sent from `from` to `to` in this automaton.
    ///
    /// Returns true if an existing route was replaced.
    pub fn add_transition(
        &self,
        from: F::StateId,
        event: F::EventId,
        to: F::StateId,
    ) -> Result<bool> {
        let mut core = self.shared.lock();
        let from_key = core
            .key(from)
            .ok_or_else(|| Self::unknown_state(self, from))?;
        let to_key = core.key(to).ok_or_else(|| Self::unknown_state(self, to))?;

        let replaced = core.transitions.insert(
            from_key,
            from,
            event,
            Destination::Local { state: to_key, to },
        );
        debug!(automaton = %self.shared.id, %from, %event, %to, replaced, "transition added");
        Ok(replaced)
    }

    /// Route `event` sent from `from` to state `to` of `target`.
    ///
    /// The table holds a weak reference to `target`; if `target` is dropped,
    /// resolving this route fails with [`FsmError::DetachedTarget`].
    pub fn add_remote_transition(
        &self,
        from: F::StateId,
        event: F::EventId,
        to: F::StateId,
        target: &Automaton<F>,
    ) -> Result<bool> {
        if self.same_as(target) {
            return self.add_transition(from, event, to);
        }

        let from_key = self
            .shared
            .lock()
            .key(from)
            .ok_or_else(|| Self::unknown_state(self, from))?;
        let to_key = target
            .shared
            .lock()
            .key(to)
            .ok_or_else(|| Self::unknown_state(target, to))?;

        let replaced = self.shared.lock().transitions.insert(
            from_key,
            from,
            event,
            Destination::Remote {
                automaton: Arc::downgrade(&target.shared),
                automaton_id: target.id(),
                state: to_key,
                to,
            },
        );
        debug!(
            automaton = %self.shared.id,
            target = %target.shared.id,
            %from,
            %event,
            %to,
            replaced,
            "remote transition added"
        );
        Ok(replaced)
    }

    /// Add a declarative transition.
    pub fn add(&self, transition: Transition<F>) -> Result<bool> {
        match &transition.target {
            Some(target) => {
                self.add_remote_transition(transition.from, transition.event, transition.to, target)
            }
            None => self.add_transition(transition.from, transition.event, transition.to),
        }
    }

    /// Add several declarative transitions, stopping at the first error.
    pub fn add_all<I>(&self, transitions: I) -> Result<&Self>
    where
        I: IntoIterator<Item = Transition<F>>,
    {
        for transition in transitions {
            self.add(transition)?;
        }
        Ok(self)
    }

    /// Returns true if a route was found and removed.
    pub fn remove_transition(&self, from: F::StateId, event: F::EventId) -> bool {
        let mut core = self.shared.lock();
        let Some(from_key) = core.key(from) else {
            return false;
        };
        let removed = core.transitions.remove(from_key, event);
        debug!(automaton = %self.shared.id, %from, %event, removed, "transition removed");
        removed
    }

    /// Remove the route declared by `transition`.
    ///
    /// The row is only removed while it still leads to `transition.to` in the
    /// declared automaton. Returns true if it was removed.
    pub fn remove(&self, transition: &Transition<F>) -> bool {
        let remote = transition
            .target
            .as_ref()
            .filter(|target| !self.same_as(target));
        let mut core = self.shared.lock();
        let Some(from_key) = core.key(transition.from) else {
            return false;
        };
        let declared = core
            .transitions
            .get(from_key, transition.event)
            .is_some_and(|destination| match (destination, remote) {
                (Destination::Local { to, .. }, None) => *to == transition.to,
                (Destination::Remote { automaton, to, .. }, Some(target)) => {
                    *to == transition.to && Weak::as_ptr(automaton) == Arc::as_ptr(&target.shared)
                }
                _ => false,
            });
        if !declared {
            return false;
        }
        core.transitions.remove(from_key, transition.event);
        debug!(
            automaton = %self.shared.id,
            from = %transition.from,
            event = %transition.event,
            to = %transition.to,
            "declared transition removed"
        );
        true
    }

    /// Returns true if `event` sent from `from` has a route.
    pub fn has_transition(&self, from: F::StateId, event: F::EventId) -> bool {
        let core = self.shared.lock();
        core.key(from)
            .is_some_and(|key| core.transitions.contains(key, event))
    }

    /// Destination state of `event` sent from `from`, if routed.
    pub fn target_state(&self, from: F::StateId, event: F::EventId) -> Option<F::StateId> {
        let core = self.shared.lock();
        let key = core.key(from)?;
        core.transitions.get(key, event).map(Destination::state_id)
    }

    pub fn transition_count(&self) -> usize {
        self.shared.lock().transitions.len()
    }

    /// Snapshot of the transition table in insertion order.
    pub fn transitions(&self) -> Vec<TransitionRecord<F>> {
        self.shared.lock().transitions.records(self.shared.id)
    }

    // -------- Tracing --------

    pub fn set_tracer(&self, sink: TraceSink<F>) {
        self.shared.lock().tracer = Some(sink);
    }

    pub fn clear_tracer(&self) {
        self.shared.lock().tracer = None;
    }

    pub fn has_tracer(&self) -> bool {
        self.shared.lock().tracer.is_some()
    }

    // -------- Running --------

    /// Move every state unit past its initial suspension.
    ///
    /// Units that were already started are left alone.
    pub fn start(&self) -> &Self {
        let mut core = self.shared.lock();
        let mut primed = 0usize;
        for unit in core.states.iter_mut() {
            if unit.prime() {
                primed += 1;
            }
        }
        debug!(automaton = %self.shared.id, primed, "started");
        self
    }

    /// Set the state that receives the next event.
    pub fn go_to(&self, state: F::StateId) -> Result<&Self> {
        let mut core = self.shared.lock();
        let key = core
            .key(state)
            .ok_or_else(|| Self::unknown_state(self, state))?;
        core.current = Some(key);
        Ok(self)
    }

    /// Deliver `event` to the current state and run until the chain parks.
    ///
    /// Control returns when a handler invalidates its event (in this or any
    /// automaton reached by hand-off) or when an error is raised.
    pub fn send_event(&self, event: Event<F>) -> Result<()> {
        self.deliver(event)?;

        let mut machine = self.clone();
        loop {
            match machine.step()? {
                Step::Park => return Ok(()),
                Step::Resume(next) => machine = next,
            }
        }
    }

    fn deliver(&self, event: Event<F>) -> Result<()> {
        let mut core = self.shared.lock();
        let key = core.current.ok_or_else(|| FsmError::NoCurrentState {
            automaton: self.render_id(),
        })?;
        let state = core.unit(key).id();

        let Some(event_id) = event.id() else {
            return Err(FsmError::ProtocolViolation {
                automaton: self.render_id(),
                reason: format!("an invalid event has been sent to state '{state}'"),
            });
        };
        self.admit(&core, key, event_id)?;
        if core.event.is_valid() {
            return Err(self.busy(state, event_id));
        }

        core.event = event;
        Ok(())
    }

    /// Check that unit `key` can be resumed with `event`, before anything is
    /// written into this automaton.
    fn admit(&self, core: &Core<F>, key: StateKey, event: F::EventId) -> Result<()> {
        let unit = core.unit(key);
        if !unit.is_started() {
            return Err(FsmError::NotStarted {
                automaton: self.render_id(),
                state: unit.id().to_string(),
                event: event.to_string(),
            });
        }
        if !unit.is_valid() || unit.phase() == Phase::Running {
            return Err(self.busy(unit.id(), event));
        }
        Ok(())
    }

    fn busy(&self, state: F::StateId, event: F::EventId) -> FsmError {
        FsmError::ProtocolViolation {
            automaton: self.render_id(),
            reason: format!("state '{state}' is busy and can not receive event '{event}'"),
        }
    }

    /// Resume the current unit, run its handler, resolve the outgoing event.
    fn step(&self) -> Result<Step<F>> {
        let (key, state, mut handler, mut event) = {
            let mut core = self.shared.lock();
            let key = core.current.ok_or_else(|| FsmError::NoCurrentState {
                automaton: self.render_id(),
            })?;
            let state = core.unit(key).id();
            let event = core.event.take();

            let Some(event_id) = event.id() else {
                self.shared.set_active(false);
                return Err(FsmError::ProtocolViolation {
                    automaton: self.render_id(),
                    reason: format!("an empty event has been sent to state '{state}'"),
                });
            };
            let handler = core
                .unit_mut(key)
                .resume()
                .map_err(|fault| {
                    self.shared.set_active(false);
                    self.resume_error(fault, state, event_id)
                })?;
            (key, state, handler, event)
        };

        self.shared.set_active(true);
        let outcome = handler(&MachineView::new(self), &mut event);

        let mut core = self.shared.lock();
        core.unit_mut(key).suspend(handler);
        if let Err(source) = outcome {
            drop(core);
            self.shared.set_active(false);
            warn!(automaton = %self.shared.id, %state, error = %source, "handler failed");
            return Err(FsmError::Handler {
                automaton: self.render_id(),
                state: state.to_string(),
                source,
            });
        }

        self.resolve(core, state, key, event)
    }

    fn resume_error(&self, fault: ResumeFault, state: F::StateId, event: F::EventId) -> FsmError {
        match fault {
            ResumeFault::NotStarted => FsmError::NotStarted {
                automaton: self.render_id(),
                state: state.to_string(),
                event: event.to_string(),
            },
            ResumeFault::AlreadyRunning => FsmError::ProtocolViolation {
                automaton: self.render_id(),
                reason: format!("state '{state}' was resumed while it was running"),
            },
            ResumeFault::Hollow => FsmError::ProtocolViolation {
                automaton: self.render_id(),
                reason: format!("state '{state}' has lost its execution context"),
            },
        }
    }

    /// Find where the event emitted by `from` goes and hand it over.
    fn resolve(
        &self,
        mut core: MutexGuard<'_, Core<F>>,
        from: F::StateId,
        from_key: StateKey,
        event: Event<F>,
    ) -> Result<Step<F>> {
        let Some(event_id) = event.id() else {
            drop(core);
            self.shared.set_active(false);
            debug!(automaton = %self.shared.id, state = %from, "parked");
            return Ok(Step::Park);
        };

        let tracer = core.tracer.clone();
        let route = core
            .transitions
            .get(from_key, event_id)
            .map(|destination| match destination {
                Destination::Local { state, to } => Route::Local(*state, *to),
                Destination::Remote {
                    automaton,
                    state,
                    to,
                    ..
                } => Route::Remote(automaton.clone(), *state, *to),
            });

        match route {
            None => {
                drop(core);
                self.shared.set_active(false);
                warn!(automaton = %self.shared.id, state = %from, event = %event_id, "transition not found");
                Err(FsmError::TransitionNotFound {
                    automaton: self.render_id(),
                    state: from.to_string(),
                    event: event_id.to_string(),
                })
            }
            Some(Route::Local(state, to)) => {
                if let Err(error) = self.admit(&core, state, event_id) {
                    drop(core);
                    self.shared.set_active(false);
                    warn!(automaton = %self.shared.id, state = %from, event = %event_id, %to, "destination refused event");
                    return Err(error);
                }
                core.current = Some(state);
                core.event = event;
                drop(core);

                let transit = Transit {
                    source: self.shared.id,
                    target: self.shared.id,
                    from,
                    event: event_id,
                    to,
                };
                trace!(automaton = %self.shared.id, %from, event = %event_id, %to, "transition");
                emit(tracer.as_ref(), &transit);
                self.shared.set_active(true);
                Ok(Step::Resume(self.clone()))
            }
            Some(Route::Remote(weak, state, to)) => {
                drop(core);

                let Some(shared) = weak.upgrade() else {
                    self.shared.set_active(false);
                    warn!(automaton = %self.shared.id, state = %from, event = %event_id, "hand-off target dropped");
                    return Err(FsmError::DetachedTarget {
                        automaton: self.render_id(),
                        state: from.to_string(),
                    });
                };
                let target = Automaton { shared };

                {
                    let mut target_core = target.shared.lock();
                    if let Err(error) = target.admit(&target_core, state, event_id) {
                        drop(target_core);
                        self.shared.set_active(false);
                        warn!(
                            automaton = %self.shared.id,
                            target = %target.shared.id,
                            state = %from,
                            event = %event_id,
                            %to,
                            "hand-off target refused event"
                        );
                        return Err(error);
                    }
                    if target_core.event.is_valid() {
                        drop(target_core);
                        self.shared.set_active(false);
                        return Err(FsmError::ProtocolViolation {
                            automaton: target.render_id(),
                            reason: format!(
                                "hand-off of event '{event_id}' from '{}' found a pending event",
                                self.shared.id
                            ),
                        });
                    }
                    target_core.current = Some(state);
                    target_core.event = event;
                }

                let transit = Transit {
                    source: self.shared.id,
                    target: target.shared.id,
                    from,
                    event: event_id,
                    to,
                };
                trace!(
                    automaton = %self.shared.id,
                    target = %target.shared.id,
                    %from,
                    event = %event_id,
                    %to,
                    "hand-off"
                );
                emit(tracer.as_ref(), &transit);
                self.shared.set_active(false);
                target.shared.set_active(true);
                Ok(Step::Resume(target))
            }
        }
    }
}

fn emit<F: Family>(tracer: Option<&TraceSink<F>>, transit: &Transit<F>) {
    if let Some(sink) = tracer {
        sink(transit);
    }
}

impl<F: Family> fmt::Debug for Automaton<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Automaton")
            .field("id", &self.shared.id)
            .field("active", &self.is_active())
            .field("state", &self.state_id())
            .field("states", &self.state_count())
            .finish()
    }
}

/// Read-only view of an automaton handed to state handlers.
pub struct MachineView<'a, F: Family> {
    automaton: &'a Automaton<F>,
}

impl<'a, F: Family> MachineView<'a, F> {
    pub(crate) fn new(automaton: &'a Automaton<F>) -> Self {
        Self { automaton }
    }

    pub fn id(&self) -> F::AutomatonId {
        self.automaton.id()
    }

    /// The state whose handler is running.
    pub fn state_id(&self) -> Option<F::StateId> {
        self.automaton.state_id()
    }

    pub fn is_active(&self) -> bool {
        self.automaton.is_active()
    }
}
