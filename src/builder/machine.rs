//! Builder for constructing automatons.

use super::error::BuildError;
use super::validate::{self, Check};
use crate::automaton::{Automaton, FsmError, HandlerResult, MachineView, Transition};
use crate::core::{Event, Family, StateUnit};
use crate::trace::TraceSink;
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::debug;

/// Builder for constructing automatons with a fluent API.
///
/// `build` checks the whole declaration first and reports every problem it
/// finds, then creates the automaton, starts it and moves it to the initial
/// state.
///
/// # Example
///
/// ```rust
/// use baton::builder::AutomatonBuilder;
/// use baton::core::{Event, Family};
///
/// struct Door;
///
/// impl Family for Door {
///     type AutomatonId = &'static str;
///     type StateId = &'static str;
///     type EventId = &'static str;
///     type Payload = ();
/// }
///
/// let door = AutomatonBuilder::<Door>::new("door")
///     .state("closed", |_fsm, event| {
///         if !event.is("open") {
///             event.invalidate();
///         }
///         Ok(())
///     })
///     .state("opened", |_fsm, event| {
///         event.invalidate();
///         Ok(())
///     })
///     .transition("closed", "open", "opened")
///     .initial("closed")
///     .build()
///     .unwrap();
///
/// door.send_event(Event::signal("open")).unwrap();
/// assert_eq!(door.state_id(), Some("opened"));
/// ```
pub struct AutomatonBuilder<F: Family> {
    id: F::AutomatonId,
    states: Vec<StateUnit<F>>,
    transitions: Vec<Transition<F>>,
    tracer: Option<TraceSink<F>>,
    initial: Option<F::StateId>,
}

impl<F: Family> AutomatonBuilder<F> {
    /// Create a new builder for an automaton named `id`.
    pub fn new(id: F::AutomatonId) -> Self {
        Self {
            id,
            states: Vec::new(),
            transitions: Vec::new(),
            tracer: None,
            initial: None,
        }
    }

    /// Declare a state with its handler.
    pub fn state<H>(self, id: F::StateId, handler: H) -> Self
    where
        H: FnMut(&MachineView<'_, F>, &mut Event<F>) -> HandlerResult + Send + 'static,
    {
        self.unit(StateUnit::new(id, handler))
    }

    /// Declare a prebuilt state unit.
    pub fn unit(mut self, unit: StateUnit<F>) -> Self {
        self.states.push(unit);
        self
    }

    /// Route `event` sent from `from` to `to` in the automaton being built.
    pub fn transition(self, from: F::StateId, event: F::EventId, to: F::StateId) -> Self {
        self.add(Transition::new(from, event, to))
    }

    /// Route `event` sent from `from` to state `to` of `target`.
    pub fn remote_transition(
        self,
        from: F::StateId,
        event: F::EventId,
        to: F::StateId,
        target: &Automaton<F>,
    ) -> Self {
        self.add(Transition::new(from, event, to).in_automaton(target))
    }

    /// Add a declarative transition.
    pub fn add(mut self, transition: Transition<F>) -> Self {
        self.transitions.push(transition);
        self
    }

    /// Add multiple transitions at once.
    pub fn transitions(mut self, transitions: impl IntoIterator<Item = Transition<F>>) -> Self {
        self.transitions.extend(transitions);
        self
    }

    /// Report every resolved transition to `sink`.
    pub fn tracer(mut self, sink: TraceSink<F>) -> Self {
        self.tracer = Some(sink);
        self
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: F::StateId) -> Self {
        self.initial = Some(state);
        self
    }

    /// Check the declaration, accumulating ALL problems.
    pub fn validate(&self) -> Validation<(), NonEmptyVec<FsmError>> {
        let declared: HashSet<F::StateId> = self.states.iter().map(StateUnit::id).collect();

        let mut checks: Vec<Check> = validate::states::<F>(self.id, &self.states);
        checks.extend(validate::transitions::<F>(self.id, &declared, &self.transitions));
        checks.push(validate::initial::<F>(self.id, &declared, self.initial));

        Validation::all_vec(checks).map(|_| ())
    }

    /// Build, start and position the automaton.
    pub fn build(self) -> Result<Automaton<F>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;

        if let Validation::Failure(errors) = self.validate() {
            return Err(BuildError::Invalid(errors.iter().cloned().collect()));
        }

        let automaton = Automaton::new(self.id);
        for unit in self.states {
            automaton.add_state(unit)?;
        }
        automaton.add_all(self.transitions)?;
        if let Some(sink) = self.tracer {
            automaton.set_tracer(sink);
        }
        automaton.start().go_to(initial)?;

        debug!(automaton = %self.id, initial = %initial, "automaton built");
        Ok(automaton)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceLog;

    struct TestFamily;

    impl Family for TestFamily {
        type AutomatonId = &'static str;
        type StateId = &'static str;
        type EventId = &'static str;
        type Payload = ();
    }

    fn park(_fsm: &MachineView<'_, TestFamily>, event: &mut Event<TestFamily>) -> HandlerResult {
        event.invalidate();
        Ok(())
    }

    fn forward(_fsm: &MachineView<'_, TestFamily>, _event: &mut Event<TestFamily>) -> HandlerResult {
        Ok(())
    }

    #[test]
    fn builder_requires_initial_state() {
        let result = AutomatonBuilder::<TestFamily>::new("fsm")
            .state("a", park)
            .build();

        assert!(matches!(result, Err(BuildError::MissingInitialState)));
    }

    #[test]
    fn builder_accumulates_all_errors() {
        let mut hollow = StateUnit::new("c", park);
        let _moved = hollow.transfer();

        let builder = AutomatonBuilder::<TestFamily>::new("fsm")
            .state("a", park)
            .state("a", forward)
            .unit(hollow)
            .transition("a", "x", "missing")
            .transition("nowhere", "x", "a")
            .initial("absent");

        match builder.validate() {
            Validation::Failure(errors) => {
                assert_eq!(errors.len(), 5);
                let duplicates = errors
                    .iter()
                    .filter(|e| matches!(e, FsmError::DuplicateState { .. }))
                    .count();
                let invalid = errors
                    .iter()
                    .filter(|e| matches!(e, FsmError::InvalidState { .. }))
                    .count();
                let unknown = errors
                    .iter()
                    .filter(|e| matches!(e, FsmError::UnknownState { .. }))
                    .count();

                assert_eq!((duplicates, invalid, unknown), (1, 1, 3));
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }

        let result = builder.build();
        assert!(matches!(result, Err(BuildError::Invalid(ref errors)) if errors.len() == 5));
    }

    #[test]
    fn valid_declaration_passes() {
        let builder = AutomatonBuilder::<TestFamily>::new("fsm")
            .state("a", forward)
            .state("b", park)
            .transition("a", "x", "b")
            .initial("a");

        assert!(builder.validate().is_success());
    }

    #[test]
    fn build_starts_and_positions_automaton() {
        let log = TraceLog::new();
        let fsm = AutomatonBuilder::<TestFamily>::new("fsm")
            .state("a", forward)
            .state("b", park)
            .transition("a", "x", "b")
            .tracer(log.sink())
            .initial("a")
            .build()
            .unwrap();

        assert_eq!(fsm.state_id(), Some("a"));
        assert_eq!(fsm.is_state_started("a"), Some(true));
        assert_eq!(fsm.is_state_started("b"), Some(true));
        assert!(fsm.has_tracer());

        fsm.send_event(Event::signal("x")).unwrap();
        assert_eq!(fsm.state_id(), Some("b"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn remote_transition_checks_target_states() {
        let green = AutomatonBuilder::<TestFamily>::new("green_fsm")
            .state("idle", park)
            .initial("idle")
            .build()
            .unwrap();

        let result = AutomatonBuilder::<TestFamily>::new("red_fsm")
            .state("idle", forward)
            .remote_transition("idle", "hand_over", "busy", &green)
            .initial("idle")
            .build();

        match result {
            Err(BuildError::Invalid(errors)) => {
                assert_eq!(errors.len(), 1);
                assert!(matches!(
                    &errors[0],
                    FsmError::UnknownState { automaton, state } if automaton == "green_fsm" && state == "busy"
                ));
            }
            other => panic!("expected invalid declaration, got {other:?}"),
        }
    }

    #[test]
    fn built_automatons_hand_off() {
        let green = AutomatonBuilder::<TestFamily>::new("green_fsm")
            .state("idle", park)
            .initial("idle")
            .build()
            .unwrap();
        let red = AutomatonBuilder::<TestFamily>::new("red_fsm")
            .state("idle", forward)
            .transitions([Transition::new("idle", "hand_over", "idle").in_automaton(&green)])
            .initial("idle")
            .build()
            .unwrap();

        red.send_event(Event::signal("hand_over")).unwrap();
        assert_eq!(red.transitions()[0].target, "green_fsm");
        assert!(!red.is_active());
        assert!(!green.is_active());
    }
}
