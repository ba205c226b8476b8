//! Declaration checks for [`AutomatonBuilder`](super::AutomatonBuilder).
//!
//! Every check contributes a `Validation`; they are combined with
//! `Validation::all_vec` so a declaration reports ALL of its problems at once.

use crate::automaton::{FsmError, Transition};
use crate::core::{Family, StateUnit};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Outcome of checking one part of a declaration.
pub type Check = Validation<(), NonEmptyVec<FsmError>>;

fn check(ok: bool, error: impl FnOnce() -> FsmError) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(error())
    }
}

/// State ids are unique and every unit owns its handler.
pub(crate) fn states<F: Family>(automaton: F::AutomatonId, units: &[StateUnit<F>]) -> Vec<Check> {
    let mut seen = HashSet::new();
    units
        .iter()
        .map(|unit| {
            let state = unit.id();
            let fresh = check(seen.insert(state), || FsmError::DuplicateState {
                automaton: automaton.to_string(),
                state: state.to_string(),
            });
            let valid = check(unit.is_valid(), || FsmError::InvalidState {
                automaton: automaton.to_string(),
                state: state.to_string(),
            });
            Validation::all_vec(vec![fresh, valid]).map(|_| ())
        })
        .collect()
}

/// Both ends of every transition name a declared state.
///
/// A cross-machine destination is looked up in the target automaton.
pub(crate) fn transitions<F: Family>(
    automaton: F::AutomatonId,
    declared: &HashSet<F::StateId>,
    transitions: &[Transition<F>],
) -> Vec<Check> {
    transitions
        .iter()
        .map(|transition| {
            let from = check(declared.contains(&transition.from), || {
                FsmError::UnknownState {
                    automaton: automaton.to_string(),
                    state: transition.from.to_string(),
                }
            });
            let to = match &transition.target {
                Some(target) => check(target.has_state(transition.to), || {
                    FsmError::UnknownState {
                        automaton: target.id().to_string(),
                        state: transition.to.to_string(),
                    }
                }),
                None => check(declared.contains(&transition.to), || {
                    FsmError::UnknownState {
                        automaton: automaton.to_string(),
                        state: transition.to.to_string(),
                    }
                }),
            };
            Validation::all_vec(vec![from, to]).map(|_| ())
        })
        .collect()
}

/// The initial state, if set, is declared.
pub(crate) fn initial<F: Family>(
    automaton: F::AutomatonId,
    declared: &HashSet<F::StateId>,
    initial: Option<F::StateId>,
) -> Check {
    match initial {
        Some(state) => check(declared.contains(&state), || FsmError::UnknownState {
            automaton: automaton.to_string(),
            state: state.to_string(),
        }),
        None => Validation::success(()),
    }
}
