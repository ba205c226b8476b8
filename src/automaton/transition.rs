//! Transition table types.

use super::machine::{Automaton, Shared};
use crate::core::Family;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Weak;

/// Arena index of a state unit inside its owning automaton.
///
/// Units are never removed, so a key stays valid for the automaton's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct StateKey(pub(crate) usize);

/// Where an event goes.
pub(crate) enum Destination<F: Family> {
    /// A unit of the automaton that owns the table.
    Local { state: StateKey, to: F::StateId },
    /// A unit of another automaton. The reference is weak: the table never
    /// keeps the other automaton alive.
    Remote {
        automaton: Weak<Shared<F>>,
        automaton_id: F::AutomatonId,
        state: StateKey,
        to: F::StateId,
    },
}

impl<F: Family> Destination<F> {
    pub(crate) fn state_id(&self) -> F::StateId {
        match self {
            Destination::Local { to, .. } | Destination::Remote { to, .. } => *to,
        }
    }
}

struct Entry<F: Family> {
    from: F::StateId,
    destination: Destination<F>,
    seq: u64,
}

/// Map of `(source state, event id)` to destination.
///
/// Entries keep their insertion order for snapshots; overwriting a key keeps
/// its original position.
pub(crate) struct TransitionTable<F: Family> {
    entries: HashMap<(StateKey, F::EventId), Entry<F>>,
    next_seq: u64,
}

impl<F: Family> TransitionTable<F> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Insert or overwrite. Returns true if an entry was replaced.
    pub(crate) fn insert(
        &mut self,
        from_key: StateKey,
        from: F::StateId,
        event: F::EventId,
        destination: Destination<F>,
    ) -> bool {
        if let Some(entry) = self.entries.get_mut(&(from_key, event)) {
            entry.destination = destination;
            return true;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            (from_key, event),
            Entry {
                from,
                destination,
                seq,
            },
        );
        false
    }

    pub(crate) fn remove(&mut self, from: StateKey, event: F::EventId) -> bool {
        self.entries.remove(&(from, event)).is_some()
    }

    pub(crate) fn get(&self, from: StateKey, event: F::EventId) -> Option<&Destination<F>> {
        self.entries.get(&(from, event)).map(|entry| &entry.destination)
    }

    pub(crate) fn contains(&self, from: StateKey, event: F::EventId) -> bool {
        self.entries.contains_key(&(from, event))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Rows in insertion order.
    pub(crate) fn records(&self, owner: F::AutomatonId) -> Vec<TransitionRecord<F>> {
        let mut rows: Vec<(u64, TransitionRecord<F>)> = self
            .entries
            .iter()
            .map(|(&(_, event), entry)| {
                let target = match &entry.destination {
                    Destination::Local { .. } => owner,
                    Destination::Remote { automaton_id, .. } => *automaton_id,
                };
                let record = TransitionRecord {
                    from: entry.from,
                    event,
                    to: entry.destination.state_id(),
                    target,
                };
                (entry.seq, record)
            })
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);
        rows.into_iter().map(|(_, record)| record).collect()
    }
}

/// One row of a transition table snapshot.
#[derive(Serialize)]
#[serde(bound = "")]
pub struct TransitionRecord<F: Family> {
    pub from: F::StateId,
    pub event: F::EventId,
    pub to: F::StateId,
    /// Automaton owning `to`.
    pub target: F::AutomatonId,
}

impl<F: Family> Clone for TransitionRecord<F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: Family> Copy for TransitionRecord<F> {}

impl<F: Family> PartialEq for TransitionRecord<F> {
    fn eq(&self, other: &Self) -> bool {
        self.from == other.from
            && self.event == other.event
            && self.to == other.to
            && self.target == other.target
    }
}

impl<F: Family> fmt::Debug for TransitionRecord<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionRecord")
            .field("from", &self.from)
            .field("event", &self.event)
            .field("to", &self.to)
            .field("target", &self.target)
            .finish()
    }
}

impl<F: Family> fmt::Display for TransitionRecord<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}, {}}} --> {} ({})",
            self.from, self.event, self.to, self.target
        )
    }
}

/// Declarative transition, added with [`Automaton::add`].
///
/// ```rust
/// use baton::automaton::{Automaton, Transition};
/// use baton::core::Family;
///
/// struct Rgb;
///
/// impl Family for Rgb {
///     type AutomatonId = &'static str;
///     type StateId = &'static str;
///     type EventId = &'static str;
///     type Payload = ();
/// }
///
/// let red = Automaton::<Rgb>::new("red_fsm");
/// let green = Automaton::<Rgb>::new("green_fsm");
/// for fsm in [&red, &green] {
///     fsm.add_handler("idle", |_fsm, event| {
///         event.invalidate();
///         Ok(())
///     })
///     .unwrap();
/// }
///
/// let replaced = red
///     .add(Transition::new("idle", "hand_over", "idle").in_automaton(&green))
///     .unwrap();
/// assert!(!replaced);
/// assert_eq!(red.transitions()[0].target, "green_fsm");
/// ```
pub struct Transition<F: Family> {
    pub from: F::StateId,
    pub event: F::EventId,
    pub to: F::StateId,
    pub target: Option<Automaton<F>>,
}

impl<F: Family> Transition<F> {
    /// A transition between two states of the same automaton.
    pub fn new(from: F::StateId, event: F::EventId, to: F::StateId) -> Self {
        Self {
            from,
            event,
            to,
            target: None,
        }
    }

    /// Route to `to` inside `automaton` instead.
    pub fn in_automaton(mut self, automaton: &Automaton<F>) -> Self {
        self.target = Some(automaton.clone());
        self
    }
}
