//! Events exchanged between state units.

use super::label::Family;
use std::fmt;

/// An identified, possibly invalid message.
///
/// An event without an id is invalid. Invalid events are how a state unit
/// parks its automaton: the runtime routes valid events through the
/// transition table and stops on invalid ones.
///
/// Id and payload are always assigned together, so an event never carries a
/// payload that belongs to a different id.
///
/// # Example
///
/// ```rust
/// use baton::core::{Event, Family};
///
/// struct Counter;
///
/// impl Family for Counter {
///     type AutomatonId = u8;
///     type StateId = u8;
///     type EventId = u8;
///     type Payload = u32;
/// }
///
/// let mut event: Event<Counter> = Event::new();
/// assert!(!event.is_valid());
///
/// event.set(1, 42);
/// assert!(event == 1);
/// assert_eq!(event.payload(), Some(&42));
///
/// let moved = event.take();
/// assert!(moved.is_valid());
/// assert!(!event.is_valid());
/// ```
pub struct Event<F: Family> {
    id: Option<F::EventId>,
    payload: F::Payload,
}

impl<F: Family> Event<F> {
    /// Create an invalid event.
    pub fn new() -> Self {
        Self {
            id: None,
            payload: F::Payload::default(),
        }
    }

    /// Create a valid event.
    pub fn with(id: F::EventId, payload: F::Payload) -> Self {
        Self {
            id: Some(id),
            payload,
        }
    }

    /// Create a valid event carrying the default payload.
    pub fn signal(id: F::EventId) -> Self {
        Self::with(id, F::Payload::default())
    }

    pub fn is_valid(&self) -> bool {
        self.id.is_some()
    }

    /// The event id, or `None` if the event is invalid.
    pub fn id(&self) -> Option<F::EventId> {
        self.id
    }

    /// Returns true if the event is valid and carries `id`.
    pub fn is(&self, id: F::EventId) -> bool {
        self.id == Some(id)
    }

    /// The payload of a valid event.
    pub fn payload(&self) -> Option<&F::Payload> {
        self.id.map(|_| &self.payload)
    }

    /// Mutable access to the payload of a valid event.
    pub fn payload_mut(&mut self) -> Option<&mut F::Payload> {
        match self.id {
            Some(_) => Some(&mut self.payload),
            None => None,
        }
    }

    /// Assign id and payload in one step.
    pub fn set(&mut self, id: F::EventId, payload: F::Payload) {
        self.id = Some(id);
        self.payload = payload;
    }

    /// Assign an id with the default payload.
    pub fn set_signal(&mut self, id: F::EventId) {
        self.set(id, F::Payload::default());
    }

    /// Make the event invalid and drop its payload.
    pub fn invalidate(&mut self) {
        self.id = None;
        self.payload = F::Payload::default();
    }

    /// Move the event out, leaving `self` invalid.
    pub fn take(&mut self) -> Self {
        Self {
            id: self.id.take(),
            payload: std::mem::take(&mut self.payload),
        }
    }

    /// Split a valid event into its id and payload.
    pub fn into_parts(self) -> Option<(F::EventId, F::Payload)> {
        let Event { id, payload } = self;
        id.map(|id| (id, payload))
    }
}

impl<F: Family> Default for Event<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Family> PartialEq<F::EventId> for Event<F> {
    fn eq(&self, other: &F::EventId) -> bool {
        self.is(*other)
    }
}

impl<F: Family> fmt::Debug for Event<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "Event({id:?})"),
            None => f.write_str("Event(<invalid>)"),
        }
    }
}
