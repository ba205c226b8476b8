//! Identifier traits shared by every machine family.
//!
//! A machine family fixes, at compile time, the identifier types of its
//! automatons, states and events together with the payload its events carry.
//! Different families never mix: an automaton only accepts events of its own
//! family and may only hand off to automatons of the same family.

use serde::Serialize;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait for identifiers of automatons, states and events.
///
/// Labels are small copyable values used as keys in transition tables and
/// rendered in trace output and error messages.
///
/// # Required Traits
///
/// - `Copy` + `Eq` + `Hash`: labels are table keys
/// - `Debug` + `Display`: labels appear in diagnostics
/// - `Serialize`: labels appear in serialisable trace records
/// - `Send` + `Sync`: automatons can be driven from any thread
///
/// Any type meeting these bounds is a label, so integers work out of the box:
///
/// ```rust
/// fn assert_label<L: baton::core::Label>() {}
///
/// assert_label::<u16>();
/// assert_label::<&'static str>();
/// ```
pub trait Label:
    Copy + Eq + Hash + Debug + Display + Serialize + Send + Sync + 'static
{
}

impl<T> Label for T where T: Copy + Eq + Hash + Debug + Display + Serialize + Send + Sync + 'static {}

/// Type family of a set of cooperating automatons.
///
/// # Example
///
/// ```rust
/// use baton::core::Family;
///
/// #[derive(Default)]
/// enum Payload {
///     #[default]
///     Empty,
///     Counter(u8),
/// }
///
/// struct PingPong;
///
/// impl Family for PingPong {
///     type AutomatonId = &'static str;
///     type StateId = &'static str;
///     type EventId = &'static str;
///     type Payload = Payload;
/// }
/// ```
pub trait Family: Sized + 'static {
    /// Identifier of an automaton (for diagnostics only).
    type AutomatonId: Label;

    /// Identifier of a state unit, unique within one automaton.
    type StateId: Label;

    /// Discriminant of an event.
    type EventId: Label;

    /// Data carried by events. The default value is the empty payload.
    type Payload: Default + Send + 'static;
}
