//! Trace sink contract and the `tracing`-backed sink.

use crate::core::Family;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// One resolved transition, as reported to a trace sink.
///
/// `source` is the automaton whose state emitted the event; `target` is the
/// automaton that owns the destination state. They differ on a hand-off.
#[derive(Serialize)]
#[serde(bound = "")]
pub struct Transit<F: Family> {
    pub source: F::AutomatonId,
    pub target: F::AutomatonId,
    pub from: F::StateId,
    pub event: F::EventId,
    pub to: F::StateId,
}

impl<F: Family> Transit<F> {
    /// Returns true if control moved to a different automaton.
    pub fn is_handoff(&self) -> bool {
        self.source != self.target
    }
}

impl<F: Family> Clone for Transit<F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F: Family> Copy for Transit<F> {}

impl<F: Family> PartialEq for Transit<F> {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.target == other.target
            && self.from == other.from
            && self.event == other.event
            && self.to == other.to
    }
}

impl<F: Family> fmt::Debug for Transit<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transit")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("from", &self.from)
            .field("event", &self.event)
            .field("to", &self.to)
            .finish()
    }
}

impl<F: Family> fmt::Display for Transit<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.source)?;
        if self.is_handoff() {
            write!(f, "-->{}", self.target)?;
        }
        write!(
            f,
            "] event '{}' sent from state '{}' --> state '{}'",
            self.event, self.from, self.to
        )
    }
}

/// Observer notified of every resolved transition.
///
/// Sinks run synchronously on the thread driving the automaton and must not
/// call back into any automaton.
pub type TraceSink<F> = Arc<dyn Fn(&Transit<F>) + Send + Sync>;

/// Build a sink from a closure.
pub fn sink_fn<F, S>(sink: S) -> TraceSink<F>
where
    F: Family,
    S: Fn(&Transit<F>) + Send + Sync + 'static,
{
    Arc::new(sink)
}

/// A sink that writes every transit as a structured `tracing` event.
pub fn tracing_sink<F: Family>() -> TraceSink<F> {
    Arc::new(|transit: &Transit<F>| {
        tracing::info!(
            target: "baton::transit",
            source = %transit.source,
            target_fsm = %transit.target,
            from = %transit.from,
            event = %transit.event,
            to = %transit.to,
            "{}",
            transit
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Rgb;

    impl Family for Rgb {
        type AutomatonId = &'static str;
        type StateId = &'static str;
        type EventId = &'static str;
        type Payload = ();
    }

    fn transit(source: &'static str, target: &'static str) -> Transit<Rgb> {
        Transit {
            source,
            target,
            from: "idle",
            event: "hand_over",
            to: "idle",
        }
    }

    #[test]
    fn local_transit_displays_single_automaton() {
        let t = transit("red_fsm", "red_fsm");
        assert!(!t.is_handoff());
        assert_eq!(
            t.to_string(),
            "[red_fsm] event 'hand_over' sent from state 'idle' --> state 'idle'"
        );
    }

    #[test]
    fn handoff_displays_both_automatons() {
        let t = transit("red_fsm", "green_fsm");
        assert!(t.is_handoff());
        assert_eq!(
            t.to_string(),
            "[red_fsm-->green_fsm] event 'hand_over' sent from state 'idle' --> state 'idle'"
        );
    }

    #[test]
    fn sink_fn_receives_transits() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        let sink = sink_fn::<Rgb, _>(move |t: &Transit<Rgb>| captured.lock().unwrap().push(*t));

        sink(&transit("red_fsm", "green_fsm"));

        assert_eq!(*seen.lock().unwrap(), vec![transit("red_fsm", "green_fsm")]);
    }

    #[test]
    fn tracing_sink_does_not_panic_without_subscriber() {
        let sink = tracing_sink::<Rgb>();
        sink(&transit("red_fsm", "red_fsm"));
    }

    #[test]
    fn transit_serializes_all_fields() {
        let json = serde_json::to_value(transit("red_fsm", "green_fsm")).unwrap();
        assert_eq!(json["source"], "red_fsm");
        assert_eq!(json["target"], "green_fsm");
        assert_eq!(json["event"], "hand_over");
    }
}
