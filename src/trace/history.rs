//! Recorded transition history.
//!
//! `TraceLog` is a sink that records every transit with a timestamp.
//! `TraceHistory` is an immutable snapshot of what it recorded.

use super::sink::{TraceSink, Transit};
use crate::core::Family;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A transit together with the time it was reported.
#[derive(Serialize)]
#[serde(bound = "")]
pub struct TraceEntry<F: Family> {
    #[serde(flatten)]
    pub transit: Transit<F>,
    pub timestamp: DateTime<Utc>,
}

impl<F: Family> Clone for TraceEntry<F> {
    fn clone(&self) -> Self {
        Self {
            transit: self.transit,
            timestamp: self.timestamp,
        }
    }
}

impl<F: Family> std::fmt::Debug for TraceEntry<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceEntry")
            .field("transit", &self.transit)
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// Ordered, immutable history of transits.
///
/// `record` returns a new history with the entry appended; the original is
/// left untouched.
///
/// # Example
///
/// ```rust
/// use baton::core::Family;
/// use baton::trace::{TraceEntry, TraceHistory, Transit};
/// use chrono::Utc;
///
/// struct PingPong;
///
/// impl Family for PingPong {
///     type AutomatonId = &'static str;
///     type StateId = &'static str;
///     type EventId = &'static str;
///     type Payload = ();
/// }
///
/// let history = TraceHistory::<PingPong>::new();
/// let history = history.record(TraceEntry {
///     transit: Transit {
///         source: "fsm",
///         target: "fsm",
///         from: "ping",
///         event: "to_pong",
///         to: "pong",
///     },
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.get_path(), vec!["ping", "pong"]);
/// ```
#[derive(Serialize)]
#[serde(bound = "")]
pub struct TraceHistory<F: Family> {
    entries: Vec<TraceEntry<F>>,
}

impl<F: Family> Default for TraceHistory<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Family> Clone for TraceHistory<F> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<F: Family> std::fmt::Debug for TraceHistory<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceHistory")
            .field("entries", &self.entries)
            .finish()
    }
}

impl<F: Family> TraceHistory<F> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record an entry, returning a new history.
    pub fn record(&self, entry: TraceEntry<F>) -> Self {
        let mut entries = self.entries.clone();
        entries.push(entry);
        Self { entries }
    }

    /// States visited, in order: the first source state, then the
    /// destination of every transit.
    pub fn get_path(&self) -> Vec<F::StateId> {
        let mut path = Vec::with_capacity(self.entries.len() + 1);
        if let Some(first) = self.entries.first() {
            path.push(first.transit.from);
        }
        path.extend(self.entries.iter().map(|entry| entry.transit.to));
        path
    }

    /// Automatons that held control, in order, with consecutive repeats
    /// collapsed.
    pub fn get_baton_path(&self) -> Vec<F::AutomatonId> {
        let mut path: Vec<F::AutomatonId> = Vec::new();
        if let Some(first) = self.entries.first() {
            path.push(first.transit.source);
        }
        for entry in &self.entries {
            if path.last() != Some(&entry.transit.target) {
                path.push(entry.transit.target);
            }
        }
        path
    }

    /// Number of transits that moved control to another automaton.
    pub fn handoff_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.transit.is_handoff())
            .count()
    }

    /// Time between the first and last recorded transit.
    ///
    /// Returns `None` if nothing has been recorded.
    pub fn duration(&self) -> Option<Duration> {
        let (first, last) = (self.entries.first()?, self.entries.last()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn entries(&self) -> &[TraceEntry<F>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the history as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Shared recorder usable as a trace sink.
///
/// Clones share the same storage, so one log can record the transits of
/// several automatons in the order they happened.
pub struct TraceLog<F: Family> {
    entries: Arc<Mutex<Vec<TraceEntry<F>>>>,
}

impl<F: Family> Clone for TraceLog<F> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<F: Family> Default for TraceLog<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Family> TraceLog<F> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TraceEntry<F>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, transit: &Transit<F>) {
        self.lock().push(TraceEntry {
            transit: *transit,
            timestamp: Utc::now(),
        });
    }

    /// A sink that appends to this log.
    pub fn sink(&self) -> TraceSink<F> {
        let log = self.clone();
        Arc::new(move |transit: &Transit<F>| log.push(transit))
    }

    pub fn snapshot(&self) -> TraceHistory<F> {
        TraceHistory {
            entries: self.lock().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
