//! Property-based tests for automaton invariants.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use baton::automaton::{Automaton, FsmError, HandlerResult, MachineView};
use baton::core::{Event, Family};
use baton::trace::TraceLog;
use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Ring;

impl Family for Ring {
    type AutomatonId = &'static str;
    type StateId = u8;
    type EventId = u8;
    type Payload = u32;
}

const STATES: u8 = 4;
const CLOCKWISE: u8 = 0;

#[derive(Clone, Debug)]
enum TableOp {
    Add { from: u8, event: u8, to: u8 },
    Remove { from: u8, event: u8 },
}

prop_compose! {
    fn arbitrary_op()(kind in 0..2u8, from in 0..STATES, event in 0..3u8, to in 0..STATES) -> TableOp {
        match kind {
            0 => TableOp::Add { from, event, to },
            _ => TableOp::Remove { from, event },
        }
    }
}

fn park(_fsm: &MachineView<'_, Ring>, event: &mut Event<Ring>) -> HandlerResult {
    event.invalidate();
    Ok(())
}

/// A ring whose states pass the counter clockwise until it reaches zero.
fn ring(size: u8) -> Automaton<Ring> {
    let fsm = Automaton::<Ring>::new("ring");
    for state in 0..size {
        fsm.add_handler(state, |_fsm, event| {
            match event.payload().copied() {
                Some(0) | None => event.invalidate(),
                Some(n) => event.set(CLOCKWISE, n - 1),
            }
            Ok(())
        })
        .unwrap();
    }
    for state in 0..size {
        fsm.add_transition(state, CLOCKWISE, (state + 1) % size)
            .unwrap();
    }
    fsm.start();
    fsm
}

proptest! {
    #[test]
    fn has_transition_tracks_last_edit(ops in prop::collection::vec(arbitrary_op(), 0..40)) {
        let fsm = Automaton::<Ring>::new("table");
        for state in 0..STATES {
            fsm.add_handler(state, park).unwrap();
        }

        let mut model: HashMap<(u8, u8), u8> = HashMap::new();
        for op in &ops {
            match *op {
                TableOp::Add { from, event, to } => {
                    let replaced = fsm.add_transition(from, event, to).unwrap();
                    prop_assert_eq!(replaced, model.insert((from, event), to).is_some());
                }
                TableOp::Remove { from, event } => {
                    let removed = fsm.remove_transition(from, event);
                    prop_assert_eq!(removed, model.remove(&(from, event)).is_some());
                }
            }
        }

        for from in 0..STATES {
            for event in 0..3u8 {
                prop_assert_eq!(fsm.has_transition(from, event), model.contains_key(&(from, event)));
                prop_assert_eq!(fsm.target_state(from, event), model.get(&(from, event)).copied());
            }
        }
        prop_assert_eq!(fsm.transition_count(), model.len());
    }

    #[test]
    fn take_invalidates_source(id in any::<u8>(), payload in any::<u32>()) {
        let mut source = Event::<Ring>::with(id, payload);
        let taken = source.take();

        prop_assert!(!source.is_valid());
        prop_assert_eq!(taken.id(), Some(id));
        prop_assert_eq!(taken.payload().copied(), Some(payload));
    }

    #[test]
    fn repeated_start_never_runs_handlers(starts in 1..6usize, sends in 1..6usize) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let fsm = Automaton::<Ring>::new("counter");
        fsm.add_handler(0, move |_fsm, event| {
            counter.fetch_add(1, Ordering::SeqCst);
            event.invalidate();
            Ok(())
        })
        .unwrap();

        for _ in 0..starts {
            fsm.start();
        }
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);

        fsm.go_to(0).unwrap();
        for _ in 0..sends {
            fsm.send_event(Event::signal(CLOCKWISE)).unwrap();
        }
        prop_assert_eq!(calls.load(Ordering::SeqCst), sends);
    }

    #[test]
    fn ring_parks_after_counter_steps(size in 1..8u8, start in 0..8u8, laps in 0..50u32) {
        let start = start % size;
        let log = TraceLog::new();
        let fsm = ring(size);
        fsm.set_tracer(log.sink());
        fsm.go_to(start).unwrap();

        fsm.send_event(Event::with(CLOCKWISE, laps)).unwrap();

        let expected = ((u32::from(start) + laps) % u32::from(size)) as u8;
        prop_assert_eq!(fsm.state_id(), Some(expected));
        prop_assert!(!fsm.is_active());
        prop_assert_eq!(log.len(), laps as usize);
    }

    #[test]
    fn missing_transition_keeps_state(state in 0..STATES, event in 1..10u8) {
        let fsm = Automaton::<Ring>::new("relay");
        for id in 0..STATES {
            fsm.add_handler(id, |_fsm, _event| Ok(())).unwrap();
        }
        for id in 0..STATES {
            fsm.add_transition(id, CLOCKWISE, (id + 1) % STATES).unwrap();
        }
        fsm.start().go_to(state).unwrap();

        let result = fsm.send_event(Event::with(event, 1));
        let is_not_found = matches!(result, Err(FsmError::TransitionNotFound { .. }));
        prop_assert!(is_not_found);
        prop_assert_eq!(fsm.state_id(), Some(state));
        prop_assert!(!fsm.is_active());
    }
}
