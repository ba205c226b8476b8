//! Ring Benchmark
//!
//! A ring of states passes an event around, alternating direction every
//! round, and reports how many transitions per second the automaton resolves.
//!
//! Key concepts:
//! - Integer state ids (any `Label` works)
//! - Stateful handlers (closures owning their data)
//! - Serialising a run report with serde_json
//!
//! Run with: cargo run --release --example ring

use baton::automaton::{Automaton, HandlerError};
use baton::core::{Event, Family};
use baton::label_enum;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

label_enum! {
    enum Direction {
        Start,
        Clockwise,
        CounterClockwise,
    }
}

struct RingFamily;

impl Family for RingFamily {
    type AutomatonId = &'static str;
    type StateId = u16;
    type EventId = Direction;
    type Payload = u16;
}

type Fsm = Automaton<RingFamily>;

/// State where the ring begins and ends.
const READY: u16 = u16::MAX;

#[cfg(debug_assertions)]
const STATES_IN_RING: u16 = 127;
#[cfg(debug_assertions)]
const ROUNDS: u16 = 100;
#[cfg(not(debug_assertions))]
const STATES_IN_RING: u16 = 1023;
#[cfg(not(debug_assertions))]
const ROUNDS: u16 = 10000;

#[derive(Serialize)]
struct Report {
    automaton: &'static str,
    states_in_ring: u16,
    rounds: u16,
    events_sent: u32,
    running_time_s: f64,
    transitions_per_s: f64,
}

fn setup(
    fsm: &Fsm,
    events_processed: &Arc<AtomicU32>,
    running_time: &Arc<Mutex<Duration>>,
) -> baton::automaton::Result<()> {
    for state in 0..STATES_IN_RING {
        let processed = Arc::clone(events_processed);
        fsm.add_handler(state, move |fsm, event| match event.id() {
            Some(Direction::Clockwise | Direction::CounterClockwise) => {
                processed.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            other => Err(HandlerError::unrecognized_event(
                format!("{other:?}"),
                format!("{:?}", fsm.state_id()),
            )),
        })?;
    }
    for state in 0..STATES_IN_RING - 1 {
        fsm.add_transition(state, Direction::Clockwise, state + 1)?;
        fsm.add_transition(state + 1, Direction::CounterClockwise, state)?;
    }

    let running_time = Arc::clone(running_time);
    let mut rounds_left = 0u16;
    let mut direction = Direction::Clockwise;
    let mut started = Instant::now();
    fsm.add_handler(READY, move |fsm, event| {
        match event.id() {
            Some(Direction::Start) => {
                rounds_left = event.payload().copied().unwrap_or(0).max(1);
                started = Instant::now();
            }
            Some(Direction::Clockwise) => direction = Direction::CounterClockwise,
            Some(Direction::CounterClockwise) => direction = Direction::Clockwise,
            None => {
                return Err(HandlerError::unrecognized_event(
                    "<invalid>",
                    format!("{:?}", fsm.state_id()),
                ))
            }
        }

        if rounds_left > 0 {
            rounds_left -= 1;
            event.set_signal(direction);
        } else {
            let mut total = running_time.lock().unwrap_or_else(|e| e.into_inner());
            *total += started.elapsed();
            event.invalidate();
        }
        Ok(())
    })?;

    let last = STATES_IN_RING - 1;
    fsm.add_transition(READY, Direction::Clockwise, 0)?;
    fsm.add_transition(last, Direction::Clockwise, READY)?;
    fsm.add_transition(READY, Direction::CounterClockwise, last)?;
    fsm.add_transition(0, Direction::CounterClockwise, READY)?;

    fsm.start().go_to(READY)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    println!("=== Ring Benchmark ===\n");
    let fsm = Fsm::new("ring_fsm");
    let events_processed = Arc::new(AtomicU32::new(0));
    let running_time = Arc::new(Mutex::new(Duration::ZERO));
    setup(&fsm, &events_processed, &running_time)?;

    fsm.send_event(Event::with(Direction::Start, ROUNDS))?;

    println!(
        "'{}' is suspended at state '{}'",
        fsm.id(),
        fsm.state_id().unwrap_or(READY)
    );

    let running_time_s = running_time
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .as_secs_f64();
    let events_sent = events_processed.load(Ordering::Relaxed) + u32::from(ROUNDS);
    let report = Report {
        automaton: fsm.id(),
        states_in_ring: STATES_IN_RING,
        rounds: ROUNDS,
        events_sent,
        running_time_s,
        transitions_per_s: f64::from(events_sent) / running_time_s.max(f64::EPSILON),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    println!("\n=== Example Complete ===");
    Ok(())
}
