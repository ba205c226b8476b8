//! Red, Green, Blue
//!
//! Three LED controllers blink twice each and pass the baton to the next one,
//! red to green to blue and around again, until a stop flag is raised. Then
//! the hand-off routes are rewired to loop back on themselves and the three
//! machines run side by side on their own threads.
//!
//! Key concepts:
//! - Cross-machine transitions (hand-offs)
//! - Driving a chain of machines from a worker thread
//! - Polling `is_active` from another thread
//! - Rewiring the transition table between runs
//!
//! Run with: RUST_LOG=baton::transit=info cargo run --example rgb

use baton::automaton::{Automaton, HandlerError, HandlerResult, MachineView};
use baton::builder::AutomatonBuilder;
use baton::core::{Event, Family};
use baton::label_enum;
use baton::trace::tracing_sink;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

label_enum! {
    enum Led {
        Red,
        Green,
        Blue,
    }
}

label_enum! {
    enum Stage {
        Idle,
        Active,
    }
}

label_enum! {
    enum Signal {
        StartBlink,
        BlinkReady,
        HandOver,
    }
}

#[derive(Debug, Default)]
enum Payload {
    #[default]
    Empty,
    Stop(Arc<AtomicBool>),
    BlinkTime(Duration),
}

struct Rgb;

impl Family for Rgb {
    type AutomatonId = Led;
    type StateId = Stage;
    type EventId = Signal;
    type Payload = Payload;
}

type Fsm = Automaton<Rgb>;

const BLINK_TIME: Duration = Duration::from_millis(250);
const BLINKS: u8 = 2;

fn unrecognized(fsm: &MachineView<'_, Rgb>, event: &Event<Rgb>) -> HandlerError {
    HandlerError::unrecognized_event(
        event.id().map_or("<invalid>", |id| id.name()),
        fsm.state_id().map_or("<none>", |state| state.name()),
    )
}

/// Keeps the LED on for the time carried by the event.
fn active_handler(
    led: Led,
) -> impl FnMut(&MachineView<'_, Rgb>, &mut Event<Rgb>) -> HandlerResult + Send {
    move |fsm, event| {
        let blink_time = match event.payload() {
            Some(Payload::BlinkTime(time)) if event.is(Signal::StartBlink) => *time,
            _ => return Err(unrecognized(fsm, event)),
        };

        println!("{led:<5} LED = On");
        thread::sleep(blink_time);
        println!("{led:<5} LED = Off");
        event.set_signal(Signal::BlinkReady);
        Ok(())
    }
}

/// Counts blinks and passes the stop flag on when they are done.
fn idle_handler() -> impl FnMut(&MachineView<'_, Rgb>, &mut Event<Rgb>) -> HandlerResult + Send {
    let mut stop: Option<Arc<AtomicBool>> = None;
    let mut blinks_left = 0u8;

    move |fsm, event| {
        match event.id() {
            Some(Signal::HandOver) => {
                match event.payload_mut().map(std::mem::take) {
                    Some(Payload::Stop(flag)) => stop = Some(flag),
                    _ => return Err(HandlerError::unexpected_payload(Signal::HandOver)),
                }
                blinks_left = BLINKS;
                event.set(Signal::StartBlink, Payload::BlinkTime(BLINK_TIME));
            }
            Some(Signal::BlinkReady) => {
                thread::sleep(BLINK_TIME);
                let stopped = stop
                    .as_ref()
                    .map_or(true, |flag| flag.load(Ordering::Acquire));
                blinks_left = blinks_left.saturating_sub(1);

                if stopped {
                    event.invalidate();
                } else if blinks_left > 0 {
                    event.set(Signal::StartBlink, Payload::BlinkTime(BLINK_TIME));
                } else if let Some(flag) = stop.take() {
                    event.set(Signal::HandOver, Payload::Stop(flag));
                } else {
                    event.invalidate();
                }
            }
            _ => return Err(unrecognized(fsm, event)),
        }
        Ok(())
    }
}

fn setup(led: Led) -> Result<Fsm, baton::BuildError> {
    AutomatonBuilder::new(led)
        .state(Stage::Idle, idle_handler())
        .state(Stage::Active, active_handler(led))
        .transition(Stage::Active, Signal::BlinkReady, Stage::Idle)
        .transition(Stage::Idle, Signal::StartBlink, Stage::Active)
        .transition(Stage::Idle, Signal::HandOver, Stage::Idle)
        .tracer(tracing_sink())
        .initial(Stage::Idle)
        .build()
}

fn print_active(title: &str, machines: &[Fsm]) {
    let flags: Vec<String> = machines
        .iter()
        .map(|fsm| format!("{} active = {}", fsm.id(), fsm.is_active()))
        .collect();
    println!("{title} {}", flags.join(", "));
}

/// Send a hand-over event carrying `stop` from a new thread.
fn kick_off(
    fsm: &Fsm,
    stop: &Arc<AtomicBool>,
) -> thread::JoinHandle<baton::automaton::Result<()>> {
    let fsm = fsm.clone();
    let stop = Arc::clone(stop);
    thread::spawn(move || fsm.send_event(Event::with(Signal::HandOver, Payload::Stop(stop))))
}

fn run_for(
    duration: Duration,
    starters: &[&Fsm],
    machines: &[Fsm],
    title: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let stop = Arc::new(AtomicBool::new(false));
    let workers: Vec<_> = starters.iter().map(|fsm| kick_off(fsm, &stop)).collect();

    thread::sleep(duration);
    print_active(title, machines);
    stop.store(true, Ordering::Release);

    for worker in workers {
        worker
            .join()
            .map_err(|_| "kick-off thread panicked")??;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let machines = vec![setup(Led::Red)?, setup(Led::Green)?, setup(Led::Blue)?];

    // red --> green --> blue --> red
    for (index, fsm) in machines.iter().enumerate() {
        let next = &machines[(index + 1) % machines.len()];
        fsm.add_remote_transition(Stage::Idle, Signal::HandOver, Stage::Idle, next)?;
    }

    for fsm in &machines {
        println!("---------------- Start the cycle with {} ----------------", fsm.id());
        run_for(
            Duration::from_secs(3),
            &[fsm],
            &machines,
            "Activity before stop:",
        )?;
    }
    print_active("Activity after stop:", &machines);

    // Each machine hands over to itself, making them independent.
    for fsm in &machines {
        fsm.add_transition(Stage::Idle, Signal::HandOver, Stage::Idle)?;
    }

    println!("---------------- Run RED, GREEN, BLUE in parallel ----------------");
    let all: Vec<&Fsm> = machines.iter().collect();
    run_for(
        Duration::from_secs(2),
        &all,
        &machines,
        "All 3 are running in parallel:",
    )?;
    print_active("All 3 have stopped:", &machines);

    for fsm in &machines {
        println!(
            "{:<5} fsm is suspended at state {}",
            fsm.id(),
            fsm.state_id().map_or("<none>", |state| state.name())
        );
    }
    Ok(())
}
