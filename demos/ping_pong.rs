//! Ping-Pong
//!
//! Two states bounce a counter back and forth until it runs out.
//!
//! Key concepts:
//! - Registering state handlers and a transition table
//! - Rewriting an event in place to route it onward
//! - Invalidating the event to park the machine
//!
//! Run with: RUST_LOG=baton=trace cargo run --example ping_pong

use baton::automaton::{Automaton, HandlerError, HandlerResult, MachineView};
use baton::core::{Event, Family};
use baton::trace::tracing_sink;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
enum Payload {
    #[default]
    Empty,
    Counter(u8),
}

struct PingPong;

impl Family for PingPong {
    type AutomatonId = &'static str;
    type StateId = &'static str;
    type EventId = &'static str;
    type Payload = Payload;
}

type Fsm = Automaton<PingPong>;

/// Handler that answers `expected` with `reply` while the counter lasts.
fn bouncer(
    expected: &'static str,
    reply: &'static str,
) -> impl FnMut(&MachineView<'_, PingPong>, &mut Event<PingPong>) -> HandlerResult + Send {
    move |fsm, event| {
        let counter = match event.payload() {
            Some(Payload::Counter(counter)) if event.is(expected) => *counter,
            _ => {
                return Err(HandlerError::unrecognized_event(
                    event.id().unwrap_or("<invalid>"),
                    fsm.state_id().unwrap_or("<none>"),
                ))
            }
        };

        if counter != 0 {
            event.set(reply, Payload::Counter(counter - 1));
        } else {
            event.invalidate();
        }
        Ok(())
    }
}

fn setup(fsm: &Fsm) -> baton::automaton::Result<()> {
    fsm.add_handler("ping", bouncer("to_ping", "to_pong"))?;
    fsm.add_handler("pong", bouncer("to_pong", "to_ping"))?;
    fsm.add_transition("ping", "to_pong", "pong")?;
    fsm.add_transition("pong", "to_ping", "ping")?;

    println!("'{}' has {} states.", fsm.id(), fsm.state_count());
    println!("The states are:");
    for (index, state) in fsm.state_ids().iter().enumerate() {
        println!("  ({index}) {state}");
    }
    println!("The transitions are:");
    for transition in fsm.transitions() {
        println!("  {transition}");
    }

    fsm.set_tracer(tracing_sink());
    fsm.start();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Ping-Pong ===\n");
    let fsm = Fsm::new("ping_pong_fsm");
    setup(&fsm)?;

    println!("\n1. Running...");
    fsm.go_to("ping")?
        .send_event(Event::with("to_ping", Payload::Counter(3)))?;
    println!(
        "{} suspended at state {}",
        fsm.id(),
        fsm.state_id().unwrap_or("<none>")
    );

    println!("\n2. Running...");
    fsm.go_to("pong")?
        .send_event(Event::with("to_pong", Payload::Counter(3)))?;
    println!(
        "{} suspended at state {}",
        fsm.id(),
        fsm.state_id().unwrap_or("<none>")
    );

    println!("\n=== Example Complete ===");
    Ok(())
}
