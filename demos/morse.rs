//! Morse Transmitter
//!
//! Three states cooperate to key out text messages in Morse code: one splits
//! the message into symbols, one times the dots and dashes of a symbol, and
//! one drives the sound.
//!
//! Key concepts:
//! - Payloads of several kinds on one event type
//! - Handlers that keep progress between events
//! - A chain that runs many transitions per `send_event`
//!
//! Run with: RUST_LOG=baton::transit=info cargo run --example morse

use baton::automaton::{HandlerError, HandlerResult, MachineView};
use baton::builder::AutomatonBuilder;
use baton::core::{Event, Family};
use baton::label_enum;
use baton::trace::tracing_sink;
use std::thread;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

label_enum! {
    enum Stage {
        TransmissionReady,
        TransmissionInProgress,
        SoundOn,
    }
}

label_enum! {
    enum Signal {
        TransmitMessage,
        TransmitSymbol,
        TransmitReady,
        DoBeep,
        BeepDone,
    }
}

#[derive(Debug, Default)]
enum Payload {
    #[default]
    Empty,
    Message(String),
    Symbol(&'static str),
    BeepTime(Duration),
}

struct Morse;

impl Family for Morse {
    type AutomatonId = &'static str;
    type StateId = Stage;
    type EventId = Signal;
    type Payload = Payload;
}

type Handler = Box<dyn FnMut(&MachineView<'_, Morse>, &mut Event<Morse>) -> HandlerResult + Send>;

/// Approximate transmission speed.
const WORDS_PER_MINUTE: u32 = 12;

/// Morse code of a character. Unknown characters are sent as a word gap.
fn code(symbol: char) -> &'static str {
    match symbol {
        'A' => ".-",
        'B' => "-...",
        'C' => "-.-.",
        'D' => "-..",
        'E' => ".",
        'F' => "..-.",
        'G' => "--.",
        'H' => "....",
        'I' => "..",
        'J' => ".---",
        'K' => "-.-",
        'L' => ".-..",
        'M' => "--",
        'N' => "-.",
        'O' => "---",
        'P' => ".--.",
        'Q' => "--.-",
        'R' => ".-.",
        'S' => "...",
        'T' => "-",
        'U' => "..-",
        'V' => "...-",
        'W' => ".--",
        'X' => "-..-",
        'Y' => "-.--",
        'Z' => "--..",
        '1' => ".----",
        '2' => "..---",
        '3' => "...--",
        '4' => "....-",
        '5' => ".....",
        '6' => "-....",
        '7' => "--...",
        '8' => "---..",
        '9' => "----.",
        '0' => "-----",
        _ => " ",
    }
}

fn unrecognized(fsm: &MachineView<'_, Morse>, event: &Event<Morse>) -> HandlerError {
    HandlerError::unrecognized_event(
        event.id().map_or("<invalid>", |id| id.name()),
        fsm.state_id().map_or("<none>", |state| state.name()),
    )
}

/// Splits a message into symbols and sends them one at a time.
fn transmission_ready() -> Handler {
    let mut message: Vec<char> = Vec::new();
    let mut sent = 0usize;

    Box::new(move |fsm, event| {
        match event.id() {
            Some(Signal::TransmitMessage) => match event.payload_mut().map(std::mem::take) {
                Some(Payload::Message(text)) => {
                    message = text.to_uppercase().chars().collect();
                    sent = 0;
                }
                _ => return Err(HandlerError::unexpected_payload(Signal::TransmitMessage)),
            },
            Some(Signal::TransmitReady) => {}
            _ => return Err(unrecognized(fsm, event)),
        }

        match message.get(sent) {
            Some(&symbol) => {
                let pattern = code(symbol);
                let shown = if pattern == " " { ' ' } else { symbol };
                println!("--> '{shown}'");
                event.set(Signal::TransmitSymbol, Payload::Symbol(pattern));
                sent += 1;
            }
            None => event.invalidate(),
        }
        Ok(())
    })
}

/// Times the dots, dashes and gaps of one symbol.
fn transmission_in_progress(words_per_minute: u32) -> Handler {
    let dot = Duration::from_millis(u64::from(1200 / words_per_minute.clamp(1, 1200)));
    let dash = 3 * dot;
    let mut symbol: &'static str = "";
    let mut transmitted = 0usize;

    Box::new(move |fsm, event| {
        match event.id() {
            Some(Signal::TransmitSymbol) => match event.payload() {
                Some(Payload::Symbol(code)) => {
                    symbol = *code;
                    transmitted = 0;
                }
                _ => return Err(HandlerError::unexpected_payload(Signal::TransmitSymbol)),
            },
            // Gap between the dots and dashes of a symbol.
            Some(Signal::BeepDone) => thread::sleep(dot),
            _ => return Err(unrecognized(fsm, event)),
        }

        let Some(signal) = symbol.as_bytes().get(transmitted).copied() else {
            // Symbol gap is three dots, one of which has already passed.
            thread::sleep(2 * dot);
            event.set_signal(Signal::TransmitReady);
            return Ok(());
        };
        transmitted += 1;
        println!("{transmitted} = {}", signal as char);

        match signal {
            b'.' => event.set(Signal::DoBeep, Payload::BeepTime(dot)),
            b'-' => event.set(Signal::DoBeep, Payload::BeepTime(dash)),
            b' ' => {
                // A word gap (seven dots) is always the last signal of its symbol.
                transmitted = symbol.len();
                thread::sleep(7 * dot);
                event.set_signal(Signal::TransmitReady);
            }
            other => {
                return Err(HandlerError::new(format!(
                    "Unexpected signal received {other}"
                )))
            }
        }
        Ok(())
    })
}

/// Beeps for the time carried by the event.
fn sound_on() -> Handler {
    Box::new(|fsm, event| {
        let beep = match event.payload() {
            Some(Payload::BeepTime(time)) if event.is(Signal::DoBeep) => *time,
            _ => return Err(unrecognized(fsm, event)),
        };

        debug!(?beep, "sound on");
        thread::sleep(beep);
        debug!("sound off");
        event.set_signal(Signal::BeepDone);
        Ok(())
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let fsm = AutomatonBuilder::<Morse>::new("morse_fsm")
        .state(Stage::TransmissionReady, transmission_ready())
        .state(
            Stage::TransmissionInProgress,
            transmission_in_progress(WORDS_PER_MINUTE),
        )
        .state(Stage::SoundOn, sound_on())
        .transition(
            Stage::TransmissionReady,
            Signal::TransmitSymbol,
            Stage::TransmissionInProgress,
        )
        .transition(
            Stage::TransmissionInProgress,
            Signal::TransmitReady,
            Stage::TransmissionReady,
        )
        .transition(Stage::TransmissionInProgress, Signal::DoBeep, Stage::SoundOn)
        .transition(Stage::SoundOn, Signal::BeepDone, Stage::TransmissionInProgress)
        .tracer(tracing_sink())
        .initial(Stage::TransmissionReady)
        .build()?;

    for message in ["Hello World ", "SOS SOS ", "Wikipedia the free encyclopedia"] {
        println!("Message = '{message}'");
        fsm.send_event(Event::with(
            Signal::TransmitMessage,
            Payload::Message(message.to_string()),
        ))?;
    }

    println!(
        "\n'{}' is suspended at state '{}'",
        fsm.id(),
        fsm.state_id().map_or("<none>", |state| state.name())
    );
    Ok(())
}
