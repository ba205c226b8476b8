//! Errors raised while configuring and driving automatons.

use thiserror::Error;

/// Convenient result alias for automaton operations.
pub type Result<T, E = FsmError> = std::result::Result<T, E>;

/// Value returned by state handlers.
pub type HandlerResult = std::result::Result<(), HandlerError>;

/// Errors that can occur when configuring or driving an automaton.
///
/// Identifiers are rendered with their `Display` impl so that the error type
/// does not depend on the machine family.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FsmError {
    #[error("FSM '{automaton}': a state with id '{state}' already exists")]
    DuplicateState { automaton: String, state: String },

    #[error("FSM '{automaton}': state '{state}' has no execution context")]
    InvalidState { automaton: String, state: String },

    #[error("FSM '{automaton}': unknown state '{state}'")]
    UnknownState { automaton: String, state: String },

    #[error("FSM '{automaton}': state '{state}' can not receive event '{event}' because it has not been started. Call start() first")]
    NotStarted {
        automaton: String,
        state: String,
        event: String,
    },

    #[error("FSM '{automaton}': no current state. Call go_to() before send_event()")]
    NoCurrentState { automaton: String },

    /// `automaton` is the one whose handler emitted the event, which after a
    /// hand-off is the target rather than the caller of `send_event`.
    #[error("FSM '{automaton}': can't find transition from state '{state}' on event '{event}'")]
    TransitionNotFound {
        automaton: String,
        state: String,
        event: String,
    },

    #[error("FSM '{automaton}': transition from state '{state}' targets a dropped automaton")]
    DetachedTarget { automaton: String, state: String },

    #[error("FSM '{automaton}': protocol violation: {reason}")]
    ProtocolViolation { automaton: String, reason: String },

    #[error("FSM '{automaton}': handler of state '{state}' failed: {source}")]
    Handler {
        automaton: String,
        state: String,
        #[source]
        source: HandlerError,
    },
}

/// Failure reported by a state handler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The handler received an event it does not know how to process.
    pub fn unrecognized_event(event: impl std::fmt::Display, state: impl std::fmt::Display) -> Self {
        Self::new(format!(
            "Unrecognized event '{event}' received in state '{state}'"
        ))
    }

    /// The event carried a payload of the wrong kind for its id.
    pub fn unexpected_payload(event: impl std::fmt::Display) -> Self {
        Self::new(format!("Event '{event}' carries an unexpected payload"))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn transition_not_found_names_all_parts() {
        let err = FsmError::TransitionNotFound {
            automaton: "ping_pong_fsm".into(),
            state: "ping".into(),
            event: "to_ping".into(),
        };

        assert_eq!(
            err.to_string(),
            "FSM 'ping_pong_fsm': can't find transition from state 'ping' on event 'to_ping'"
        );
    }

    #[test]
    fn handler_error_is_the_source() {
        let err = FsmError::Handler {
            automaton: "morse".into(),
            state: "sound_on".into(),
            source: HandlerError::unrecognized_event("beep_done", "sound_on"),
        };

        let source = err.source().expect("handler error should be the source");
        assert_eq!(
            source.to_string(),
            "Unrecognized event 'beep_done' received in state 'sound_on'"
        );
    }

    #[test]
    fn handler_error_keeps_message() {
        let err = HandlerError::new("boom");
        assert_eq!(err.message(), "boom");
        assert_eq!(err.to_string(), "boom");
    }
}
