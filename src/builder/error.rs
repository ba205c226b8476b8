//! Build errors for automaton builders.

use crate::automaton::FsmError;
use thiserror::Error;

/// Errors that can occur when building an automaton.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Initial state not specified. Call .initial(state) before .build()")]
    MissingInitialState,

    #[error("Invalid automaton declaration: {}", render(.0))]
    Invalid(Vec<FsmError>),

    #[error(transparent)]
    Runtime(#[from] FsmError),
}

impl BuildError {
    /// Every declaration error carried by this build error.
    pub fn errors(&self) -> &[FsmError] {
        match self {
            BuildError::Invalid(errors) => errors,
            BuildError::Runtime(error) => std::slice::from_ref(error),
            BuildError::MissingInitialState => &[],
        }
    }
}

fn render(errors: &[FsmError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_lists_every_error() {
        let error = BuildError::Invalid(vec![
            FsmError::UnknownState {
                automaton: "fsm".into(),
                state: "a".into(),
            },
            FsmError::DuplicateState {
                automaton: "fsm".into(),
                state: "b".into(),
            },
        ]);

        let message = error.to_string();
        assert!(message.contains("'a'"));
        assert!(message.contains("'b'"));
        assert_eq!(error.errors().len(), 2);
    }

    #[test]
    fn runtime_wraps_fsm_error() {
        let error: BuildError = FsmError::NoCurrentState {
            automaton: "fsm".into(),
        }
        .into();

        assert_eq!(error.errors().len(), 1);
        assert_eq!(error.to_string(), error.errors()[0].to_string());
    }
}
