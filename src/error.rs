//! Error types
//!
//! Three classes of failure exist:
//! - invalid-state: an operation was called outside its legal state (controller bug)
//! - rejected-input: a malformed username, handled before any network call
//! - transport: a leaderboard call failed, recovered by showing a message

use thiserror::Error;

use crate::session::Screen;

/// Engine lifecycle misuse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid state for {operation}: {reason}")]
    InvalidState {
        operation: &'static str,
        reason: &'static str,
    },
}

/// Why a username was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsernameError {
    #[error("Username must be 1-20 characters long")]
    Empty,
    #[error("Username must be 1-20 characters long")]
    TooLong { len: usize, max: usize },
    #[error("Username can only contain letters, numbers, underscores, and hyphens")]
    InvalidCharacters,
    #[error("Username cannot contain '{word}'")]
    Reserved { word: &'static str },
}

/// A leaderboard call failed (network, server rejection, bad payload)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Session controller failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("'{trigger}' is not allowed on the {screen:?} screen")]
    InvalidTransition {
        screen: Screen,
        trigger: &'static str,
    },
    #[error(transparent)]
    RejectedInput(#[from] UsernameError),
    #[error("a score submission is already in flight")]
    SubmissionPending,
    #[error("no finished run to submit")]
    NothingToSubmit,
    #[error(transparent)]
    Engine(#[from] EngineError),
}
