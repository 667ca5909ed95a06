use shared::error::ErrorCode;
use thiserror::Error;

use crate::round::{Operation, RoundPhase};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("game-state service rejected the submitted sequence")]
    SequenceMismatch,
    #[error("game-state service unreachable: {0}")]
    Transport(String),
    #[error("game-state service returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed game-state response: {0}")]
    Malformed(String),
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::SequenceMismatch => ErrorCode::SequenceMismatch,
            ServiceError::Transport(_)
            | ServiceError::Status { .. }
            | ServiceError::Malformed(_) => ErrorCode::Transport,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Malformed(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("{operation} is not accepted while the round is {phase}")]
    Rejected {
        operation: Operation,
        phase: RoundPhase,
    },
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("round controller is no longer running")]
    Closed,
}
