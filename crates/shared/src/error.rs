use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("unknown pad color '{0}'")]
    UnknownColor(String),
    #[error("unknown waveform '{0}'")]
    UnknownWaveform(String),
}

/// Classification of a failed game-state request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Transport,
    SequenceMismatch,
}

/// Error body some game-state backends attach to a non-2xx response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, alias = "error")]
    pub message: String,
}
