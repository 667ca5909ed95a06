//! Backend-to-UI events and error modeling for the game window.

use client_core::{Controls, RoundPhase, ServiceError};
use shared::{
    domain::{Cue, PadColor},
    error::ErrorCode,
};

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Info(String),
    Error(UiError),
    CueStarted(Cue),
    CueEnded(PadColor),
    CuesCleared,
    RoundUpdated { level: u32, high_score: u32 },
    PhaseChanged { phase: RoundPhase, controls: Controls },
    FailureIndicator(bool),
}

impl UiEvent {
    /// Cue flashes and status notes can be lost under backpressure; the
    /// next frame or cue supersedes them. Everything else carries round state.
    pub fn is_droppable(&self) -> bool {
        matches!(
            self,
            UiEvent::Info(_) | UiEvent::CueStarted(_) | UiEvent::CueEnded(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Mismatch,
    Startup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: UiErrorCategory,
    message: String,
}

impl UiError {
    pub fn from_service(err: &ServiceError) -> Self {
        match err.code() {
            ErrorCode::SequenceMismatch => Self {
                category: UiErrorCategory::Mismatch,
                message: "Wrong sequence.".to_string(),
            },
            ErrorCode::Transport => Self {
                category: UiErrorCategory::Transport,
                message: describe_transport_failure(err),
            },
        }
    }

    pub fn startup(message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Startup,
            message: message.into(),
        }
    }

    /// Transport problems can be cleared by the retry control.
    pub fn is_retryable(&self) -> bool {
        self.category == UiErrorCategory::Transport
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

fn describe_transport_failure(err: &ServiceError) -> String {
    match err {
        ServiceError::Status { status, .. } if *status >= 500 => {
            format!("Game server error (HTTP {status}); press Retry.")
        }
        ServiceError::Malformed(_) => {
            "Game server sent an unexpected response; press Retry.".to_string()
        }
        _ => {
            let lower = err.to_string().to_ascii_lowercase();
            if lower.contains("timed out") || lower.contains("timeout") {
                "Game server timed out; press Retry.".to_string()
            } else {
                "Game server unreachable; check the backend URL and press Retry.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cue_and_info_events_are_droppable() {
        assert!(UiEvent::CueStarted(Cue::new(PadColor::Red)).is_droppable());
        assert!(UiEvent::CueEnded(PadColor::Red).is_droppable());
        assert!(UiEvent::Info("connecting".to_string()).is_droppable());
        assert!(!UiEvent::CuesCleared.is_droppable());
        assert!(!UiEvent::FailureIndicator(true).is_droppable());
        assert!(!UiEvent::PhaseChanged {
            phase: RoundPhase::Ready,
            controls: Controls::for_phase(RoundPhase::Ready),
        }
        .is_droppable());
    }

    #[test]
    fn mismatch_is_not_retryable() {
        let err = UiError::from_service(&ServiceError::SequenceMismatch);
        assert_eq!(err.category(), UiErrorCategory::Mismatch);
        assert!(!err.is_retryable());
    }

    #[test]
    fn transport_failures_offer_retry() {
        let unreachable = UiError::from_service(&ServiceError::Transport(
            "error sending request: connection refused".to_string(),
        ));
        assert!(unreachable.is_retryable());
        assert!(unreachable.message().contains("unreachable"));

        let server = UiError::from_service(&ServiceError::Status {
            status: 502,
            message: String::new(),
        });
        assert!(server.message().contains("HTTP 502"));

        let timeout = UiError::from_service(&ServiceError::Transport(
            "operation timed out".to_string(),
        ));
        assert!(timeout.message().contains("timed out"));
    }
}
