//! Round orchestration for the pad memory game: the round state machine, its
//! timers, and the HTTP client for the game-state service.

pub mod controller;
pub mod error;
pub mod round;
pub mod service;

pub use controller::{
    spawn_controller, ControllerCommand, ControllerHandle, RoundController, RoundView,
    ADVANCE_DELAY, CUE_SPACING, FLASH_DURATION,
};
pub use error::{ControllerError, ServiceError};
pub use round::{Controls, Operation, RoundPhase, RoundState, StallPoint};
pub use service::{GameStateClient, GameStateService, DEFAULT_BACKEND_URL};
