//! Backend commands queued from UI to backend worker.

use client_core::ControllerCommand;
use shared::domain::PadColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCommand {
    StartRound,
    PressPad(PadColor),
    Replay,
    AcknowledgeFailure,
    Retry,
    Reset,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::StartRound => "start_round",
            BackendCommand::PressPad(_) => "press_pad",
            BackendCommand::Replay => "replay",
            BackendCommand::AcknowledgeFailure => "acknowledge_failure",
            BackendCommand::Retry => "retry",
            BackendCommand::Reset => "reset",
        }
    }
}

impl From<BackendCommand> for ControllerCommand {
    fn from(cmd: BackendCommand) -> Self {
        match cmd {
            BackendCommand::StartRound => ControllerCommand::StartRound,
            BackendCommand::PressPad(color) => ControllerCommand::SubmitInput(color),
            BackendCommand::Replay => ControllerCommand::ReplayRound,
            BackendCommand::AcknowledgeFailure => ControllerCommand::AcknowledgeFailure,
            BackendCommand::Retry => ControllerCommand::Retry,
            BackendCommand::Reset => ControllerCommand::Reset,
        }
    }
}
