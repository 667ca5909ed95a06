use std::fmt;

use shared::{domain::PadColor, protocol::GameStateDto};

/// Local copy of the backend's game state plus the player's pending input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    pub sequence: Vec<PadColor>,
    pub user_input: Vec<PadColor>,
    pub level: u32,
    pub high_score: u32,
}

impl Default for RoundState {
    fn default() -> Self {
        Self {
            sequence: Vec::new(),
            user_input: Vec::new(),
            level: 1,
            high_score: 0,
        }
    }
}

impl RoundState {
    pub fn from_service(dto: GameStateDto) -> Self {
        let high_score = dto.high_score_or_default();
        Self {
            sequence: dto.sequence,
            user_input: Vec::new(),
            level: dto.level,
            high_score,
        }
    }

    pub fn input_complete(&self) -> bool {
        !self.sequence.is_empty() && self.user_input.len() >= self.sequence.len()
    }

    /// True while the input is no longer than the sequence.
    pub fn input_within_sequence(&self) -> bool {
        self.user_input.len() <= self.sequence.len()
    }
}

/// Where a transport failure left the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StallPoint {
    Initialize,
    Validate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoundPhase {
    /// No state loaded yet, or waiting for a fresh one.
    Idle,
    /// Fresh state loaded; the start control is live.
    Ready,
    AwaitingInput,
    Validating,
    /// Gap between a successful validation and the next playback.
    AdvancingRound,
    /// Sequence mismatch shown to the player; waits for acknowledgement.
    Failed,
    Stalled(StallPoint),
}

impl RoundPhase {
    pub fn permits(self, operation: Operation) -> bool {
        match operation {
            Operation::Initialize => self == RoundPhase::Idle,
            Operation::StartRound => self == RoundPhase::Ready,
            Operation::SubmitInput | Operation::ReplayRound => self == RoundPhase::AwaitingInput,
            Operation::AcknowledgeFailure => self == RoundPhase::Failed,
            Operation::Retry => matches!(self, RoundPhase::Stalled(_)),
            Operation::Reset => true,
        }
    }

    /// Phases during which scheduled playback may keep running.
    pub fn keeps_playback(self) -> bool {
        matches!(self, RoundPhase::AwaitingInput | RoundPhase::Validating)
    }
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundPhase::Idle => f.write_str("idle"),
            RoundPhase::Ready => f.write_str("ready"),
            RoundPhase::AwaitingInput => f.write_str("awaiting input"),
            RoundPhase::Validating => f.write_str("validating"),
            RoundPhase::AdvancingRound => f.write_str("advancing"),
            RoundPhase::Failed => f.write_str("failed"),
            RoundPhase::Stalled(StallPoint::Initialize) => f.write_str("stalled (initialize)"),
            RoundPhase::Stalled(StallPoint::Validate) => f.write_str("stalled (validate)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Initialize,
    StartRound,
    SubmitInput,
    ReplayRound,
    AcknowledgeFailure,
    Retry,
    Reset,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Initialize => "initialize",
            Operation::StartRound => "start_round",
            Operation::SubmitInput => "submit_input",
            Operation::ReplayRound => "replay_round",
            Operation::AcknowledgeFailure => "acknowledge_failure",
            Operation::Retry => "retry",
            Operation::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Which UI controls are live in a phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub start: bool,
    pub replay: bool,
    pub pads: bool,
    pub reset: bool,
    pub acknowledge: bool,
    pub retry: bool,
}

impl Controls {
    pub fn for_phase(phase: RoundPhase) -> Self {
        let reset = !matches!(phase, RoundPhase::Idle | RoundPhase::Failed);
        match phase {
            RoundPhase::Idle => Self::default(),
            RoundPhase::Ready => Self {
                start: true,
                reset,
                ..Self::default()
            },
            RoundPhase::AwaitingInput => Self {
                replay: true,
                pads: true,
                reset,
                ..Self::default()
            },
            RoundPhase::Validating | RoundPhase::AdvancingRound => Self {
                reset,
                ..Self::default()
            },
            RoundPhase::Failed => Self {
                acknowledge: true,
                ..Self::default()
            },
            RoundPhase::Stalled(_) => Self {
                retry: true,
                reset,
                ..Self::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_awaiting_input_accepts_pads_and_replay() {
        for phase in [
            RoundPhase::Idle,
            RoundPhase::Ready,
            RoundPhase::Validating,
            RoundPhase::AdvancingRound,
            RoundPhase::Failed,
            RoundPhase::Stalled(StallPoint::Validate),
        ] {
            assert!(!phase.permits(Operation::SubmitInput), "{phase}");
            assert!(!phase.permits(Operation::ReplayRound), "{phase}");
            assert!(!Controls::for_phase(phase).pads, "{phase}");
        }
        assert!(RoundPhase::AwaitingInput.permits(Operation::SubmitInput));
        assert!(Controls::for_phase(RoundPhase::AwaitingInput).replay);
    }

    #[test]
    fn start_control_is_live_only_when_ready() {
        assert!(Controls::for_phase(RoundPhase::Ready).start);
        assert!(!Controls::for_phase(RoundPhase::Idle).start);
        assert!(!Controls::for_phase(RoundPhase::AwaitingInput).start);
        assert!(!RoundPhase::Idle.permits(Operation::StartRound));
    }

    #[test]
    fn failed_round_only_offers_acknowledgement() {
        let controls = Controls::for_phase(RoundPhase::Failed);
        assert_eq!(
            controls,
            Controls {
                acknowledge: true,
                ..Controls::default()
            }
        );
    }

    #[test]
    fn fresh_state_from_service_has_empty_input() {
        let state = RoundState::from_service(GameStateDto {
            sequence: vec![PadColor::Red, PadColor::Green],
            level: 2,
            high_score: None,
        });
        assert!(state.user_input.is_empty());
        assert_eq!(state.high_score, 0);
        assert_eq!(state.level, 2);
        assert!(!state.input_complete());
    }
}
