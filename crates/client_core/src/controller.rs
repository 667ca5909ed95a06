use std::{sync::Arc, time::Duration};

use shared::{
    domain::{Cue, PadColor},
    protocol::GameStateDto,
};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{sleep, sleep_until, Instant},
};
use tracing::{debug, error, info, warn};

use crate::{
    error::{ControllerError, ServiceError},
    round::{Controls, Operation, RoundPhase, RoundState, StallPoint},
    service::GameStateService,
};

/// Spacing between consecutive cues of a playback.
pub const CUE_SPACING: Duration = Duration::from_millis(500);
/// How long a pad stays lit for one cue.
pub const FLASH_DURATION: Duration = Duration::from_millis(300);
/// Pause between a successful validation and the next playback.
pub const ADVANCE_DELAY: Duration = Duration::from_millis(1000);

const COMMAND_QUEUE_DEPTH: usize = 64;

/// Presentation side of the controller: pads, tones, score, controls.
///
/// Implementations must be cheap and non-blocking; they are called from the
/// controller task and from its timers.
pub trait RoundView: Send + Sync + 'static {
    fn cue_started(&self, cue: Cue);
    fn cue_ended(&self, color: PadColor);
    /// All pads released, e.g. after playback was cancelled mid-cue.
    fn cues_cleared(&self);
    fn round_updated(&self, level: u32, high_score: u32);
    fn phase_changed(&self, phase: RoundPhase, controls: Controls);
    fn failure_indicator(&self, visible: bool);
    fn service_error(&self, error: &ServiceError);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerCommand {
    Initialize,
    StartRound,
    SubmitInput(PadColor),
    ReplayRound,
    AcknowledgeFailure,
    Retry,
    Reset,
}

#[derive(Debug)]
enum RoundEvent {
    Validated {
        epoch: u64,
        outcome: Result<GameStateDto, ServiceError>,
    },
    AdvanceDue {
        epoch: u64,
    },
}

pub struct RoundController<S: GameStateService, V: RoundView> {
    service: Arc<S>,
    view: Arc<V>,
    state: RoundState,
    phase: RoundPhase,
    // Bumped on every transition; completions carrying an older value are dropped.
    epoch: u64,
    playbacks: Vec<JoinHandle<()>>,
    in_flight: Option<JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<RoundEvent>,
    events_rx: mpsc::UnboundedReceiver<RoundEvent>,
}

impl<S: GameStateService, V: RoundView> RoundController<S, V> {
    pub fn new(service: Arc<S>, view: Arc<V>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            service,
            view,
            state: RoundState::default(),
            phase: RoundPhase::Idle,
            epoch: 0,
            playbacks: Vec::new(),
            in_flight: None,
            events_tx,
            events_rx,
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Loads a fresh game from the service. On failure the round stalls with
    /// a retry action instead of leaving every control disabled.
    pub async fn initialize(&mut self) -> Result<(), ControllerError> {
        self.ensure(Operation::Initialize)?;
        self.load_fresh_state().await
    }

    pub fn start_round(&mut self) -> Result<(), ControllerError> {
        self.ensure(Operation::StartRound)?;
        info!(level = self.state.level, "starting round");
        self.transition(RoundPhase::AwaitingInput);
        self.playback();
        Ok(())
    }

    pub fn submit_input(&mut self, color: PadColor) -> Result<(), ControllerError> {
        self.ensure(Operation::SubmitInput)?;
        self.state.user_input.push(color);
        debug!(%color, entered = self.state.user_input.len(), "pad input");
        self.flash(color);
        if self.state.input_complete() {
            self.validate();
        }
        Ok(())
    }

    pub fn replay_round(&mut self) -> Result<(), ControllerError> {
        self.ensure(Operation::ReplayRound)?;
        debug!(len = self.state.sequence.len(), "replaying sequence");
        self.playback();
        Ok(())
    }

    pub async fn acknowledge_failure(&mut self) -> Result<(), ControllerError> {
        self.ensure(Operation::AcknowledgeFailure)?;
        self.view.failure_indicator(false);
        self.transition(RoundPhase::Idle);
        self.load_fresh_state().await
    }

    pub async fn retry(&mut self) -> Result<(), ControllerError> {
        self.ensure(Operation::Retry)?;
        match self.phase {
            RoundPhase::Stalled(StallPoint::Validate) => {
                info!("retrying sequence validation");
                self.validate();
                Ok(())
            }
            _ => {
                info!("retrying game state reset");
                self.transition(RoundPhase::Idle);
                self.load_fresh_state().await
            }
        }
    }

    /// Abandons the current round from any phase and starts a new game.
    pub async fn reset(&mut self) -> Result<(), ControllerError> {
        info!(phase = %self.phase, "resetting game");
        if self.phase == RoundPhase::Failed {
            self.view.failure_indicator(false);
        }
        if let Some(pending) = self.in_flight.take() {
            pending.abort();
        }
        self.transition(RoundPhase::Idle);
        self.load_fresh_state().await
    }

    pub async fn dispatch(&mut self, command: ControllerCommand) -> Result<(), ControllerError> {
        debug!(?command, phase = %self.phase, "controller command");
        match command {
            ControllerCommand::Initialize => self.initialize().await,
            ControllerCommand::StartRound => self.start_round(),
            ControllerCommand::SubmitInput(color) => self.submit_input(color),
            ControllerCommand::ReplayRound => self.replay_round(),
            ControllerCommand::AcknowledgeFailure => self.acknowledge_failure().await,
            ControllerCommand::Retry => self.retry().await,
            ControllerCommand::Reset => self.reset().await,
        }
    }

    /// Waits for the next timer or service completion and applies it.
    /// Returns `false` once no more completions can arrive.
    pub async fn pump(&mut self) -> bool {
        match self.events_rx.recv().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    pub async fn run(mut self, mut commands: mpsc::Receiver<ControllerCommand>) {
        info!("round controller started");
        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        break;
                    };
                    match self.dispatch(command).await {
                        Ok(()) => {}
                        Err(err @ ControllerError::Rejected { .. }) => {
                            warn!(error = %err, "ignored controller command");
                        }
                        Err(err) => debug!(error = %err, "controller command failed"),
                    }
                }
                Some(event) = self.events_rx.recv() => self.handle_event(event),
            }
        }
        self.cancel_playbacks();
        if let Some(pending) = self.in_flight.take() {
            pending.abort();
        }
        info!("round controller stopped");
    }

    fn ensure(&self, operation: Operation) -> Result<(), ControllerError> {
        if self.phase.permits(operation) {
            Ok(())
        } else {
            Err(ControllerError::Rejected {
                operation,
                phase: self.phase,
            })
        }
    }

    fn transition(&mut self, next: RoundPhase) {
        if !next.keeps_playback() {
            self.cancel_playbacks();
        }
        if next != RoundPhase::Validating {
            if let Some(pending) = self.in_flight.take() {
                pending.abort();
            }
        }
        self.epoch += 1;
        debug!(from = %self.phase, to = %next, epoch = self.epoch, "round transition");
        self.phase = next;
        self.view.phase_changed(next, Controls::for_phase(next));
    }

    async fn load_fresh_state(&mut self) -> Result<(), ControllerError> {
        info!("requesting fresh game state");
        match self.service.reset().await {
            Ok(fresh) => {
                self.replace_state(fresh);
                self.transition(RoundPhase::Ready);
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "failed to reset game state");
                self.view.service_error(&err);
                self.transition(RoundPhase::Stalled(StallPoint::Initialize));
                Err(err.into())
            }
        }
    }

    fn replace_state(&mut self, fresh: GameStateDto) {
        self.state = RoundState::from_service(fresh);
        info!(
            level = self.state.level,
            high_score = self.state.high_score,
            len = self.state.sequence.len(),
            "game state replaced"
        );
        self.view
            .round_updated(self.state.level, self.state.high_score);
    }

    fn playback(&mut self) {
        self.state.user_input.clear();
        self.playbacks.retain(|handle| !handle.is_finished());

        let sequence = self.state.sequence.clone();
        let view = Arc::clone(&self.view);
        let start = Instant::now();
        let handle = tokio::spawn(async move {
            for (i, color) in sequence.into_iter().enumerate() {
                let at = start + CUE_SPACING * i as u32;
                sleep_until(at).await;
                view.cue_started(Cue::new(color));
                sleep_until(at + FLASH_DURATION).await;
                view.cue_ended(color);
            }
        });
        self.playbacks.push(handle);
    }

    fn flash(&self, color: PadColor) {
        self.view.cue_started(Cue::new(color));
        let view = Arc::clone(&self.view);
        tokio::spawn(async move {
            sleep(FLASH_DURATION).await;
            view.cue_ended(color);
        });
    }

    fn cancel_playbacks(&mut self) {
        if self.playbacks.is_empty() {
            return;
        }
        let mut cancelled = false;
        for handle in self.playbacks.drain(..) {
            if !handle.is_finished() {
                handle.abort();
                cancelled = true;
            }
        }
        if cancelled {
            debug!("cancelled scheduled playback");
            self.view.cues_cleared();
        }
    }

    fn validate(&mut self) {
        self.transition(RoundPhase::Validating);
        let submitted = self.state.user_input.clone();
        debug!(len = submitted.len(), "submitting sequence");

        let epoch = self.epoch;
        let service = Arc::clone(&self.service);
        let events = self.events_tx.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let outcome = service.submit_sequence(&submitted).await;
            let _ = events.send(RoundEvent::Validated { epoch, outcome });
        }));
    }

    fn handle_event(&mut self, event: RoundEvent) {
        match event {
            RoundEvent::Validated { epoch, outcome } => {
                if epoch != self.epoch || self.phase != RoundPhase::Validating {
                    warn!(epoch, current = self.epoch, "dropping stale validation outcome");
                    return;
                }
                self.in_flight = None;
                match outcome {
                    Ok(next) => self.advance_round(next),
                    Err(ServiceError::SequenceMismatch) => {
                        info!(level = self.state.level, "sequence mismatch");
                        self.view.failure_indicator(true);
                        self.transition(RoundPhase::Failed);
                    }
                    Err(err) => {
                        error!(error = %err, "failed to validate sequence");
                        self.view.service_error(&err);
                        self.transition(RoundPhase::Stalled(StallPoint::Validate));
                    }
                }
            }
            RoundEvent::AdvanceDue { epoch } => {
                if epoch != self.epoch || self.phase != RoundPhase::AdvancingRound {
                    debug!(epoch, current = self.epoch, "dropping stale round advance");
                    return;
                }
                self.transition(RoundPhase::AwaitingInput);
                self.playback();
            }
        }
    }

    fn advance_round(&mut self, next: GameStateDto) {
        self.replace_state(next);
        self.transition(RoundPhase::AdvancingRound);

        let epoch = self.epoch;
        let events = self.events_tx.clone();
        self.playbacks.push(tokio::spawn(async move {
            sleep(ADVANCE_DELAY).await;
            let _ = events.send(RoundEvent::AdvanceDue { epoch });
        }));
    }
}

/// Cloneable sender side of a running [`RoundController`].
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<ControllerCommand>,
}

impl ControllerHandle {
    pub async fn send(&self, command: ControllerCommand) -> Result<(), ControllerError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| ControllerError::Closed)
    }

    /// For callers outside the runtime, e.g. a UI thread.
    pub fn blocking_send(&self, command: ControllerCommand) -> Result<(), ControllerError> {
        self.tx
            .blocking_send(command)
            .map_err(|_| ControllerError::Closed)
    }
}

/// Spawns the controller onto the current runtime and queues its initial
/// `Initialize`.
pub fn spawn_controller<S: GameStateService, V: RoundView>(
    service: Arc<S>,
    view: Arc<V>,
) -> (ControllerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
    // The queue is empty, so this cannot fail for lack of capacity.
    let _ = tx.try_send(ControllerCommand::Initialize);
    let controller = RoundController::new(service, view);
    let task = tokio::spawn(controller.run(rx));
    (ControllerHandle { tx }, task)
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
