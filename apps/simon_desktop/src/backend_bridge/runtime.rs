//! Runtime bridge between UI command queue and the round controller.

use std::{sync::Arc, thread, time::Duration};

use client_core::{
    spawn_controller, Controls, GameStateClient, RoundPhase, RoundView, ServiceError,
};
use crossbeam_channel::{Receiver, SendTimeoutError, Sender, TrySendError};
use eframe::egui;
use shared::domain::{Cue, PadColor};

use crate::audio::VoiceTrigger;
use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiEvent};

const STATE_EVENT_TIMEOUT: Duration = Duration::from_secs(2);

/// [`RoundView`] that sounds cues directly and forwards everything else to
/// the UI thread.
pub struct ChannelView {
    ui_tx: Sender<UiEvent>,
    voice: VoiceTrigger,
    repaint: egui::Context,
}

impl ChannelView {
    pub fn new(ui_tx: Sender<UiEvent>, voice: VoiceTrigger, repaint: egui::Context) -> Self {
        Self {
            ui_tx,
            voice,
            repaint,
        }
    }

    fn push(&self, event: UiEvent) {
        if event.is_droppable() {
            if let Err(TrySendError::Full(event)) = self.ui_tx.try_send(event) {
                tracing::debug!(?event, "ui event queue full; dropping cue");
            }
        } else {
            // State events must reach the window or its controls go stale; wait
            // for the frame loop to drain the queue.
            self.repaint.request_repaint();
            match self.ui_tx.send_timeout(event, STATE_EVENT_TIMEOUT) {
                Ok(()) | Err(SendTimeoutError::Disconnected(_)) => {}
                Err(SendTimeoutError::Timeout(event)) => {
                    tracing::error!(?event, "ui stopped draining events; state update lost");
                }
            }
        }
        self.repaint.request_repaint();
    }
}

impl RoundView for ChannelView {
    fn cue_started(&self, cue: Cue) {
        self.voice.play(cue.note);
        self.push(UiEvent::CueStarted(cue));
    }

    fn cue_ended(&self, color: PadColor) {
        self.push(UiEvent::CueEnded(color));
    }

    fn cues_cleared(&self) {
        self.push(UiEvent::CuesCleared);
    }

    fn round_updated(&self, level: u32, high_score: u32) {
        self.push(UiEvent::RoundUpdated { level, high_score });
    }

    fn phase_changed(&self, phase: RoundPhase, controls: Controls) {
        self.push(UiEvent::PhaseChanged { phase, controls });
    }

    fn failure_indicator(&self, visible: bool) {
        self.push(UiEvent::FailureIndicator(visible));
    }

    fn service_error(&self, error: &ServiceError) {
        self.push(UiEvent::Error(UiError::from_service(error)));
    }
}

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    client: GameStateClient,
    voice: VoiceTrigger,
    repaint: egui::Context,
) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info(format!(
            "Connecting to {}",
            client.base_url()
        )));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::startup(format!(
                    "backend worker startup failure: failed to build runtime: {err}"
                ))));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let view = Arc::new(ChannelView::new(ui_tx, voice, repaint));
            let (handle, controller) = spawn_controller(Arc::new(client), view);

            let forward = tokio::task::spawn_blocking(move || {
                while let Ok(cmd) = cmd_rx.recv() {
                    if handle.blocking_send(cmd.into()).is_err() {
                        tracing::error!("round controller stopped; dropping ui commands");
                        break;
                    }
                }
            });

            if let Err(err) = forward.await {
                tracing::error!("ui command forwarder failed: {err}");
            }
            if let Err(err) = controller.await {
                tracing::error!("round controller task failed: {err}");
            }
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use shared::domain::Waveform;

    use crate::audio::ToneVoice;

    fn view(capacity: usize) -> (ChannelView, Receiver<UiEvent>) {
        let (ui_tx, ui_rx) = bounded(capacity);
        let voice = ToneVoice::silent(Waveform::Sine).trigger();
        (ChannelView::new(ui_tx, voice, egui::Context::default()), ui_rx)
    }

    #[test]
    fn full_queue_drops_cues_but_waits_to_deliver_phase_changes() {
        let (view, ui_rx) = view(1);
        view.cue_started(Cue::new(PadColor::Red));
        view.cue_ended(PadColor::Red);

        let drain = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            ui_rx.iter().take(2).collect::<Vec<_>>()
        });
        view.phase_changed(RoundPhase::Ready, Controls::for_phase(RoundPhase::Ready));

        let delivered = drain.join().expect("drain thread");
        assert_eq!(
            delivered,
            vec![
                UiEvent::CueStarted(Cue::new(PadColor::Red)),
                UiEvent::PhaseChanged {
                    phase: RoundPhase::Ready,
                    controls: Controls::for_phase(RoundPhase::Ready),
                },
            ]
        );
    }

    #[test]
    fn closed_ui_queue_does_not_block_state_events() {
        let (view, ui_rx) = view(1);
        drop(ui_rx);
        view.failure_indicator(true);
        view.cues_cleared();
    }
}
