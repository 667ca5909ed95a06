use client_core::{Controls, RoundPhase};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use serde::{Deserialize, Serialize};
use shared::domain::{PadColor, Waveform};

use crate::audio::ToneVoice;
use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

pub const SETTINGS_STORAGE_KEY: &str = "simon_desktop_settings";

const PAD_SIZE: f32 = 160.0;
const PAD_GAP: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSettings {
    pub waveform: Waveform,
}

fn pad_fill(color: PadColor, lit: bool, enabled: bool) -> egui::Color32 {
    let (r, g, b) = match color {
        PadColor::Red => (200, 40, 40),
        PadColor::Yellow => (215, 190, 30),
        PadColor::Green => (40, 170, 70),
        PadColor::Blue => (40, 90, 210),
    };
    if lit {
        lighten(egui::Color32::from_rgb(r, g, b), 0.6)
    } else if enabled {
        egui::Color32::from_rgb(r, g, b)
    } else {
        egui::Color32::from_rgb(r / 2, g / 2, b / 2)
    }
}

fn lighten(c: egui::Color32, t: f32) -> egui::Color32 {
    let mix = |v: u8| -> u8 { (v as f32 + (255.0 - v as f32) * t).round() as u8 };
    egui::Color32::from_rgb(mix(c.r()), mix(c.g()), mix(c.b()))
}

fn phase_label(phase: RoundPhase) -> &'static str {
    match phase {
        RoundPhase::Idle => "Loading game...",
        RoundPhase::Ready => "Press Start",
        RoundPhase::AwaitingInput => "Your turn",
        RoundPhase::Validating => "Checking...",
        RoundPhase::AdvancingRound => "Correct! Next round...",
        RoundPhase::Failed => "Wrong sequence",
        RoundPhase::Stalled(_) => "Game server unavailable",
    }
}

fn pad_caption(color: PadColor) -> String {
    format!("{}  {}", color.key().to_ascii_uppercase(), color.note().label())
}

/// Pads pressed through the keyboard this frame, in press order.
fn pressed_pad_keys(ctx: &egui::Context) -> Vec<PadColor> {
    ctx.input(|i| {
        i.events
            .iter()
            .filter_map(|event| match event {
                egui::Event::Key {
                    key,
                    pressed: true,
                    repeat: false,
                    ..
                } => key
                    .name()
                    .chars()
                    .next()
                    .filter(|_| key.name().len() == 1)
                    .and_then(PadColor::from_key),
                _ => None,
            })
            .collect()
    })
}

pub struct SimonApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    voice: ToneVoice,
    waveform: Waveform,
    phase: RoundPhase,
    controls: Controls,
    level: u32,
    high_score: u32,
    lit: [bool; 4],
    failure_visible: bool,
    status: String,
    last_error: Option<UiError>,
}

impl SimonApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        voice: ToneVoice,
        waveform: Waveform,
    ) -> Self {
        voice.trigger().set_waveform(waveform);
        Self {
            cmd_tx,
            ui_rx,
            voice,
            waveform,
            phase: RoundPhase::Idle,
            controls: Controls::default(),
            level: 1,
            high_score: 0,
            lit: [false; 4],
            failure_visible: false,
            status: String::new(),
            last_error: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.apply_event(event);
        }
    }

    fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info(message) => self.status = message,
            UiEvent::Error(err) => {
                tracing::debug!(category = ?err.category(), "showing error: {}", err.message());
                self.status = err.message().to_string();
                self.last_error = Some(err);
            }
            UiEvent::CueStarted(cue) => self.lit[cue.color.index()] = true,
            UiEvent::CueEnded(color) => self.lit[color.index()] = false,
            UiEvent::CuesCleared => self.lit = [false; 4],
            UiEvent::RoundUpdated { level, high_score } => {
                self.level = level;
                self.high_score = high_score;
            }
            UiEvent::PhaseChanged { phase, controls } => {
                self.phase = phase;
                self.controls = controls;
                if !matches!(phase, RoundPhase::Stalled(_)) {
                    self.last_error = None;
                    self.status.clear();
                }
            }
            UiEvent::FailureIndicator(visible) => self.failure_visible = visible,
        }
    }

    fn send(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        if !self.controls.pads {
            return;
        }
        for color in pressed_pad_keys(ctx) {
            self.send(BackendCommand::PressPad(color));
        }
    }

    fn show_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Simon");
            ui.separator();
            ui.label(phase_label(self.phase));
            ui.separator();
            ui.label(format!("Level {}", self.level));
            ui.separator();
            ui.label(format!("High score: {}", self.high_score));
        });
        ui.label(self.status.as_str());
    }

    fn show_pads(&mut self, ui: &mut egui::Ui) {
        let enabled = self.controls.pads;
        for row in PadColor::ALL.chunks(2) {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = PAD_GAP;
                for &color in row {
                    let (rect, response) = ui.allocate_exact_size(
                        egui::vec2(PAD_SIZE, PAD_SIZE),
                        egui::Sense::click(),
                    );
                    let fill = pad_fill(color, self.lit[color.index()], enabled);
                    ui.painter()
                        .rect_filled(rect, egui::CornerRadius::same(12), fill);
                    ui.painter().text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        pad_caption(color),
                        egui::FontId::proportional(22.0),
                        egui::Color32::from_white_alpha(160),
                    );
                    if enabled && response.clicked() {
                        self.send(BackendCommand::PressPad(color));
                    }
                }
            });
            ui.add_space(PAD_GAP);
        }
    }

    fn show_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui
                .add_enabled(self.controls.start, egui::Button::new("Start"))
                .clicked()
            {
                self.send(BackendCommand::StartRound);
            }
            if ui
                .add_enabled(self.controls.replay, egui::Button::new("Replay"))
                .clicked()
            {
                self.send(BackendCommand::Replay);
            }
            if ui
                .add_enabled(self.controls.reset, egui::Button::new("New game"))
                .clicked()
            {
                self.send(BackendCommand::Reset);
            }
            if self.controls.retry && ui.button("Retry").clicked() {
                self.send(BackendCommand::Retry);
            }

            ui.separator();
            let before = self.waveform;
            egui::ComboBox::from_label("Voice")
                .selected_text(self.waveform.name())
                .show_ui(ui, |ui| {
                    for waveform in Waveform::ALL {
                        ui.selectable_value(&mut self.waveform, waveform, waveform.name());
                    }
                });
            if self.waveform != before {
                tracing::debug!(waveform = %self.waveform, "voice changed");
                self.voice.trigger().set_waveform(self.waveform);
            }
        });

        if let Some(err) = self.last_error.as_ref().filter(|err| err.is_retryable()) {
            ui.colored_label(egui::Color32::from_rgb(220, 90, 90), err.message());
        }
    }

    fn show_failure_modal(&mut self, ctx: &egui::Context) {
        if !self.failure_visible {
            return;
        }
        egui::Window::new("Game over")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("That was not the sequence.");
                ui.label(format!("You reached level {}.", self.level));
                if ui
                    .add_enabled(self.controls.acknowledge, egui::Button::new("Play again"))
                    .clicked()
                {
                    self.send(BackendCommand::AcknowledgeFailure);
                }
            });
    }
}

impl eframe::App for SimonApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.handle_keyboard(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_header(ui);
            ui.add_space(PAD_GAP);
            self.show_pads(ui);
            self.show_controls(ui);
        });
        self.show_failure_modal(ctx);

        if self.lit.iter().any(|lit| *lit) {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedSettings {
            waveform: self.waveform,
        };
        if let Ok(serialized) = serde_json::to_string(&settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::StallPoint;
    use crossbeam_channel::bounded;
    use shared::domain::Cue;

    fn app() -> (SimonApp, Receiver<BackendCommand>) {
        let (cmd_tx, cmd_rx) = bounded(16);
        let (_ui_tx, ui_rx) = bounded(16);
        let voice = ToneVoice::silent(Waveform::Sine);
        (SimonApp::new(cmd_tx, ui_rx, voice, Waveform::Sine), cmd_rx)
    }

    #[test]
    fn cue_events_light_and_release_pads() {
        let (mut app, _) = app();
        app.apply_event(UiEvent::CueStarted(Cue::new(PadColor::Green)));
        assert_eq!(app.lit, [false, false, true, false]);
        app.apply_event(UiEvent::CueEnded(PadColor::Green));
        assert_eq!(app.lit, [false; 4]);
        app.apply_event(UiEvent::CueStarted(Cue::new(PadColor::Red)));
        app.apply_event(UiEvent::CuesCleared);
        assert_eq!(app.lit, [false; 4]);
    }

    #[test]
    fn phase_change_updates_controls_and_clears_resolved_errors() {
        let (mut app, _) = app();
        app.apply_event(UiEvent::Error(UiError::startup("boom")));
        app.apply_event(UiEvent::PhaseChanged {
            phase: RoundPhase::Stalled(StallPoint::Initialize),
            controls: Controls::for_phase(RoundPhase::Stalled(StallPoint::Initialize)),
        });
        assert!(app.last_error.is_some());
        assert!(app.controls.retry);

        app.apply_event(UiEvent::PhaseChanged {
            phase: RoundPhase::Ready,
            controls: Controls::for_phase(RoundPhase::Ready),
        });
        assert!(app.last_error.is_none());
        assert!(app.controls.start);
        assert_eq!(phase_label(app.phase), "Press Start");
        assert!(app.status.is_empty());
    }

    #[test]
    fn round_update_refreshes_score_display() {
        let (mut app, _) = app();
        app.apply_event(UiEvent::RoundUpdated {
            level: 4,
            high_score: 3,
        });
        assert_eq!((app.level, app.high_score), (4, 3));
    }

    #[test]
    fn failure_indicator_follows_events() {
        let (mut app, cmd_rx) = app();
        app.apply_event(UiEvent::FailureIndicator(true));
        assert!(app.failure_visible);
        app.send(BackendCommand::AcknowledgeFailure);
        assert_eq!(cmd_rx.try_recv(), Ok(BackendCommand::AcknowledgeFailure));
        app.apply_event(UiEvent::FailureIndicator(false));
        assert!(!app.failure_visible);
    }

    #[test]
    fn pad_caption_names_key_and_note() {
        assert_eq!(pad_caption(PadColor::Red), "Q  C4");
        assert_eq!(pad_caption(PadColor::Blue), "S  F4");
    }

    #[test]
    fn lighten_moves_toward_white() {
        let lit = lighten(egui::Color32::from_rgb(0, 100, 200), 0.5);
        assert_eq!((lit.r(), lit.g(), lit.b()), (128, 178, 228));
    }
}
