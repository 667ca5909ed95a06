use std::path::PathBuf;

mod audio;
mod backend_bridge;
mod config;
mod controller;
mod ui;

use anyhow::Context;
use clap::Parser;
use client_core::GameStateClient;
use crossbeam_channel::bounded;
use eframe::egui;
use shared::domain::Waveform;
use tracing_subscriber::EnvFilter;

use crate::audio::ToneVoice;
use crate::backend_bridge::commands::BackendCommand;
use crate::config::{load_settings, parse_backend_url, DEFAULT_CONFIG_FILE};
use crate::controller::events::UiEvent;
use crate::ui::{PersistedSettings, SimonApp, SETTINGS_STORAGE_KEY};

#[derive(Parser, Debug)]
#[command(about = "Pad memory game backed by a remote game-state service")]
struct Args {
    /// Path of the optional TOML settings file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Base URL of the game-state endpoint.
    #[arg(long)]
    backend_url: Option<String>,
    /// Initial voice: sine, square, triangle or sawtooth.
    #[arg(long)]
    waveform: Option<Waveform>,
    #[arg(long)]
    request_timeout_ms: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(v) = args.backend_url {
        settings.backend_url = v;
    }
    if let Some(v) = args.request_timeout_ms {
        settings.request_timeout_ms = v;
    }

    let backend_url = parse_backend_url(&settings.backend_url)?;
    let client = GameStateClient::with_timeout(backend_url, settings.request_timeout())
        .context("failed to build game-state http client")?;
    tracing::info!(backend = %client.base_url(), "starting simon desktop");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(1024);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Simon")
            .with_inner_size([420.0, 560.0])
            .with_min_inner_size([380.0, 520.0]),
        ..Default::default()
    };
    // An explicit --waveform beats the voice remembered from the last session.
    let cli_waveform = args.waveform;
    let default_waveform = settings.waveform;
    eframe::run_native(
        "Simon",
        options,
        Box::new(move |cc| {
            let persisted = cc
                .storage
                .and_then(|storage| storage.get_string(SETTINGS_STORAGE_KEY))
                .and_then(|text| serde_json::from_str::<PersistedSettings>(&text).ok())
                .map(|persisted| persisted.waveform);
            let waveform = cli_waveform.or(persisted).unwrap_or(default_waveform);

            let voice = ToneVoice::open(waveform);
            backend_bridge::runtime::launch(
                cmd_rx,
                ui_tx,
                client,
                voice.trigger(),
                cc.egui_ctx.clone(),
            );
            Ok(Box::new(SimonApp::new(cmd_tx, ui_rx, voice, waveform)))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed to run game window: {err}"))
}
