//! UI layer: the game window with pads, controls and the failure modal.

pub mod app;

pub use app::{PersistedSettings, SimonApp, SETTINGS_STORAGE_KEY};
