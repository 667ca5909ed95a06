use super::{apply_env, apply_file, load_settings, parse_backend_url, Settings};

use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

use shared::domain::Waveform;

fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn defaults_point_at_local_game_state_service() {
    let settings = Settings::default();
    assert_eq!(
        settings.backend_url,
        "http://localhost:3000/api/v1/game-state"
    );
    assert_eq!(settings.waveform, Waveform::Sine);
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        "backend_url = \"http://simon.local/game-state\"\nwaveform = \"triangle\"\nrequest_timeout_ms = 750\n",
    )
    .expect("apply file");
    assert_eq!(settings.backend_url, "http://simon.local/game-state");
    assert_eq!(settings.waveform, Waveform::Triangle);
    assert_eq!(settings.request_timeout_ms, 750);
}

#[test]
fn unknown_waveform_in_file_is_an_error() {
    let mut settings = Settings::default();
    assert!(apply_file(&mut settings, "waveform = \"organ\"\n").is_err());
}

#[test]
fn app_prefixed_env_wins_over_plain_env() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        lookup_from(&[
            ("SIMON_BACKEND_URL", "http://plain/game-state"),
            ("APP__BACKEND_URL", "http://prefixed/game-state"),
            ("APP__WAVEFORM", "square"),
            ("APP__REQUEST_TIMEOUT_MS", "not-a-number"),
        ]),
    );
    assert_eq!(settings.backend_url, "http://prefixed/game-state");
    assert_eq!(settings.waveform, Waveform::Square);
    assert_eq!(settings.request_timeout_ms, Settings::default().request_timeout_ms);
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("simon_missing_{suffix}.toml"));
    let settings = load_settings(&path).expect("load");
    assert_eq!(settings.waveform, Settings::default().waveform);
}

#[test]
fn malformed_config_file_is_reported() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("simon_bad_{suffix}.toml"));
    fs::write(&path, "backend_url = [").expect("write");

    let err = load_settings(&path).expect_err("malformed");
    assert!(err.to_string().contains("invalid config file"));

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn backend_url_must_be_http() {
    assert!(parse_backend_url("http://localhost:3000/api/v1/game-state").is_ok());
    assert!(parse_backend_url("ftp://localhost/game-state").is_err());
    assert!(parse_backend_url("not a url").is_err());
}
