//! Tone voice: a single cpal output stream playing one oscillator note at a time.

use std::sync::{Arc, Mutex};

use shared::domain::{Note, Waveform, TONE_LENGTH};

const GAIN: f32 = 0.2;
const RELEASE_SECS: f32 = 0.02;

struct VoiceState {
    waveform: Waveform,
    frequency_hz: f32,
    phase: f32,
    remaining_secs: f32,
}

impl VoiceState {
    fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            frequency_hz: 0.0,
            phase: 0.0,
            remaining_secs: 0.0,
        }
    }

    fn start(&mut self, note: Note) {
        self.frequency_hz = note.frequency_hz();
        self.phase = 0.0;
        self.remaining_secs = TONE_LENGTH.as_secs_f32();
    }

    fn next_sample(&mut self, sample_rate: f32) -> f32 {
        if self.remaining_secs <= 0.0 {
            return 0.0;
        }
        let envelope = (self.remaining_secs / RELEASE_SECS).min(1.0);
        let value = self.waveform.sample(self.phase) * GAIN * envelope;
        self.phase = (self.phase + self.frequency_hz / sample_rate).fract();
        self.remaining_secs -= 1.0 / sample_rate;
        value
    }
}

/// Send-able control side of the voice, handed to the backend bridge.
#[derive(Clone)]
pub struct VoiceTrigger {
    shared: Arc<Mutex<VoiceState>>,
}

impl VoiceTrigger {
    fn new(waveform: Waveform) -> Self {
        Self {
            shared: Arc::new(Mutex::new(VoiceState::new(waveform))),
        }
    }

    pub fn play(&self, note: Note) {
        if let Ok(mut voice) = self.shared.lock() {
            voice.start(note);
        }
    }

    pub fn set_waveform(&self, waveform: Waveform) {
        if let Ok(mut voice) = self.shared.lock() {
            voice.waveform = waveform;
        }
    }
}

pub struct ToneVoice {
    // Dropping the stream stops output; cpal streams must stay on this thread.
    #[cfg(feature = "audio")]
    _stream: Option<cpal::Stream>,
    trigger: VoiceTrigger,
}

impl ToneVoice {
    /// Opens the default output device. Without one the game still runs,
    /// just silently.
    #[cfg(feature = "audio")]
    pub fn open(waveform: Waveform) -> Self {
        let trigger = VoiceTrigger::new(waveform);
        match build_stream(Arc::clone(&trigger.shared)) {
            Ok(stream) => Self {
                _stream: Some(stream),
                trigger,
            },
            Err(err) => {
                tracing::warn!("audio output unavailable, tones disabled: {err:#}");
                Self::silent(waveform)
            }
        }
    }

    #[cfg(not(feature = "audio"))]
    pub fn open(waveform: Waveform) -> Self {
        tracing::info!("built without the `audio` feature; tones disabled");
        Self::silent(waveform)
    }

    pub fn silent(waveform: Waveform) -> Self {
        Self {
            #[cfg(feature = "audio")]
            _stream: None,
            trigger: VoiceTrigger::new(waveform),
        }
    }

    pub fn trigger(&self) -> VoiceTrigger {
        self.trigger.clone()
    }
}

#[cfg(feature = "audio")]
fn build_stream(shared: Arc<Mutex<VoiceState>>) -> anyhow::Result<cpal::Stream> {
    use anyhow::anyhow;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("no output device is available"))?;
    let preferred = device.default_output_config()?;
    let supported = if preferred.sample_format() == cpal::SampleFormat::F32 {
        preferred
    } else {
        let ranges: Vec<_> = device.supported_output_configs()?.collect();
        pick_f32_config(&ranges, preferred.sample_rate()).ok_or_else(|| {
            anyhow!(
                "no f32 output config; default format is {:?}",
                preferred.sample_format()
            )
        })?
    };

    let config: cpal::StreamConfig = supported.into();
    let channels = usize::from(config.channels).max(1);
    let sample_rate = config.sample_rate.0 as f32;
    tracing::info!(sample_rate, channels, "opened audio output");

    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let Ok(mut voice) = shared.lock() else {
                data.fill(0.0);
                return;
            };
            for frame in data.chunks_mut(channels) {
                let value = voice.next_sample(sample_rate);
                frame.fill(value);
            }
        },
        |err| tracing::error!("audio stream error: {err}"),
        None,
    )?;
    stream.play()?;
    Ok(stream)
}

/// Picks an f32 config, keeping the device's preferred rate when a range
/// allows it. Stereo and mono ranges win over wider layouts.
#[cfg(feature = "audio")]
fn pick_f32_config(
    ranges: &[cpal::SupportedStreamConfigRange],
    preferred_rate: cpal::SampleRate,
) -> Option<cpal::SupportedStreamConfig> {
    let mut candidates: Vec<_> = ranges
        .iter()
        .filter(|range| range.sample_format() == cpal::SampleFormat::F32)
        .collect();
    candidates.sort_by_key(|range| (range.channels() > 2, u16::MAX - range.channels()));
    let range = candidates.into_iter().next()?.clone();
    if range.min_sample_rate() <= preferred_rate && preferred_rate <= range.max_sample_rate() {
        Some(range.with_sample_rate(preferred_rate))
    } else {
        Some(range.with_max_sample_rate())
    }
}
