use std::{f32::consts::TAU, fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Length of one played tone: an eighth note at 120 BPM.
pub const TONE_LENGTH: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadColor {
    Red,
    Yellow,
    Green,
    Blue,
}

struct PadBinding {
    color: PadColor,
    name: &'static str,
    key: char,
    note: Note,
}

// Position in this table is the pad index. Every other mapping reads from it.
static PADS: [PadBinding; 4] = [
    PadBinding {
        color: PadColor::Red,
        name: "red",
        key: 'q',
        note: Note::C4,
    },
    PadBinding {
        color: PadColor::Yellow,
        name: "yellow",
        key: 'w',
        note: Note::D4,
    },
    PadBinding {
        color: PadColor::Green,
        name: "green",
        key: 'a',
        note: Note::E4,
    },
    PadBinding {
        color: PadColor::Blue,
        name: "blue",
        key: 's',
        note: Note::F4,
    },
];

impl PadColor {
    pub const ALL: [PadColor; 4] = [
        PadColor::Red,
        PadColor::Yellow,
        PadColor::Green,
        PadColor::Blue,
    ];

    fn binding(self) -> &'static PadBinding {
        &PADS[self as usize]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        PADS.get(index).map(|pad| pad.color)
    }

    pub fn name(self) -> &'static str {
        self.binding().name
    }

    pub fn key(self) -> char {
        self.binding().key
    }

    /// Resolves a keyboard key to its pad, ignoring case.
    pub fn from_key(key: char) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        PADS.iter().find(|pad| pad.key == key).map(|pad| pad.color)
    }

    pub fn note(self) -> Note {
        self.binding().note
    }
}

impl fmt::Display for PadColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PadColor {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PADS.iter()
            .find(|pad| pad.name.eq_ignore_ascii_case(s.trim()))
            .map(|pad| pad.color)
            .ok_or_else(|| DomainError::UnknownColor(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Note {
    C4,
    D4,
    E4,
    F4,
}

impl Note {
    pub fn frequency_hz(self) -> f32 {
        match self {
            Note::C4 => 261.63,
            Note::D4 => 293.66,
            Note::E4 => 329.63,
            Note::F4 => 349.23,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Note::C4 => "C4",
            Note::D4 => "D4",
            Note::E4 => "E4",
            Note::F4 => "F4",
        }
    }
}

/// Oscillator shape of the tone voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Sawtooth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
        }
    }

    /// Amplitude in `[-1, 1]` at `phase`, measured in cycles (`0.0..1.0`).
    pub fn sample(self, phase: f32) -> f32 {
        let phase = phase.rem_euclid(1.0);
        match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
            Waveform::Sawtooth => 2.0 * phase - 1.0,
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Waveform {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Waveform::ALL
            .into_iter()
            .find(|waveform| waveform.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::UnknownWaveform(s.to_string()))
    }
}

/// One pad flash paired with its tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cue {
    pub color: PadColor,
    pub note: Note,
}

impl Cue {
    pub fn new(color: PadColor) -> Self {
        Self {
            color,
            note: color.note(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_mapping_round_trips_for_every_pad() {
        for color in PadColor::ALL {
            assert_eq!(PadColor::from_index(color.index()), Some(color));
        }
        for index in 0..4 {
            let color = PadColor::from_index(index).expect("pad");
            assert_eq!(color.index(), index);
        }
        assert_eq!(PadColor::from_index(4), None);
    }

    #[test]
    fn key_and_name_bindings_follow_pad_order() {
        let keys: Vec<char> = PadColor::ALL.iter().map(|c| c.key()).collect();
        assert_eq!(keys, vec!['q', 'w', 'a', 's']);
        assert_eq!(PadColor::from_key('A'), Some(PadColor::Green));
        assert_eq!(PadColor::from_key('x'), None);
        for color in PadColor::ALL {
            assert_eq!(color.name().parse::<PadColor>().expect("name"), color);
        }
        assert!("purple".parse::<PadColor>().is_err());
    }

    #[test]
    fn colors_serialize_as_lowercase_names() {
        let json = serde_json::to_string(&PadColor::ALL).expect("serialize");
        assert_eq!(json, r#"["red","yellow","green","blue"]"#);
    }

    #[test]
    fn pads_sound_ascending_notes() {
        let notes: Vec<&str> = PadColor::ALL.iter().map(|c| c.note().label()).collect();
        assert_eq!(notes, vec!["C4", "D4", "E4", "F4"]);
        assert!(Note::C4.frequency_hz() < Note::F4.frequency_hz());
    }

    #[test]
    fn waveforms_stay_in_unit_range() {
        for waveform in Waveform::ALL {
            for step in 0..64 {
                let value = waveform.sample(step as f32 / 64.0);
                assert!((-1.0..=1.0).contains(&value), "{waveform} at {step}");
            }
        }
        assert_eq!(Waveform::Square.sample(0.25), 1.0);
        assert_eq!(Waveform::Triangle.sample(0.5), 1.0);
        assert_eq!(Waveform::Sawtooth.sample(0.0), -1.0);
        assert_eq!("Square".parse::<Waveform>().expect("waveform"), Waveform::Square);
    }
}
