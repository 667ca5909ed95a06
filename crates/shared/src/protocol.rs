use serde::{Deserialize, Serialize};

use crate::domain::PadColor;

/// Game state as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateDto {
    pub sequence: Vec<PadColor>,
    pub level: u32,
    #[serde(default)]
    pub high_score: Option<u32>,
}

impl GameStateDto {
    pub fn high_score_or_default(&self) -> u32 {
        self.high_score.unwrap_or(0)
    }
}

/// Body of both `PUT /game-state` and a successful `POST /game-state/sequence`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateEnvelope {
    pub game_state: GameStateDto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceSubmission {
    pub sequence: Vec<PadColor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_high_score_defaults_to_zero() {
        let body = r#"{"gameState":{"sequence":["red"],"level":1}}"#;
        let envelope: GameStateEnvelope = serde_json::from_str(body).expect("parse");
        assert_eq!(envelope.game_state.sequence, vec![PadColor::Red]);
        assert_eq!(envelope.game_state.level, 1);
        assert_eq!(envelope.game_state.high_score_or_default(), 0);
    }

    #[test]
    fn null_high_score_defaults_to_zero() {
        let body = r#"{"gameState":{"sequence":[],"level":3,"highScore":null}}"#;
        let envelope: GameStateEnvelope = serde_json::from_str(body).expect("parse");
        assert_eq!(envelope.game_state.high_score_or_default(), 0);
    }

    #[test]
    fn unknown_color_name_is_rejected() {
        let body = r#"{"gameState":{"sequence":["purple"],"level":1,"highScore":2}}"#;
        assert!(serde_json::from_str::<GameStateEnvelope>(body).is_err());
    }

    #[test]
    fn submission_uses_color_names() {
        let body = SequenceSubmission {
            sequence: vec![PadColor::Red, PadColor::Blue],
        };
        assert_eq!(
            serde_json::to_string(&body).expect("serialize"),
            r#"{"sequence":["red","blue"]}"#
        );
    }
}
