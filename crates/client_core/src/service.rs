use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::PadColor,
    error::ApiError,
    protocol::{GameStateDto, GameStateEnvelope, SequenceSubmission},
};
use tracing::debug;
use url::Url;

use crate::error::ServiceError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000/api/v1/game-state";

/// Remote authority over sequences, levels and scores.
#[async_trait]
pub trait GameStateService: Send + Sync + 'static {
    /// Starts a new game and returns its first round.
    async fn reset(&self) -> Result<GameStateDto, ServiceError>;

    /// Submits the player's input for the current round. A wrong sequence is
    /// reported as [`ServiceError::SequenceMismatch`].
    async fn submit_sequence(&self, sequence: &[PadColor]) -> Result<GameStateDto, ServiceError>;
}

pub struct GameStateClient {
    http: Client,
    base_url: Url,
}

impl GameStateClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self, ServiceError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn sequence_url(&self) -> String {
        format!("{}/sequence", self.base_url.as_str().trim_end_matches('/'))
    }
}

#[async_trait]
impl GameStateService for GameStateClient {
    async fn reset(&self) -> Result<GameStateDto, ServiceError> {
        debug!(url = %self.base_url, "PUT game state");
        let res = self.http.put(self.base_url.clone()).send().await?;
        if !res.status().is_success() {
            return Err(status_error(res).await);
        }
        read_game_state(res).await
    }

    async fn submit_sequence(&self, sequence: &[PadColor]) -> Result<GameStateDto, ServiceError> {
        let url = self.sequence_url();
        debug!(%url, len = sequence.len(), "POST sequence");
        let res = self
            .http
            .post(url)
            .json(&SequenceSubmission {
                sequence: sequence.to_vec(),
            })
            .send()
            .await?;
        if res.status() == StatusCode::BAD_REQUEST {
            return Err(ServiceError::SequenceMismatch);
        }
        if !res.status().is_success() {
            return Err(status_error(res).await);
        }
        read_game_state(res).await
    }
}

async fn status_error(res: Response) -> ServiceError {
    let status = res.status().as_u16();
    let message = res
        .json::<ApiError>()
        .await
        .map(|body| body.message)
        .unwrap_or_default();
    ServiceError::Status { status, message }
}

async fn read_game_state(res: Response) -> Result<GameStateDto, ServiceError> {
    let body = res.bytes().await?;
    let envelope: GameStateEnvelope = serde_json::from_slice(&body)
        .map_err(|err| ServiceError::Malformed(err.to_string()))?;
    let state = envelope.game_state;
    if state.sequence.is_empty() {
        return Err(ServiceError::Malformed("empty sequence".to_string()));
    }
    if state.level == 0 {
        return Err(ServiceError::Malformed("level must be at least 1".to_string()));
    }
    Ok(state)
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
