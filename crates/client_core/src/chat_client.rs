use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::Endpoint,
    error::ChatError,
    protocol::{ChatReply, ChatRequest},
};
use tracing::debug;

/// One request/response exchange with the assistant backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, endpoint: &Endpoint, query: &str) -> Result<ChatReply, ChatError>;
}

#[derive(Clone, Default)]
pub struct ChatClient {
    http: Client,
}

impl ChatClient {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }

    /// Builds a client whose requests fail with [`ChatError::Network`] after
    /// `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ChatError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ChatError::Network(err.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn send(&self, endpoint: &Endpoint, query: &str) -> Result<ChatReply, ChatError> {
        let url = endpoint.chat_url();
        debug!(%url, "posting chat query");

        let res = self
            .http
            .post(&url)
            .json(&ChatRequest {
                query: query.to_string(),
            })
            .send()
            .await
            .map_err(|err| ChatError::Network(err.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(ChatError::BadStatus {
                status: status.as_u16(),
            });
        }

        let body = res
            .bytes()
            .await
            .map_err(|err| ChatError::Network(err.to_string()))?;
        serde_json::from_slice::<ChatReply>(&body)
            .map_err(|err| ChatError::MalformedResponse(err.to_string()))
    }
}

#[cfg(test)]
#[path = "tests/chat_client_tests.rs"]
mod tests;
