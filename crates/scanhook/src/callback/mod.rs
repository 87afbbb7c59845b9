use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::models::ChatMessage;

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("callback request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("callback rejected with status {0}")]
    Status(StatusCode),
}

#[derive(Clone)]
pub struct CallbackClient {
    http: reqwest::Client,
}

impl CallbackClient {
    pub fn new(timeout_secs: u64) -> Result<Self, CallbackError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    pub async fn post(&self, url: &str, message: &ChatMessage) -> Result<(), CallbackError> {
        debug!(url, "posting to response_url");
        let response = self.http.post(url).json(message).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CallbackError::Status(status));
        }
        Ok(())
    }
}
