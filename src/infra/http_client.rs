use crate::app::ports::SourceFetcher;
use crate::config::SourceConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Fetches source documents over HTTP(S).
pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    /// Without a timeout a hung server blocks the run indefinitely.
    pub fn new(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SourceFetcher for ReqwestHttp {
    async fn fetch(&self, source: &SourceConfig) -> Result<Value, FetchError> {
        let resp = self
            .client
            .get(&source.url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16() });
        }
        let content_length = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        debug!(source = %source.name, ?content_length, "Response headers received");

        let bytes = resp.bytes().await.map_err(|e| FetchError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Body(e.to_string()))
    }
}
