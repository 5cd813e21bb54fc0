use async_trait::async_trait;
use serde_json::Value;

use crate::config::SourceConfig;
use crate::error::FetchError;

// Fetch-side port. Failures come back as values; implementations must not panic.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, source: &SourceConfig) -> Result<Value, FetchError>;
}

// Output-side port. Both writes overwrite whatever the previous run left.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn write_output(&self, contents: &str) -> anyhow::Result<()>;
    async fn write_report(&self, contents: &str) -> anyhow::Result<()>;
}
