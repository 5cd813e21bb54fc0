pub mod artifact_output_adapter;
pub mod file_source;
pub mod http_client;

use async_trait::async_trait;
use serde_json::Value;

use crate::app::ports::SourceFetcher;
use crate::config::SourceConfig;
use crate::error::FetchError;

pub use artifact_output_adapter::FileArtifactOutputAdapter;
pub use file_source::FsSource;
pub use http_client::ReqwestHttp;

/// Routes `http://` and `https://` locations to HTTP, everything else to the
/// local filesystem.
pub struct LocationFetcher {
    http: ReqwestHttp,
    fs: FsSource,
}

impl LocationFetcher {
    pub fn new(http: ReqwestHttp) -> Self {
        Self { http, fs: FsSource }
    }

    pub fn is_remote(location: &str) -> bool {
        let lower = location.trim_start().to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }
}

#[async_trait]
impl SourceFetcher for LocationFetcher {
    async fn fetch(&self, source: &SourceConfig) -> Result<Value, FetchError> {
        if Self::is_remote(&source.url) {
            self.http.fetch(source).await
        } else {
            self.fs.fetch(source).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote() {
        assert!(LocationFetcher::is_remote("https://jakupl.github.io/buff/buffPriceList.json"));
        assert!(LocationFetcher::is_remote("HTTP://localhost:8080/a.json"));
        assert!(!LocationFetcher::is_remote("file:///tmp/a.json"));
        assert!(!LocationFetcher::is_remote("snapshots/buff.json"));
    }
}
