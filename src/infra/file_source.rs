use crate::app::ports::SourceFetcher;
use crate::config::SourceConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use serde_json::Value;

/// Reads source documents from local files, for offline runs against frozen
/// snapshots. A leading `file://` is stripped.
pub struct FsSource;

impl FsSource {
    pub fn path_of(location: &str) -> &str {
        location.strip_prefix("file://").unwrap_or(location)
    }
}

#[async_trait]
impl SourceFetcher for FsSource {
    async fn fetch(&self, source: &SourceConfig) -> Result<Value, FetchError> {
        let path = Self::path_of(&source.url);
        let bytes = tokio::fs::read(path).await.map_err(|e| FetchError::File {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Body(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_reads_local_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buff.json");
        std::fs::write(&path, r#"{"A": {"price": 1, "stock": 2}}"#).unwrap();

        let source = SourceConfig::new("buff", format!("file://{}", path.display()));
        let doc = FsSource.fetch(&source).await.unwrap();
        assert_eq!(doc, json!({"A": {"price": 1, "stock": 2}}));
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_error() {
        let source = SourceConfig::new("buff", "/definitely/not/here.json");
        let err = FsSource.fetch(&source).await.unwrap_err();
        assert!(matches!(err, FetchError::File { .. }));
    }

    #[tokio::test]
    async fn test_invalid_json_is_body_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let source = SourceConfig::new("buff", path.display().to_string());
        let err = FsSource.fetch(&source).await.unwrap_err();
        assert!(matches!(err, FetchError::Body(_)));
    }
}
