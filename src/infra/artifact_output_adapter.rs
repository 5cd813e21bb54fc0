use crate::app::ports::ArtifactSink;
use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes the filter result and the diagnostic log to files, replacing any
/// previous contents.
pub struct FileArtifactOutputAdapter {
    output_path: PathBuf,
    log_path: PathBuf,
}

impl FileArtifactOutputAdapter {
    pub fn new(output_path: impl Into<PathBuf>, log_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            log_path: log_path.into(),
        }
    }

    async fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        tokio::fs::write(path, contents)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} ({} bytes)", path.display(), contents.len());
        Ok(())
    }
}

#[async_trait]
impl ArtifactSink for FileArtifactOutputAdapter {
    async fn write_output(&self, contents: &str) -> anyhow::Result<()> {
        Self::write_file(&self.output_path, contents).await
    }

    async fn write_report(&self, contents: &str) -> anyhow::Result<()> {
        Self::write_file(&self.log_path, contents).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writes_overwrite_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out/filtered.json");
        let log = dir.path().join("debug-log.txt");
        let sink = FileArtifactOutputAdapter::new(&output, &log);

        sink.write_report("first run with a long log\n").await.unwrap();
        sink.write_report("second\n").await.unwrap();
        sink.write_output("{}").await.unwrap();

        assert_eq!(std::fs::read_to_string(&log).unwrap(), "second\n");
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_unwritable_path_errors() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let sink = FileArtifactOutputAdapter::new(blocker.join("out.json"), dir.path().join("log.txt"));

        assert!(sink.write_output("{}").await.is_err());
    }
}
