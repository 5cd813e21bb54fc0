use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::app::ports::{ArtifactSink, SourceFetcher};
use crate::config::{Config, SourceConfig};
use crate::error::FetchError;
use crate::observability::metrics;
use crate::pipeline::normalize::{normalize, NormalizedSource};
use crate::pipeline::report::{RunReport, RunStats};
use crate::pipeline::{filter_sources, FilterResult};

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// All sources fetched; the artifact holds `stats.passed` items
    Completed { stats: RunStats },
    /// At least one source failed; the artifact was written empty
    Aborted { failures: Vec<(String, FetchError)> },
}

impl RunOutcome {
    pub fn passed(&self) -> usize {
        match self {
            RunOutcome::Completed { stats } => stats.passed,
            RunOutcome::Aborted { .. } => 0,
        }
    }
}

/// One batch run: fetch the three sources, normalize, join, filter, and
/// persist the artifact and the diagnostic log.
pub struct FilterUseCase {
    config: Config,
    fetcher: Box<dyn SourceFetcher>,
    sink: Box<dyn ArtifactSink>,
}

impl FilterUseCase {
    pub fn new(config: Config, fetcher: Box<dyn SourceFetcher>, sink: Box<dyn ArtifactSink>) -> Self {
        Self { config, fetcher, sink }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        self.run_at(Utc::now()).await
    }

    /// Run with an explicit start timestamp (recorded in the diagnostic log).
    #[instrument(skip(self), fields(primary = %self.config.sources.primary.name))]
    pub async fn run_at(&self, started_at: DateTime<Utc>) -> Result<RunOutcome> {
        let t_run = Instant::now();
        let sources = &self.config.sources;
        let mut report = RunReport::begin(started_at, &sources.primary.name, &self.config.thresholds);

        // The three retrievals are independent; all must settle before normalizing
        let (primary, compare_a, compare_b) = tokio::join!(
            self.fetch_source(&sources.primary),
            self.fetch_source(&sources.compare_a),
            self.fetch_source(&sources.compare_b),
        );

        let (raw_primary, raw_compare_a, raw_compare_b) = match (primary, compare_a, compare_b) {
            (Ok(p), Ok(a), Ok(b)) => (p, a, b),
            (p, a, b) => {
                let failures: Vec<(String, FetchError)> = [(&sources.primary, p), (&sources.compare_a, a), (&sources.compare_b, b)]
                    .into_iter()
                    .filter_map(|(source, result)| result.err().map(|e| (source, e)))
                    .map(|(source, e)| {
                        report.fetch_failure(&source.name, &source.url, &e);
                        (source.name.clone(), e)
                    })
                    .collect();
                report.aborted();
                return self.abort(report, failures).await;
            }
        };

        let reserved = &sources.reserved_keys;
        let primary = normalize(&raw_primary, reserved);
        let compare_a = normalize(&raw_compare_a, reserved);
        let compare_b = normalize(&raw_compare_b, reserved);
        drop((raw_primary, raw_compare_a, raw_compare_b));

        for (source, normalized) in [
            (&sources.primary, &primary),
            (&sources.compare_a, &compare_a),
            (&sources.compare_b, &compare_b),
        ] {
            self.record_normalized(&mut report, source, normalized);
        }
        report.blank();
        report.sample_keys(&sources.primary.name, &primary, self.config.output.sample_size);
        report.blank();

        let (result, stats) = filter_sources(
            &primary,
            &compare_a,
            &compare_b,
            &self.config.thresholds,
            &self.config.output.fields,
            &self.config.source_names(),
        );
        report.stats(&sources.primary.name, &stats);
        metrics::filter::pass_completed(&stats);

        info!(
            checked = stats.checked,
            present_in_all = stats.present_in_all,
            passed = stats.passed,
            "Filter pass finished"
        );

        self.persist(&result, &report).await?;
        metrics::run::completed(t_run.elapsed().as_secs_f64());

        Ok(RunOutcome::Completed { stats })
    }

    async fn fetch_source(&self, source: &SourceConfig) -> Result<Value, FetchError> {
        let t_fetch = Instant::now();
        let fetched = self.fetcher.fetch(source).await.and_then(|document| {
            if document.is_object() {
                Ok(document)
            } else {
                Err(FetchError::Body("expected a JSON object at the document root".to_string()))
            }
        });

        match &fetched {
            Ok(_) => {
                let secs = t_fetch.elapsed().as_secs_f64();
                info!(source = %source.name, "Fetched {} in {:.2}s", source.url, secs);
                metrics::sources::fetch_success(&source.name, secs);
            }
            Err(e) => {
                error!(source = %source.name, "Failed to fetch {}: {}", source.url, e);
                metrics::sources::fetch_error(&source.name, e.kind());
            }
        }
        fetched
    }

    fn record_normalized(&self, report: &mut RunReport, source: &SourceConfig, normalized: &NormalizedSource) {
        if normalized.excluded() > 0 {
            warn!(
                source = %source.name,
                "Excluded {} malformed entries",
                normalized.excluded()
            );
        }
        info!(source = %source.name, items = normalized.len(), "Normalized source");
        metrics::normalize::source_normalized(&source.name, normalized.len(), normalized.excluded());
        report.source_count(&source.name, normalized);
    }

    async fn abort(&self, report: RunReport, failures: Vec<(String, FetchError)>) -> Result<RunOutcome> {
        warn!("{} of 3 sources failed, writing empty result", failures.len());
        self.persist(&FilterResult::new(), &report).await?;
        metrics::run::aborted();
        Ok(RunOutcome::Aborted { failures })
    }

    async fn persist(&self, result: &FilterResult, report: &RunReport) -> Result<()> {
        let json = result.to_pretty_json().context("Failed to serialize filter result")?;
        self.sink
            .write_output(&json)
            .await
            .context("Failed to write output artifact")?;
        self.sink
            .write_report(&report.render())
            .await
            .context("Failed to write diagnostic log")?;
        Ok(())
    }
}
