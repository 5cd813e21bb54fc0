//! Metrics for the market filter run
//!
//! Thin wrappers over the `metrics` facade so call sites never spell metric
//! names by hand. The binary installs a Prometheus recorder with [`init`];
//! without one every call is a no-op.

use std::fmt;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

/// All metric names used by the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Run metrics
    RunsCompleted,
    RunsAborted,
    RunDuration,

    // Sources metrics
    SourcesFetchSuccess,
    SourcesFetchError,
    SourcesFetchDuration,

    // Normalize metrics
    NormalizeItemsKept,
    NormalizeItemsExcluded,

    // Filter metrics
    FilterItemsChecked,
    FilterItemsPresentInAll,
    FilterItemsPassed,
    FilterItemsRejected,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RunsCompleted => "market_filter_runs_completed_total",
            MetricName::RunsAborted => "market_filter_runs_aborted_total",
            MetricName::RunDuration => "market_filter_run_duration_seconds",

            MetricName::SourcesFetchSuccess => "market_filter_sources_fetch_success_total",
            MetricName::SourcesFetchError => "market_filter_sources_fetch_error_total",
            MetricName::SourcesFetchDuration => "market_filter_sources_fetch_duration_seconds",

            MetricName::NormalizeItemsKept => "market_filter_normalize_items_kept",
            MetricName::NormalizeItemsExcluded => "market_filter_normalize_items_excluded",

            MetricName::FilterItemsChecked => "market_filter_filter_items_checked",
            MetricName::FilterItemsPresentInAll => "market_filter_filter_items_present_in_all",
            MetricName::FilterItemsPassed => "market_filter_filter_items_passed",
            MetricName::FilterItemsRejected => "market_filter_filter_items_rejected",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Install the Prometheus recorder. Fails if a recorder is already installed.
pub fn init() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;
    info!("Metrics system initialized");
    Ok(handle)
}

/// Push the rendered snapshot to a Prometheus Pushgateway. Failures are
/// logged, never returned: metrics must not fail a run.
pub async fn push(handle: &PrometheusHandle, pushgateway_url: &str, job: &str) {
    let push_url = format!("{}/metrics/job/{}", pushgateway_url.trim_end_matches('/'), job);
    let body = handle.render();

    let client = reqwest::Client::new();
    let res = client
        .put(&push_url)
        .header("Content-Type", "text/plain; version=0.0.4")
        .body(body)
        .send()
        .await;

    match res {
        Ok(r) if r.status().is_success() => {
            info!("Pushed metrics to Pushgateway job={}", job);
        }
        Ok(r) => {
            warn!("Pushgateway push responded with status {} for job={}", r.status().as_u16(), job);
        }
        Err(e) => {
            warn!("Failed to push metrics to Pushgateway for job={}: {}", job, e);
        }
    }
}

pub mod run {
    use super::MetricName;

    pub fn completed(secs: f64) {
        ::metrics::counter!(MetricName::RunsCompleted.as_str()).increment(1);
        ::metrics::histogram!(MetricName::RunDuration.as_str()).record(secs);
    }

    pub fn aborted() {
        ::metrics::counter!(MetricName::RunsAborted.as_str()).increment(1);
    }
}

pub mod sources {
    use super::MetricName;

    pub fn fetch_success(source: &str, secs: f64) {
        ::metrics::counter!(MetricName::SourcesFetchSuccess.as_str(), "source" => source.to_string()).increment(1);
        ::metrics::histogram!(MetricName::SourcesFetchDuration.as_str(), "source" => source.to_string()).record(secs);
    }

    pub fn fetch_error(source: &str, error_type: &str) {
        ::metrics::counter!(MetricName::SourcesFetchError.as_str(),
            "source" => source.to_string(),
            "error_type" => error_type.to_string()
        )
        .increment(1);
    }
}

pub mod normalize {
    use super::MetricName;

    pub fn source_normalized(source: &str, kept: usize, excluded: usize) {
        ::metrics::gauge!(MetricName::NormalizeItemsKept.as_str(), "source" => source.to_string()).set(kept as f64);
        ::metrics::gauge!(MetricName::NormalizeItemsExcluded.as_str(), "source" => source.to_string())
            .set(excluded as f64);
    }
}

pub mod filter {
    use super::MetricName;
    use crate::pipeline::report::RunStats;

    pub fn pass_completed(stats: &RunStats) {
        ::metrics::gauge!(MetricName::FilterItemsChecked.as_str()).set(stats.checked as f64);
        ::metrics::gauge!(MetricName::FilterItemsPresentInAll.as_str()).set(stats.present_in_all as f64);
        ::metrics::gauge!(MetricName::FilterItemsPassed.as_str()).set(stats.passed as f64);
        for (check, count) in &stats.rejected {
            ::metrics::gauge!(MetricName::FilterItemsRejected.as_str(), "check" => check.as_str())
                .set(*count as f64);
        }
    }
}
