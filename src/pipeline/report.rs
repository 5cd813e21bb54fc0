use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::FetchError;
use crate::pipeline::filter::{Check, ThresholdConfig};
use crate::pipeline::normalize::NormalizedSource;

/// Counters collected during the join-and-filter pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Primary entries examined
    pub checked: usize,
    /// Primary entries with a counterpart in both comparison sources
    pub present_in_all: usize,
    /// Matched triples that satisfied every check
    pub passed: usize,
    /// First failing check per rejected triple
    pub rejected: BTreeMap<Check, usize>,
}

impl RunStats {
    pub fn record_rejection(&mut self, check: Check) {
        *self.rejected.entry(check).or_insert(0) += 1;
    }

    pub fn rejected_by(&self, check: Check) -> usize {
        self.rejected.get(&check).copied().unwrap_or(0)
    }
}

/// Human-readable diagnostic log of one run, built line by line.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    lines: Vec<String>,
}

impl RunReport {
    /// Start a report with the run timestamp and the active price bounds.
    pub fn begin(started_at: DateTime<Utc>, primary_name: &str, thresholds: &ThresholdConfig) -> Self {
        let mut report = Self::default();
        report.push(format!(
            "Started: {}",
            started_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
        report.blank();
        let upper = if thresholds.has_upper_price_bound() {
            thresholds.max_primary_price.to_string()
        } else {
            "no upper limit".to_string()
        };
        report.push(format!(
            "Price filter {}: {} - {}",
            primary_name, thresholds.min_primary_price, upper
        ));
        report.blank();
        report
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub fn source_count(&mut self, name: &str, source: &NormalizedSource) {
        if source.excluded() > 0 {
            self.push(format!(
                "{} items: {} ({} excluded)",
                name,
                source.len(),
                source.excluded()
            ));
        } else {
            self.push(format!("{} items: {}", name, source.len()));
        }
    }

    /// Echo the first `count` keys of a source for spot checks.
    pub fn sample_keys(&mut self, name: &str, source: &NormalizedSource, count: usize) {
        let sample: Vec<&str> = source.keys().take(count).collect();
        let rendered = serde_json::to_string(&sample).unwrap_or_else(|_| format!("{:?}", sample));
        self.push(format!("Sample {} keys: {}", name, rendered));
    }

    pub fn fetch_failure(&mut self, name: &str, location: &str, error: &FetchError) {
        self.push(format!("Fetch failed for {} ({}): {}", name, location, error));
    }

    pub fn aborted(&mut self) {
        self.push("Could not fetch data from one of the sources.");
    }

    pub fn stats(&mut self, primary_name: &str, stats: &RunStats) {
        self.push(format!("Checked {} items: {}", primary_name, stats.checked));
        self.push(format!("Present on all 3 markets: {}", stats.present_in_all));
        self.push(format!("Passed all filters: {}", stats.passed));
        if !stats.rejected.is_empty() {
            self.blank();
            self.push("Rejected by first failing check:");
            for check in Check::ALL {
                let count = stats.rejected_by(check);
                if count > 0 {
                    self.push(format!("  {}: {}", check, count));
                }
            }
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Render as a single text block with a trailing newline.
    pub fn render(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::normalize::normalize;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn started_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_begin_renders_timestamp_and_bounds() {
        let report = RunReport::begin(started_at(), "buff", &ThresholdConfig::default());
        assert_eq!(report.lines()[0], "Started: 2025-03-01T12:30:00.000Z");
        assert_eq!(report.lines()[2], "Price filter buff: 1 - 1000");
    }

    #[test]
    fn test_unbounded_price_is_labelled() {
        let thresholds = ThresholdConfig {
            max_primary_price: f64::INFINITY,
            ..ThresholdConfig::default()
        };
        let report = RunReport::begin(started_at(), "buff", &thresholds);
        assert_eq!(report.lines()[2], "Price filter buff: 1 - no upper limit");
    }

    #[test]
    fn test_source_counts_and_samples() {
        let raw = json!({"a": 1, "b": 2, "c": "bad", "d": 4});
        let source = normalize(&raw, &BTreeSet::new());

        let mut report = RunReport::default();
        report.source_count("csfloat", &source);
        report.sample_keys("csfloat", &source, 2);

        assert_eq!(report.lines(), &["csfloat items: 3 (1 excluded)", r#"Sample csfloat keys: ["a","b"]"#]);
    }

    #[test]
    fn test_stats_include_rejection_breakdown() {
        let mut stats = RunStats {
            checked: 10,
            present_in_all: 6,
            passed: 3,
            ..RunStats::default()
        };
        stats.record_rejection(Check::CompareBPriceRatio);
        stats.record_rejection(Check::PrimaryStockFloor);
        stats.record_rejection(Check::PrimaryStockFloor);

        let mut report = RunReport::default();
        report.stats("buff", &stats);

        let text = report.render();
        assert!(text.contains("Checked buff items: 10\n"));
        assert!(text.contains("Present on all 3 markets: 6\n"));
        assert!(text.contains("Passed all filters: 3\n"));
        let stock = text.find("primary_stock_floor: 2").unwrap();
        let ratio = text.find("compare_b_price_ratio: 1").unwrap();
        assert!(stock < ratio);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_failure_lines() {
        let mut report = RunReport::default();
        report.fetch_failure("youpin", "https://example.test/youpin.json", &FetchError::Status { status: 503 });
        report.aborted();

        assert_eq!(
            report.lines(),
            &[
                "Fetch failed for youpin (https://example.test/youpin.json): HTTP 503",
                "Could not fetch data from one of the sources.",
            ]
        );
    }
}
