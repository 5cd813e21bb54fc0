// Normalize -> join -> filter pass over the three marketplace sources

pub mod filter;
pub mod join;
pub mod normalize;
pub mod report;

use serde::ser::Serializer;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::Result;
use crate::pipeline::filter::{evaluate, project, OutputFieldSet, SourceNames, ThresholdConfig};
use crate::pipeline::join::join;
use crate::pipeline::normalize::NormalizedSource;
use crate::pipeline::report::RunStats;

pub use filter::{Check, OutputField};
pub use join::MatchedTriple;
pub use normalize::{normalize, NormalizedEntry};
pub use report::RunReport;

/// Passing items keyed by identifier, in emission order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterResult {
    items: Map<String, Value>,
}

impl FilterResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, record: Map<String, Value>) {
        self.items.insert(key.to_string(), Value::Object(record));
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.items.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    /// Pretty-printed JSON with four-space indentation.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.items.serialize(&mut serializer)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl Serialize for FilterResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

/// Join the three normalized sources, filter every matched triple and
/// project the survivors.
pub fn filter_sources(
    primary: &NormalizedSource,
    compare_a: &NormalizedSource,
    compare_b: &NormalizedSource,
    thresholds: &ThresholdConfig,
    fields: &OutputFieldSet,
    names: &SourceNames<'_>,
) -> (FilterResult, RunStats) {
    let mut result = FilterResult::new();
    let mut stats = RunStats {
        checked: primary.len(),
        ..RunStats::default()
    };

    for triple in join(primary, compare_a, compare_b) {
        stats.present_in_all += 1;
        match evaluate(&triple, thresholds) {
            Ok(()) => {
                stats.passed += 1;
                result.insert(triple.key, project(&triple, fields, names));
            }
            Err(check) => {
                debug!(item = triple.key, %check, "Rejected");
                stats.record_rejection(check);
            }
        }
    }

    (result, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    const NAMES: SourceNames<'static> = SourceNames {
        primary: "buff",
        compare_a: "csfloat",
        compare_b: "youpin",
    };

    fn norm(raw: Value) -> NormalizedSource {
        normalize(&raw, &BTreeSet::new())
    }

    #[test]
    fn test_filter_sources_counts() {
        let primary = norm(json!({
            "pass": {"price": 100, "stock": 20},
            "missing_b": {"price": 100, "stock": 20},
            "too_cheap_a": {"price": 100, "stock": 20}
        }));
        let compare_a = norm(json!({
            "pass": {"price": 99, "stock": 20},
            "missing_b": {"price": 99, "stock": 20},
            "too_cheap_a": {"price": 50, "stock": 20}
        }));
        let compare_b = norm(json!({
            "pass": {"price": 99, "stock": 0},
            "too_cheap_a": {"price": 99, "stock": 0}
        }));

        let (result, stats) = filter_sources(
            &primary,
            &compare_a,
            &compare_b,
            &ThresholdConfig::default(),
            &OutputFieldSet::default(),
            &NAMES,
        );

        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["pass"]);
        assert_eq!(stats.checked, 3);
        assert_eq!(stats.present_in_all, 2);
        assert_eq!(stats.passed, 1);
        assert_eq!(stats.rejected_by(Check::CompareAPriceRatio), 1);
    }

    #[test]
    fn test_pretty_json_uses_four_space_indent_and_emission_order() {
        let mut result = FilterResult::new();
        let mut record = Map::new();
        record.insert("buff_price".to_string(), json!(12.5));
        result.insert("zeta", record.clone());
        result.insert("alpha", record);

        let text = result.to_pretty_json().unwrap();
        assert_eq!(
            text,
            "{\n    \"zeta\": {\n        \"buff_price\": 12.5\n    },\n    \"alpha\": {\n        \"buff_price\": 12.5\n    }\n}"
        );
    }

    #[test]
    fn test_empty_result_is_empty_object() {
        assert_eq!(FilterResult::new().to_pretty_json().unwrap(), "{}");
    }
}
