use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants;
use crate::error::{MarketFilterError, Result};
use crate::pipeline::join::MatchedTriple;

/// Numeric thresholds applied to every matched triple. Fixed for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Comparison-A price must reach this fraction of the primary price
    pub price_ratio_a: f64,
    /// Comparison-B price must reach this fraction of the primary price
    pub price_ratio_b: f64,
    pub min_primary_stock: u64,
    /// Comparison-B stock has no floor
    pub min_compare_a_stock: u64,
    pub min_primary_price: f64,
    /// `inf` for no upper bound
    pub max_primary_price: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            price_ratio_a: constants::PRICE_RATIO_A,
            price_ratio_b: constants::PRICE_RATIO_B,
            min_primary_stock: constants::MIN_PRIMARY_STOCK,
            min_compare_a_stock: constants::MIN_COMPARE_A_STOCK,
            min_primary_price: constants::MIN_PRIMARY_PRICE,
            max_primary_price: constants::MAX_PRIMARY_PRICE,
        }
    }
}

impl ThresholdConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, ratio) in [("price_ratio_a", self.price_ratio_a), ("price_ratio_b", self.price_ratio_b)] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(MarketFilterError::Config(format!(
                    "{} must be in (0, 1], got {}",
                    name, ratio
                )));
            }
        }
        if !self.min_primary_price.is_finite() || self.min_primary_price < 0.0 {
            return Err(MarketFilterError::Config(format!(
                "min_primary_price must be a non-negative number, got {}",
                self.min_primary_price
            )));
        }
        if self.max_primary_price.is_nan() || self.min_primary_price > self.max_primary_price {
            return Err(MarketFilterError::Config(format!(
                "primary price bounds are empty: [{}, {}]",
                self.min_primary_price, self.max_primary_price
            )));
        }
        Ok(())
    }

    pub fn has_upper_price_bound(&self) -> bool {
        self.max_primary_price.is_finite()
    }
}

/// The individual predicates, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Check {
    PrimaryPriceBounds,
    PrimaryStockFloor,
    CompareAStockFloor,
    CompareAPriceRatio,
    CompareBPriceRatio,
}

impl Check {
    pub const ALL: [Check; 5] = [
        Check::PrimaryPriceBounds,
        Check::PrimaryStockFloor,
        Check::CompareAStockFloor,
        Check::CompareAPriceRatio,
        Check::CompareBPriceRatio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Check::PrimaryPriceBounds => "primary_price_bounds",
            Check::PrimaryStockFloor => "primary_stock_floor",
            Check::CompareAStockFloor => "compare_a_stock_floor",
            Check::CompareAPriceRatio => "compare_a_price_ratio",
            Check::CompareBPriceRatio => "compare_b_price_ratio",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run every check in order and return the first one that fails.
///
/// Stock floors are skipped when the entry carries no stock (legacy
/// price-only sources); a missing stock never fails a triple.
pub fn evaluate(triple: &MatchedTriple<'_>, config: &ThresholdConfig) -> std::result::Result<(), Check> {
    let primary_price = triple.primary.price();

    if primary_price < config.min_primary_price || primary_price > config.max_primary_price {
        return Err(Check::PrimaryPriceBounds);
    }
    if let Some(stock) = triple.primary.stock() {
        if stock < config.min_primary_stock {
            return Err(Check::PrimaryStockFloor);
        }
    }
    if let Some(stock) = triple.compare_a.stock() {
        if stock < config.min_compare_a_stock {
            return Err(Check::CompareAStockFloor);
        }
    }
    if triple.compare_a.price() < config.price_ratio_a * primary_price {
        return Err(Check::CompareAPriceRatio);
    }
    if triple.compare_b.price() < config.price_ratio_b * primary_price {
        return Err(Check::CompareBPriceRatio);
    }
    Ok(())
}

pub fn passes(triple: &MatchedTriple<'_>, config: &ThresholdConfig) -> bool {
    evaluate(triple, config).is_ok()
}

/// A field that may appear in an output record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputField {
    PrimaryPrice,
    PrimaryStock,
    CompareAPrice,
    CompareAStock,
    CompareBPrice,
    CompareBStock,
}

/// Which fields each output record carries. Always contains
/// [`OutputField::PrimaryPrice`]; fields are kept in canonical order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<OutputField>", into = "Vec<OutputField>")]
pub struct OutputFieldSet(Vec<OutputField>);

impl OutputFieldSet {
    pub fn new(fields: impl IntoIterator<Item = OutputField>) -> Self {
        let mut fields: Vec<OutputField> = fields.into_iter().collect();
        fields.push(OutputField::PrimaryPrice);
        fields.sort();
        fields.dedup();
        Self(fields)
    }

    pub fn primary_price_only() -> Self {
        Self::new([])
    }

    pub fn all() -> Self {
        Self::new([
            OutputField::PrimaryStock,
            OutputField::CompareAPrice,
            OutputField::CompareAStock,
            OutputField::CompareBPrice,
            OutputField::CompareBStock,
        ])
    }

    pub fn fields(&self) -> &[OutputField] {
        &self.0
    }
}

impl Default for OutputFieldSet {
    fn default() -> Self {
        Self::primary_price_only()
    }
}

impl From<Vec<OutputField>> for OutputFieldSet {
    fn from(fields: Vec<OutputField>) -> Self {
        Self::new(fields)
    }
}

impl From<OutputFieldSet> for Vec<OutputField> {
    fn from(set: OutputFieldSet) -> Self {
        set.0
    }
}

/// Display names of the three sources, used as output field prefixes
/// (`buff_price`, `csfloat_stock`, ...).
#[derive(Debug, Clone, Copy)]
pub struct SourceNames<'a> {
    pub primary: &'a str,
    pub compare_a: &'a str,
    pub compare_b: &'a str,
}

/// Build the output record for a passing triple. Stock fields are omitted
/// when the source did not report stock.
pub fn project(triple: &MatchedTriple<'_>, fields: &OutputFieldSet, names: &SourceNames<'_>) -> Map<String, Value> {
    let mut record = Map::new();
    for field in fields.fields() {
        let (name, entry, is_price) = match field {
            OutputField::PrimaryPrice => (names.primary, triple.primary, true),
            OutputField::PrimaryStock => (names.primary, triple.primary, false),
            OutputField::CompareAPrice => (names.compare_a, triple.compare_a, true),
            OutputField::CompareAStock => (names.compare_a, triple.compare_a, false),
            OutputField::CompareBPrice => (names.compare_b, triple.compare_b, true),
            OutputField::CompareBStock => (names.compare_b, triple.compare_b, false),
        };
        if is_price {
            record.insert(format!("{}_price", name), Value::Number(entry.price_number().clone()));
        } else if let Some(stock) = entry.stock() {
            record.insert(format!("{}_stock", name), Value::from(stock));
        }
    }
    record
}
