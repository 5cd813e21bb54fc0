use std::collections::{BTreeSet, HashMap};

use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::constants::ITEMS_FIELD;

/// A single item listing in canonical form.
///
/// The price keeps its original JSON number so the output artifact carries it
/// verbatim; `stock` is absent only for legacy price-only sources.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEntry {
    price: Number,
    price_value: f64,
    stock: Option<u64>,
}

impl NormalizedEntry {
    /// Build an entry, rejecting prices that are not strictly positive and finite.
    pub fn new(price: impl Into<Number>, stock: Option<u64>) -> Option<Self> {
        let price = price.into();
        let price_value = price.as_f64()?;
        if !price_value.is_finite() || price_value <= 0.0 {
            return None;
        }
        Some(Self {
            price,
            price_value,
            stock,
        })
    }

    pub fn price(&self) -> f64 {
        self.price_value
    }

    /// The price exactly as it appeared in the source document
    pub fn price_number(&self) -> &Number {
        &self.price
    }

    pub fn stock(&self) -> Option<u64> {
        self.stock
    }
}

/// Item identifier -> entry, hash-indexed and kept in document order.
#[derive(Debug, Clone, Default)]
pub struct NormalizedSource {
    order: Vec<String>,
    entries: HashMap<String, NormalizedEntry>,
    excluded: usize,
}

impl NormalizedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: NormalizedEntry) {
        let key = key.into();
        if self.entries.insert(key.clone(), entry).is_none() {
            self.order.push(key);
        }
    }

    pub fn get(&self, key: &str) -> Option<&NormalizedEntry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of entries dropped during normalization because of their shape
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Entries in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NormalizedEntry)> {
        self.order
            .iter()
            .filter_map(move |key| self.entries.get(key).map(|entry| (key.as_str(), entry)))
    }
}

impl FromIterator<(String, NormalizedEntry)> for NormalizedSource {
    fn from_iter<I: IntoIterator<Item = (String, NormalizedEntry)>>(iter: I) -> Self {
        let mut source = Self::new();
        for (key, entry) in iter {
            source.insert(key, entry);
        }
        source
    }
}

/// Top-level layout of a fetched document.
#[derive(Debug)]
enum SourceLayout<'a> {
    /// The document itself is the item mapping
    Flat(&'a Map<String, Value>),
    /// The item mapping lives under the `items` field
    Wrapped(&'a Map<String, Value>),
    /// Not a JSON object; carries no items
    Opaque,
}

impl<'a> SourceLayout<'a> {
    fn resolve(raw: &'a Value) -> Self {
        match raw {
            Value::Object(root) => match root.get(ITEMS_FIELD) {
                Some(Value::Object(items)) => SourceLayout::Wrapped(items),
                _ => SourceLayout::Flat(root),
            },
            _ => SourceLayout::Opaque,
        }
    }

    fn items(&self) -> Option<&'a Map<String, Value>> {
        match self {
            SourceLayout::Flat(items) | SourceLayout::Wrapped(items) => Some(items),
            SourceLayout::Opaque => None,
        }
    }
}

/// Shape of a single item value.
#[derive(Debug)]
enum RawEntry<'a> {
    /// Legacy price-only form: `"key": 12.5`
    Quote(&'a Number),
    /// `"key": {"price": 12.5, "stock": 40}`
    Listing { price: &'a Number, stock: u64 },
    Unrecognized,
}

impl<'a> RawEntry<'a> {
    fn classify(value: &'a Value) -> Self {
        match value {
            Value::Number(price) => RawEntry::Quote(price),
            Value::Object(fields) => match (fields.get("price"), fields.get("stock")) {
                (Some(Value::Number(price)), Some(Value::Number(stock))) => match stock.as_u64() {
                    Some(stock) => RawEntry::Listing { price, stock },
                    None => RawEntry::Unrecognized,
                },
                _ => RawEntry::Unrecognized,
            },
            _ => RawEntry::Unrecognized,
        }
    }

    fn into_entry(self) -> Option<NormalizedEntry> {
        match self {
            RawEntry::Quote(price) => NormalizedEntry::new(price.clone(), None),
            RawEntry::Listing { price, stock } => NormalizedEntry::new(price.clone(), Some(stock)),
            RawEntry::Unrecognized => None,
        }
    }
}

/// Convert a fetched document into a [`NormalizedSource`].
///
/// Reserved metadata keys are skipped without being counted. Entries of an
/// unexpected shape are dropped and counted in [`NormalizedSource::excluded`].
pub fn normalize(raw: &Value, reserved_keys: &BTreeSet<String>) -> NormalizedSource {
    let layout = SourceLayout::resolve(raw);
    let mut source = NormalizedSource::new();

    let Some(items) = layout.items() else {
        debug!("Document is not a JSON object, no items to normalize");
        return source;
    };
    if matches!(layout, SourceLayout::Wrapped(_)) {
        debug!("Unwrapped '{}' field with {} entries", ITEMS_FIELD, items.len());
    }

    for (key, value) in items {
        if reserved_keys.contains(key) {
            continue;
        }
        match RawEntry::classify(value).into_entry() {
            Some(entry) => source.insert(key.as_str(), entry),
            None => source.excluded += 1,
        }
    }

    source
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reserved() -> BTreeSet<String> {
        ["updated_at".to_string()].into_iter().collect()
    }

    #[test]
    fn test_normalize_flat_listings() {
        let raw = json!({
            "updated_at": "2025-01-01T00:00:00Z",
            "AK-47 | Redline": {"price": 12.5, "stock": 40, "extra": true},
            "AWP | Asiimov": {"price": 80, "stock": 3}
        });

        let source = normalize(&raw, &reserved());

        assert_eq!(source.len(), 2);
        assert_eq!(source.excluded(), 0);
        assert!(!source.contains_key("updated_at"));
        let redline = source.get("AK-47 | Redline").unwrap();
        assert_eq!(redline.price(), 12.5);
        assert_eq!(redline.stock(), Some(40));
        assert_eq!(source.get("AWP | Asiimov").unwrap().price_number(), &Number::from(80));
    }

    #[test]
    fn test_normalize_unwraps_items_field() {
        let raw = json!({
            "updated_at": 1700000000,
            "items": {
                "A": {"price": 1.5, "stock": 2},
                "B": {"price": 2.5, "stock": 0}
            }
        });

        let source = normalize(&raw, &reserved());
        assert_eq!(source.keys().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn test_items_field_that_is_not_a_mapping_is_an_ordinary_entry() {
        let raw = json!({
            "items": [1, 2, 3],
            "A": {"price": 3, "stock": 1}
        });

        let source = normalize(&raw, &reserved());
        assert_eq!(source.len(), 1);
        assert_eq!(source.excluded(), 1);
    }

    #[test]
    fn test_normalize_legacy_numeric_entries() {
        let raw = json!({"Y": 50, "Z": 0.75});

        let source = normalize(&raw, &reserved());
        let y = source.get("Y").unwrap();
        assert_eq!(y.price(), 50.0);
        assert_eq!(y.stock(), None);
        assert_eq!(source.get("Z").unwrap().stock(), None);
    }

    #[test]
    fn test_normalize_drops_malformed_entries() {
        let raw = json!({
            "no_stock": {"price": 10},
            "no_price": {"stock": 10},
            "string_price": {"price": "10", "stock": 10},
            "negative_stock": {"price": 10, "stock": -1},
            "fractional_stock": {"price": 10, "stock": 1.5},
            "zero_price": {"price": 0, "stock": 10},
            "negative_quote": -4,
            "text": "n/a",
            "null": null,
            "ok": {"price": 10, "stock": 10}
        });

        let source = normalize(&raw, &reserved());
        assert_eq!(source.keys().collect::<Vec<_>>(), vec!["ok"]);
        assert_eq!(source.excluded(), 9);
    }

    #[test]
    fn test_normalize_preserves_document_order() {
        let raw = json!({
            "zeta": {"price": 1, "stock": 1},
            "alpha": {"price": 1, "stock": 1},
            "mid": {"price": 1, "stock": 1}
        });

        let source = normalize(&raw, &reserved());
        assert_eq!(source.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let raw = json!({"Knife": 10, "knife": 20});

        let source = normalize(&raw, &reserved());
        assert_eq!(source.len(), 2);
        assert_eq!(source.get("knife").unwrap().price(), 20.0);
    }

    #[test]
    fn test_non_object_document_is_empty() {
        let source = normalize(&json!([1, 2, 3]), &reserved());
        assert!(source.is_empty());
        assert_eq!(source.excluded(), 0);
    }
}
