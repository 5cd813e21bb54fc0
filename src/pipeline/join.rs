use crate::pipeline::normalize::{NormalizedEntry, NormalizedSource};

/// One item found in all three sources.
#[derive(Debug, Clone, Copy)]
pub struct MatchedTriple<'a> {
    pub key: &'a str,
    pub primary: &'a NormalizedEntry,
    pub compare_a: &'a NormalizedEntry,
    pub compare_b: &'a NormalizedEntry,
}

/// Lazily pair every primary entry with its counterparts in both comparison
/// sources. Keys missing from either comparison source are skipped. Order
/// follows the primary source's document order.
pub fn join<'a>(
    primary: &'a NormalizedSource,
    compare_a: &'a NormalizedSource,
    compare_b: &'a NormalizedSource,
) -> impl Iterator<Item = MatchedTriple<'a>> + 'a {
    primary.iter().filter_map(move |(key, primary)| {
        let compare_a = compare_a.get(key)?;
        let compare_b = compare_b.get(key)?;
        Some(MatchedTriple {
            key,
            primary,
            compare_a,
            compare_b,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(keys: &[&str]) -> NormalizedSource {
        keys.iter()
            .map(|key| (key.to_string(), NormalizedEntry::new(10, Some(1)).unwrap()))
            .collect()
    }

    #[test]
    fn test_join_keeps_only_keys_in_all_three() {
        let primary = source(&["a", "b", "c", "d"]);
        let compare_a = source(&["d", "b", "c"]);
        let compare_b = source(&["c", "a", "d", "x"]);

        let keys: Vec<&str> = join(&primary, &compare_a, &compare_b).map(|t| t.key).collect();
        assert_eq!(keys, vec!["c", "d"]);
    }

    #[test]
    fn test_join_follows_primary_order() {
        let primary = source(&["z", "y", "x"]);
        let compare = source(&["x", "y", "z"]);

        let keys: Vec<&str> = join(&primary, &compare, &compare).map(|t| t.key).collect();
        assert_eq!(keys, vec!["z", "y", "x"]);
    }

    #[test]
    fn test_join_with_empty_comparison_is_empty() {
        let primary = source(&["a"]);
        let empty = NormalizedSource::new();

        assert_eq!(join(&primary, &empty, &primary).count(), 0);
        assert_eq!(join(&primary, &primary, &empty).count(), 0);
    }

    #[test]
    fn test_join_hands_out_each_sources_entry() {
        let primary: NormalizedSource =
            [("k".to_string(), NormalizedEntry::new(100, Some(20)).unwrap())].into_iter().collect();
        let compare_a: NormalizedSource =
            [("k".to_string(), NormalizedEntry::new(96, Some(12)).unwrap())].into_iter().collect();
        let compare_b: NormalizedSource =
            [("k".to_string(), NormalizedEntry::new(97, None).unwrap())].into_iter().collect();

        let triple = join(&primary, &compare_a, &compare_b).next().unwrap();
        assert_eq!(triple.primary.price(), 100.0);
        assert_eq!(triple.compare_a.stock(), Some(12));
        assert_eq!(triple.compare_b.stock(), None);
    }
}
