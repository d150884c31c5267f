//! Case-insensitive lookup tables over request maps.
//!
//! # Responsibilities
//! - Keep the platform-supplied maps untouched for `map()` / `map_multi()`
//! - Build a lowercase-keyed shadow index once, at construction
//! - Answer single- and multi-value lookups without allocation on hit
//!
//! # Design Decisions
//! - The shadow index is never mutated after `new`, so tables are shared
//!   freely between stages without locking
//! - Keys that collide after lowercasing resolve deterministically: the
//!   lexicographically greatest original key wins
//! - Multi-value `get` returns the LAST value of the key

use std::collections::HashMap;

/// Case-insensitive accessor over a single-value map (path parameters,
/// stage variables).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SingleGet {
    original: HashMap<String, String>,
    lowercase: HashMap<String, String>,
}

impl SingleGet {
    /// Create a table, eagerly building the lowercase index.
    pub fn new(original: HashMap<String, String>) -> Self {
        let lowercase = lowercase_index(&original);
        Self {
            original,
            lowercase,
        }
    }

    /// Returns the value for `key` with case-insensitive matching, or `""`.
    pub fn get(&self, key: &str) -> &str {
        self.lowercase
            .get(&key.to_lowercase())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Returns the original, case-preserved map.
    pub fn map(&self) -> &HashMap<String, String> {
        &self.original
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}

/// Case-insensitive accessor over a multi-value map (headers, query string).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiGet {
    original: HashMap<String, String>,
    original_multi: HashMap<String, Vec<String>>,
    lowercase_multi: HashMap<String, Vec<String>>,
}

impl MultiGet {
    /// Create a table from the single- and multi-value forms of the same data.
    ///
    /// Some local emulators populate only the single-value form. When the
    /// multi-value map has fewer entries than the single-value one it is
    /// rebuilt from the single-value map: an empty value becomes an empty
    /// list, anything else a one-element list.
    pub fn new(
        original: HashMap<String, String>,
        original_multi: HashMap<String, Vec<String>>,
    ) -> Self {
        let original_multi = if original_multi.len() < original.len() {
            synthesize_multi(&original)
        } else {
            original_multi
        };

        let lowercase_multi = lowercase_index(&original_multi);

        Self {
            original,
            original_multi,
            lowercase_multi,
        }
    }

    /// Returns the last value for `key` with case-insensitive matching, or `""`.
    pub fn get(&self, key: &str) -> &str {
        self.get_multi(key)
            .last()
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Returns all values for `key` in original order, or an empty slice.
    pub fn get_multi(&self, key: &str) -> &[String] {
        self.lowercase_multi
            .get(&key.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the original single-value map.
    pub fn map(&self) -> &HashMap<String, String> {
        &self.original
    }

    /// Returns the multi-value map (synthesized if the platform omitted it).
    pub fn map_multi(&self) -> &HashMap<String, Vec<String>> {
        &self.original_multi
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty() && self.original_multi.is_empty()
    }
}

fn synthesize_multi(original: &HashMap<String, String>) -> HashMap<String, Vec<String>> {
    original
        .iter()
        .map(|(k, v)| {
            let values = if v.is_empty() { Vec::new() } else { vec![v.clone()] };
            (k.clone(), values)
        })
        .collect()
}

fn lowercase_index<V: Clone>(original: &HashMap<String, V>) -> HashMap<String, V> {
    let mut keys: Vec<&String> = original.keys().collect();
    keys.sort();

    let mut lowercase = HashMap::with_capacity(original.len());
    for key in keys {
        lowercase.insert(key.to_lowercase(), original[key].clone());
    }
    lowercase
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn multi(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_single_get_empty() {
        let table = SingleGet::new(HashMap::new());
        assert!(table.map().is_empty());
        assert_eq!(table.get("key"), "");
    }

    #[test]
    fn test_single_get_case_insensitive() {
        let table = SingleGet::new(single(&[("Key", "Value")]));
        assert_eq!(table.map(), &single(&[("Key", "Value")]));
        assert_eq!(table.get("Key"), "Value");
        assert_eq!(table.get("key"), "Value");
        assert_eq!(table.get("KEY"), "Value");
        assert_eq!(table.get("other"), "");
    }

    #[test]
    fn test_multi_get_empty() {
        let table = MultiGet::new(HashMap::new(), HashMap::new());
        assert!(table.map().is_empty());
        assert!(table.map_multi().is_empty());
        assert_eq!(table.get("Key"), "");
        assert!(table.get_multi("key").is_empty());
    }

    #[test]
    fn test_multi_get_last_value_wins() {
        let table = MultiGet::new(
            single(&[("Key", "V2")]),
            multi(&[("Key", &["V1", "V2"])]),
        );
        assert_eq!(table.map(), &single(&[("Key", "V2")]));
        assert_eq!(table.map_multi(), &multi(&[("Key", &["V1", "V2"])]));
        assert_eq!(table.get("Key"), "V2");
        assert_eq!(table.get("key"), "V2");
        assert_eq!(table.get_multi("Key"), ["V1", "V2"]);
        assert_eq!(table.get_multi("kEY"), ["V1", "V2"]);
    }

    #[test]
    fn test_multi_get_synthesizes_missing_multi_map() {
        let table = MultiGet::new(single(&[("Accept", "text/plain"), ("X-Empty", "")]), HashMap::new());
        assert_eq!(
            table.map_multi(),
            &multi(&[("Accept", &["text/plain"]), ("X-Empty", &[])])
        );
        assert_eq!(table.get("accept"), "text/plain");
        assert_eq!(table.get_multi("x-empty"), Vec::<String>::new().as_slice());
        assert_eq!(table.get("x-empty"), "");
    }

    #[test]
    fn test_multi_get_keeps_richer_multi_map() {
        let table = MultiGet::new(
            single(&[("A", "2")]),
            multi(&[("A", &["1", "2"]), ("B", &["3"])]),
        );
        assert_eq!(table.get_multi("b"), ["3"]);
        assert_eq!(table.map().len(), 1);
    }

    #[test]
    fn test_colliding_keys_resolve_deterministically() {
        let table = SingleGet::new(single(&[("key", "lower"), ("KEY", "upper")]));
        // "key" sorts after "KEY", so it is inserted last.
        assert_eq!(table.get("Key"), "lower");
    }
}
