//! Ordered flat argument mapping

use crate::values::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;

/// Insertion-ordered mapping of dotted key to inferred value.
///
/// Re-inserting a key replaces its value in place, so the key keeps the
/// position of its first occurrence while the last value wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatArgs {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl FlatArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; returns the replaced value
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.index.get(&key) {
            Some(&slot) => Some(std::mem::replace(&mut self.entries[slot].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl IntoIterator for FlatArgs {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for FlatArgs {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut args = FlatArgs::new();
        for (key, value) in iter {
            args.insert(key, value);
        }
        args
    }
}

impl Serialize for FlatArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_value_wins_first_position_kept() {
        let mut args = FlatArgs::new();
        assert!(args.insert("a", Value::Int(1)).is_none());
        args.insert("b", Value::Int(2));
        assert_eq!(args.insert("a", Value::Int(3)), Some(Value::Int(1)));

        let collected: Vec<_> = args.into_iter().collect();
        assert_eq!(
            collected,
            vec![("a".to_string(), Value::Int(3)), ("b".to_string(), Value::Int(2))]
        );
    }

    #[test]
    fn test_serializes_in_insertion_order() {
        let args: FlatArgs = [("z", Value::Int(1)), ("a", Value::from("x"))]
            .into_iter()
            .collect();
        assert_eq!(serde_json::to_string(&args).unwrap(), r#"{"z":1,"a":"x"}"#);
    }
}
