//! Read-only traversal over aggregation results.
//!
//! Aggregations have no fixed schema, so nodes stay untyped JSON. Traversal
//! never fails: missing buckets or sub-aggregations come back empty. Typed
//! reads (`f64`, `u64`, `str`, `doc_count`) fail loudly on a mismatch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::Index;

use crate::error::AccessError;

static NULL: Value = Value::Null;

fn typed<'a, T>(
    map: &'a Map<String, Value>,
    key: &str,
    expected: &'static str,
    read: impl FnOnce(&'a Value) -> Option<T>,
) -> Result<T, AccessError> {
    let value = map.get(key).ok_or_else(|| AccessError::Missing {
        key: key.to_string(),
    })?;
    read(value).ok_or_else(|| AccessError::TypeMismatch {
        key: key.to_string(),
        expected,
    })
}

/// One named aggregation result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Aggregation(Map<String, Value>);

impl Aggregation {
    pub fn new(node: Map<String, Value>) -> Self {
        Self(node)
    }

    /// Buckets listed under "buckets", empty when there are none.
    ///
    /// Keyed bucket objects are returned in their response order. Entries
    /// that are not objects keep their position as empty buckets, so their
    /// `key` is `null` and `doc_count` fails.
    pub fn buckets(&self) -> Vec<Bucket> {
        let entries: Vec<&Value> = match self.0.get("buckets") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(Value::Object(keyed)) => keyed.values().collect(),
            _ => Vec::new(),
        };
        entries
            .into_iter()
            .map(|entry| Bucket(entry.as_object().cloned().unwrap_or_default()))
            .collect()
    }

    /// Named sub-aggregation of a single-bucket aggregation, empty when absent
    pub fn aggregation(&self, name: &str) -> Aggregation {
        match self.0.get(name) {
            Some(Value::Object(node)) => Aggregation(node.clone()),
            _ => Aggregation::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Numeric entry as a float, the default representation of numbers
    pub fn f64(&self, key: &str) -> Result<f64, AccessError> {
        typed(&self.0, key, "a number", Value::as_f64)
    }

    pub fn u64(&self, key: &str) -> Result<u64, AccessError> {
        typed(&self.0, key, "an unsigned integer", Value::as_u64)
    }

    pub fn str(&self, key: &str) -> Result<&str, AccessError> {
        typed(&self.0, key, "a string", Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl Index<&str> for Aggregation {
    type Output = Value;

    /// Missing entries index to `null`
    fn index(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&NULL)
    }
}

impl From<Map<String, Value>> for Aggregation {
    fn from(node: Map<String, Value>) -> Self {
        Self(node)
    }
}

/// One group inside a bucket aggregation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bucket(Map<String, Value>);

impl Bucket {
    /// The bucket key, unmodified; `null` when absent
    pub fn key(&self) -> &Value {
        &self["key"]
    }

    /// Number of documents in the bucket
    pub fn doc_count(&self) -> Result<u64, AccessError> {
        typed(&self.0, "doc_count", "an unsigned integer", |value| {
            value
                .as_u64()
                .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
        })
    }

    /// Named sub-aggregation, empty when absent
    pub fn aggregation(&self, name: &str) -> Aggregation {
        match self.0.get(name) {
            Some(Value::Object(node)) => Aggregation(node.clone()),
            _ => Aggregation::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl Index<&str> for Bucket {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.0.get(key).unwrap_or(&NULL)
    }
}

impl From<Map<String, Value>> for Bucket {
    fn from(node: Map<String, Value>) -> Self {
        Self(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: Value) -> Aggregation {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_buckets_absent_is_empty() {
        let stats = node(json!({"count": 2, "sum": 55.0}));
        assert!(stats.buckets().is_empty());
        assert!(Aggregation::default().buckets().is_empty());
    }

    #[test]
    fn test_bucket_key_and_nested_aggregation() {
        let user = node(json!({
            "buckets": [
                {"key": "foo", "doc_count": 3, "age": {"count": 1, "sum": 25.0}},
                {"key": "bar", "doc_count": 1, "age": {"count": 1, "sum": 30.0}}
            ]
        }));
        let buckets = user.buckets();
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].key(), "foo");
        assert_eq!(buckets[0].doc_count(), Ok(3));
        assert_eq!(buckets[0].aggregation("age")["sum"], 25.0);
        assert_eq!(buckets[1].aggregation("age").f64("sum"), Ok(30.0));
        assert_eq!(buckets[1].aggregation("age").f64("count"), Ok(1.0));
    }

    #[test]
    fn test_missing_sub_aggregation_chains_without_checks() {
        let bucket = Bucket::from(json!({"key": 7, "doc_count": 1}).as_object().cloned().unwrap());
        assert_eq!(bucket.key(), 7);
        let missing = bucket.aggregation("nope").aggregation("deeper");
        assert!(missing.is_empty());
        assert!(missing.buckets().is_empty());
        assert_eq!(bucket.aggregation("nope")["sum"], Value::Null);
    }

    #[test]
    fn test_typed_reads_fail_loudly() {
        let stats = node(json!({"avg": null, "name": "x"}));
        assert_eq!(
            stats.f64("avg"),
            Err(AccessError::TypeMismatch {
                key: "avg".to_string(),
                expected: "a number"
            })
        );
        assert_eq!(
            stats.f64("sum"),
            Err(AccessError::Missing {
                key: "sum".to_string()
            })
        );
        assert_eq!(stats.str("name"), Ok("x"));

        let bucket = Bucket::from(json!({"key": "k", "doc_count": "many"}).as_object().cloned().unwrap());
        assert!(bucket.doc_count().is_err());
    }

    #[test]
    fn test_malformed_buckets_keep_their_position() {
        let terms = node(json!({
            "buckets": [
                {"key": "foo", "doc_count": 2},
                "garbage",
                {"key": "bar", "doc_count": 1}
            ]
        }));
        let buckets = terms.buckets();
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[1].key(), &Value::Null);
        assert_eq!(
            buckets[1].doc_count(),
            Err(AccessError::Missing {
                key: "doc_count".to_string()
            })
        );
        assert_eq!(buckets[2].key(), "bar");
    }

    #[test]
    fn test_keyed_buckets() {
        let ranges = node(json!({
            "buckets": {
                "young": {"to": 30.0, "doc_count": 4},
                "old": {"from": 30.0, "doc_count": 2}
            }
        }));
        let counts: Vec<u64> = ranges
            .buckets()
            .iter()
            .map(|b| b.doc_count().unwrap())
            .collect();
        assert_eq!(counts, vec![4, 2]);
    }
}
