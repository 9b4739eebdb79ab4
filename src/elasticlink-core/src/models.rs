use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::aggregation::Aggregation;
use crate::decode::{error_text, lenient, number_u16, number_u64, optional_f64};

/// DocumentId tells whether the engine or the caller picks a document id
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum DocumentId {
    #[default]
    ServerAssigned,
    Explicit(String),
}

impl DocumentId {
    pub fn as_deref(&self) -> Option<&str> {
        match self {
            DocumentId::ServerAssigned => None,
            DocumentId::Explicit(id) => Some(id),
        }
    }

    pub fn is_server_assigned(&self) -> bool {
        matches!(self, DocumentId::ServerAssigned)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        DocumentId::Explicit(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        DocumentId::Explicit(id)
    }
}

// `null` on the wire lets the engine assign the id
impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DocumentId::ServerAssigned => serializer.serialize_none(),
            DocumentId::Explicit(id) => serializer.serialize_str(id),
        }
    }
}

/// BulkCommand is the action of one document inside a bulk request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkCommand {
    #[default]
    Index,
    Delete,
}

impl BulkCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            BulkCommand::Index => "index",
            BulkCommand::Delete => "delete",
        }
    }
}

/// Document represents one document sent to the engine, alone or in bulk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// `None` only makes sense inside bulk requests
    pub index: Option<String>,
    pub doc_type: String,
    pub id: DocumentId,
    pub bulk_command: BulkCommand,
    /// Field payload. Must be a JSON object when present.
    pub fields: Option<Value>,
}

impl Document {
    pub fn new(index: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            index: Some(index.into()),
            doc_type: doc_type.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<DocumentId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_command(mut self, command: BulkCommand) -> Self {
        self.bulk_command = command;
        self
    }

    pub fn with_fields(mut self, fields: Value) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Use any serializable record (struct or map) as the field payload
    pub fn with_record<T: Serialize>(mut self, record: &T) -> Result<Self, serde_json::Error> {
        self.fields = Some(serde_json::to_value(record)?);
        Ok(self)
    }
}

/// Shard represents the "_shards" counters returned by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Shard {
    #[serde(default, deserialize_with = "number_u64")]
    pub total: u64,
    #[serde(default, deserialize_with = "number_u64")]
    pub successful: u64,
    #[serde(default, deserialize_with = "number_u64")]
    pub failed: u64,
}

/// Hit represents one search hit
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index", default, deserialize_with = "lenient")]
    pub index: String,
    #[serde(rename = "_type", default, deserialize_with = "lenient")]
    pub doc_type: String,
    #[serde(rename = "_id", default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(rename = "_score", default, deserialize_with = "optional_f64")]
    pub score: Option<f64>,
    #[serde(rename = "_source", default, deserialize_with = "lenient")]
    pub source: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub fields: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub highlight: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub sort: Vec<Value>,
}

/// Hits represents the hits section of a search response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Hits {
    /// Plain number on old engines, `{"value": n, ...}` on newer ones
    #[serde(default, deserialize_with = "number_u64")]
    pub total: u64,
    /// May be `null`
    #[serde(default, deserialize_with = "optional_f64")]
    pub max_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub hits: Vec<Hit>,
}

/// Item represents the result of one action in a bulk response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Item {
    #[serde(rename = "_index", default, deserialize_with = "lenient")]
    pub index: String,
    #[serde(rename = "_type", default, deserialize_with = "lenient")]
    pub doc_type: String,
    #[serde(rename = "_id", default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(rename = "_version", default, deserialize_with = "lenient")]
    pub version: i64,
    #[serde(default, deserialize_with = "number_u16")]
    pub status: u16,
    #[serde(default, deserialize_with = "lenient")]
    pub result: String,
    #[serde(default, deserialize_with = "error_text")]
    pub error: String,
}

/// StatPrimary holds the document counters of the stats API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct StatPrimary {
    #[serde(default, deserialize_with = "number_u64")]
    pub count: u64,
    #[serde(default, deserialize_with = "number_u64")]
    pub deleted: u64,
}

/// StatIndex holds the per-index section of the stats API
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatIndex {
    #[serde(default, deserialize_with = "lenient")]
    pub primaries: BTreeMap<String, StatPrimary>,
}

/// All represents the "_all" section of the stats API
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct All {
    #[serde(default, deserialize_with = "lenient")]
    pub indices: BTreeMap<String, StatIndex>,
    #[serde(default, deserialize_with = "lenient")]
    pub primaries: BTreeMap<String, StatPrimary>,
}

/// IndexStatus represents one index in the status API.
///
/// Sections with mixed value types stay untyped.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IndexStatus {
    #[serde(default, deserialize_with = "lenient")]
    pub index: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub translog: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub docs: BTreeMap<String, u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub merges: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub refresh: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub flush: Map<String, Value>,
}

/// Response is the envelope returned by every call.
///
/// It projects every field any endpoint may return; only the ones the
/// invoked endpoint fills are set, the rest keep their zero value. `raw`
/// holds the whole decoded body for anything the fixed shape misses.
/// Numbers inside `raw` are plain JSON numbers: read them with
/// `as_f64()` unless an integer is needed explicitly.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Response {
    #[serde(default, deserialize_with = "lenient")]
    pub ok: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub acknowledged: bool,
    #[serde(default, deserialize_with = "error_text")]
    pub error: String,
    /// Body "status" when present, the HTTP status otherwise
    #[serde(default, deserialize_with = "number_u16")]
    pub status: u16,
    #[serde(default, deserialize_with = "number_u64")]
    pub took: u64,
    #[serde(default, deserialize_with = "lenient")]
    pub timed_out: bool,
    #[serde(rename = "_shards", default, deserialize_with = "lenient")]
    pub shards: Shard,
    #[serde(default, deserialize_with = "lenient")]
    pub hits: Hits,
    #[serde(rename = "_index", default, deserialize_with = "lenient")]
    pub index: String,
    #[serde(rename = "_id", default, deserialize_with = "lenient")]
    pub id: String,
    #[serde(rename = "_type", default, deserialize_with = "lenient")]
    pub doc_type: String,
    #[serde(rename = "_version", default, deserialize_with = "lenient")]
    pub version: i64,
    #[serde(default, deserialize_with = "lenient")]
    pub found: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub result: String,
    #[serde(default, deserialize_with = "number_u64")]
    pub count: u64,

    // Used by the stats API
    #[serde(rename = "_all", default, deserialize_with = "lenient")]
    pub all: All,

    // Used by the bulk API
    #[serde(default, deserialize_with = "lenient")]
    pub errors: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub items: Vec<BTreeMap<String, Item>>,

    // Used by the get API
    #[serde(default, deserialize_with = "lenient")]
    pub exists: bool,
    #[serde(rename = "_source", default, deserialize_with = "lenient")]
    pub source: Map<String, Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub fields: Map<String, Value>,

    // Used by the status API
    #[serde(default, deserialize_with = "lenient")]
    pub indices: BTreeMap<String, IndexStatus>,

    #[serde(rename = "_scroll_id", default, deserialize_with = "lenient")]
    pub scroll_id: String,

    #[serde(default, deserialize_with = "lenient")]
    pub aggregations: BTreeMap<String, Aggregation>,

    #[serde(skip)]
    pub raw: Value,
}

impl Response {
    /// Named top-level aggregation, empty when absent
    pub fn aggregation(&self, name: &str) -> Aggregation {
        self.aggregations.get(name).cloned().unwrap_or_default()
    }

    /// Whether the body carried nothing decodable
    pub fn raw_is_empty(&self) -> bool {
        match &self.raw {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_id_serializes_null_when_server_assigned() {
        assert_eq!(
            serde_json::to_value(DocumentId::ServerAssigned).unwrap(),
            Value::Null
        );
        assert_eq!(
            serde_json::to_value(DocumentId::from("123")).unwrap(),
            json!("123")
        );
        assert_eq!(DocumentId::from("").as_deref(), Some(""));
    }

    #[test]
    fn test_document_with_record() {
        #[derive(Serialize)]
        struct Tweet {
            user: String,
            message: String,
        }

        let doc = Document::new("tweets", "tweet")
            .with_record(&Tweet {
                user: "foo".to_string(),
                message: "hello".to_string(),
            })
            .unwrap();
        assert_eq!(doc.fields, Some(json!({"user": "foo", "message": "hello"})));
        assert!(doc.id.is_server_assigned());
        assert_eq!(doc.bulk_command, BulkCommand::Index);
    }
}
