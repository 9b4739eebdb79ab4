//! Request model and the path/query builder.
//!
//! A [`Request`] describes one call against the engine: which indices and
//! types it targets, an optional document id, the API keyword (`_search`,
//! `_bulk`, ...), extra query parameters and where the body comes from.
//! Turning it into a URL is a pure function of those fields.

use serde_json::Value;
use url::{form_urlencoded, Url};

use crate::error::EncodingError;

/// Keyword of the bulk endpoint. Requests using it send their bulk stream.
pub const BULK_API: &str = "_bulk";

/// Content type sent with every request that carries a body.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// HTTP verb of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }

    /// Whether requests with this verb carry a JSON body
    pub fn carries_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra URL parameters: an ordered multi-map.
///
/// Keys keep their insertion order and may repeat, so the encoded query
/// string is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, keeping any existing values for the key
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Replace every value of `key` with a single value.
    ///
    /// The key stays where it first appeared; a new key goes last.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter().position(|(k, _)| *k == key) {
            Some(first) => {
                self.pairs[first].1 = value;
                let mut index = 0;
                self.pairs.retain(|(k, _)| {
                    let keep = index <= first || *k != key;
                    index += 1;
                    keep
                });
            }
            None => self.pairs.push((key, value)),
        }
        self
    }

    /// First value of `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All values of `key`, in insertion order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Percent-encoded `key=value&...` string, empty when there are no pairs
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// One logical call against the engine
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Target indices. Empty means the path starts with an empty segment.
    pub indices: Vec<String>,
    pub types: Vec<String>,
    /// Document id, addressed as its own path segment
    pub id: Option<String>,
    /// Literal trailing path segment(s) such as `_search` or `_search/scroll`
    pub api: String,
    pub params: Params,
    /// JSON body, sent as `null` when unset
    pub query: Option<Value>,
    /// Pre-encoded bulk stream, used when `api` is the bulk endpoint
    pub bulk_data: Vec<u8>,
    /// Literal body bytes, take precedence over everything else
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, api: impl Into<String>) -> Self {
        Self {
            method,
            indices: Vec::new(),
            types: Vec::new(),
            id: None,
            api: api.into(),
            params: Params::new(),
            query: None,
            bulk_data: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_indices<I, S>(mut self, indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indices = indices.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_bulk_data(mut self, bulk_data: Vec<u8>) -> Self {
        self.bulk_data = bulk_data;
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_bulk(&self) -> bool {
        self.api == BULK_API
    }

    /// Resource path: `/indices[/types][/id]/api`.
    ///
    /// Nothing is normalized. An empty index list yields an empty leading
    /// segment (`//_bulk`) and an empty api yields a trailing slash.
    pub fn path(&self) -> String {
        let mut path = format!("/{}", self.indices.join(","));

        if !self.types.is_empty() {
            path.push('/');
            path.push_str(&self.types.join(","));
        }

        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            path.push('/');
            path.push_str(id);
        }

        path.push('/');
        path.push_str(&self.api);
        path
    }

    /// Path plus query string, with no `?` when there are no parameters
    pub fn path_and_query(&self) -> String {
        let query = self.params.encode();
        if query.is_empty() {
            self.path()
        } else {
            format!("{}?{}", self.path(), query)
        }
    }

    /// Absolute URL of this request under `base`.
    ///
    /// The base URL's own path and query are replaced.
    pub fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_path(&self.path());
        let query = self.params.encode();
        url.set_query((!query.is_empty()).then_some(query.as_str()));
        url
    }

    /// Content type header value, set only for verbs that carry a body
    pub fn content_type(&self) -> Option<&'static str> {
        self.method.carries_body().then_some(JSON_CONTENT_TYPE)
    }

    /// Body bytes, chosen in priority order: literal body, bulk stream for
    /// the bulk endpoint, then the JSON query (`null` when unset).
    ///
    /// HEAD requests never carry a body.
    pub fn payload(&self) -> Result<Vec<u8>, EncodingError> {
        if self.method == Method::Head {
            return Ok(Vec::new());
        }
        if !self.body.is_empty() {
            return Ok(self.body.clone());
        }
        if self.is_bulk() {
            return Ok(self.bulk_data.clone());
        }
        Ok(serde_json::to_vec(&self.query)?)
    }
}
