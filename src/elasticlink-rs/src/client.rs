use crate::classify::classify;
use crate::transport::{ReqwestTransport, Transport, TransportRequest};
use crate::{ClientError, Result};
use elasticlink_core::{
    decode_response, encode_bulk, ClientConfig, Document, DocumentId, EncodingError, Method,
    Params, Request, Response, Url, BULK_API,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Search engine REST API client.
///
/// Holds no per-call state, so one instance can serve concurrent tasks as
/// long as its transport can.
#[derive(Clone)]
pub struct Client {
    base_url: Url,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct AliasTarget<'a> {
    index: &'a str,
    alias: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum AliasAction<'a> {
    Add(AliasTarget<'a>),
    Remove(AliasTarget<'a>),
}

#[derive(Serialize)]
struct AliasCommand<'a> {
    actions: Vec<AliasAction<'a>>,
}

#[derive(Clone, Copy)]
enum AliasChange {
    Add,
    Remove,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn document_index(document: &Document) -> Result<&str> {
    Ok(document
        .index
        .as_deref()
        .ok_or(EncodingError::MissingIndex)?)
}

/// Type segment of a single-document path, skipped when empty
fn document_types(document: &Document) -> Vec<String> {
    if document.doc_type.is_empty() {
        Vec::new()
    } else {
        vec![document.doc_type.clone()]
    }
}

fn record_fields(document: &Document) -> Result<Option<Value>> {
    match &document.fields {
        None | Some(Value::Null) => Ok(None),
        Some(fields @ Value::Object(_)) => Ok(Some(fields.clone())),
        Some(other) => Err(EncodingError::InvalidFields {
            found: elasticlink_core::error::kind_of(other),
        }
        .into()),
    }
}

impl Client {
    /// Create a client sending requests for `base_url` through `transport`
    pub fn new(base_url: Url, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url,
            transport,
        }
    }

    /// Create a client using a reqwest transport configured from `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let base_url = config
            .base_url()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(base_url, Arc::new(transport)))
    }

    /// Replace the transport, keeping the base URL
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Base URL every request path is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Transport used to send requests
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Run a request: encode, send once, decode, classify.
    ///
    /// Engine errors come back with the decoded envelope inside the error.
    #[tracing::instrument(skip(self, request), fields(method = %request.method, api = %request.api))]
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        let body = request.payload()?;
        let url = request.url(&self.base_url);
        tracing::debug!(url = %url, bytes = body.len(), "Sending request");

        let reply = self
            .transport
            .send(TransportRequest {
                method: request.method,
                url,
                content_type: request.content_type(),
                body,
            })
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Transport failed");
                ClientError::Connectivity(e)
            })?;

        let status = reply.status;
        tracing::debug!(status, bytes = reply.body.len(), "Received response");

        if status > 201 && status < 400 {
            return Err(ClientError::UnexpectedStatus {
                status,
                body: String::from_utf8_lossy(&reply.body).into_owned(),
            });
        }

        let response = if request.method == Method::Head {
            Response {
                status,
                ..Response::default()
            }
        } else {
            decode_response(status, &reply.body)
                .map_err(|source| ClientError::InvalidResponse { status, source })?
        };

        classify(request, response).inspect_err(|e| {
            tracing::debug!(error = %e, "Engine reported an error");
        })
    }

    /// Create an index, optionally with settings and mappings
    pub async fn create_index(&self, name: &str, mapping: Option<Value>) -> Result<Response> {
        let mut request = Request::new(Method::Put, "").with_indices([name]);
        request.query = mapping;
        self.execute(&request).await
    }

    /// Delete an index and all of its documents
    pub async fn delete_index(&self, name: &str) -> Result<Response> {
        self.execute(&Request::new(Method::Delete, "").with_indices([name]))
            .await
    }

    /// Refresh an index so recent writes become searchable
    pub async fn refresh_index(&self, name: &str) -> Result<Response> {
        self.execute(&Request::new(Method::Post, "_refresh").with_indices([name]))
            .await
    }

    /// Update the dynamic settings of an index
    pub async fn update_index_settings(&self, name: &str, settings: Value) -> Result<Response> {
        let request = Request::new(Method::Put, "_settings")
            .with_indices([name])
            .with_query(settings);
        self.execute(&request).await
    }

    /// Legacy optimize endpoint
    pub async fn optimize(&self, indices: &[&str], params: Params) -> Result<Response> {
        let request = Request::new(Method::Post, "_optimize")
            .with_indices(owned(indices))
            .with_params(params);
        self.execute(&request).await
    }

    /// Merge index segments through the `_forcemerge` endpoint
    pub async fn force_merge(&self, indices: &[&str], params: Params) -> Result<Response> {
        let request = Request::new(Method::Post, "_forcemerge")
            .with_indices(owned(indices))
            .with_params(params);
        self.execute(&request).await
    }

    /// Get document and store statistics of the given indices
    pub async fn stats(&self, indices: &[&str], params: Params) -> Result<Response> {
        let request = Request::new(Method::Get, "_stats")
            .with_indices(owned(indices))
            .with_params(params);
        self.execute(&request).await
    }

    /// Status of the given indices; `_all` covers every index
    pub async fn index_status(&self, indices: &[&str]) -> Result<Response> {
        self.execute(&Request::new(Method::Get, "_status").with_indices(owned(indices)))
            .await
    }

    /// Send many document operations in one request.
    ///
    /// Items in `Response::items` line up with `documents`. The first failed
    /// item becomes a [`ClientError::BulkItem`]; the others are not rolled
    /// back.
    #[tracing::instrument(skip(self, documents), fields(documents = documents.len()))]
    pub async fn bulk_send(&self, documents: &[Document]) -> Result<Response> {
        let bulk_data = encode_bulk(documents)?;
        self.execute(&Request::new(Method::Post, BULK_API).with_bulk_data(bulk_data))
            .await
    }

    /// Search the given indices and types with a query DSL body
    pub async fn search(
        &self,
        query: Value,
        indices: &[&str],
        types: &[&str],
        params: Params,
    ) -> Result<Response> {
        let request = Request::new(Method::Post, "_search")
            .with_indices(owned(indices))
            .with_types(owned(types))
            .with_params(params)
            .with_query(query);
        self.execute(&request).await
    }

    /// Count matching documents; the result is in `Response::count`
    pub async fn count(
        &self,
        query: Value,
        indices: &[&str],
        types: &[&str],
        params: Params,
    ) -> Result<Response> {
        let request = Request::new(Method::Post, "_count")
            .with_indices(owned(indices))
            .with_types(owned(types))
            .with_params(params)
            .with_query(query);
        self.execute(&request).await
    }

    /// Run a query against the `_query` endpoint with any method
    pub async fn query(
        &self,
        query: Value,
        indices: &[&str],
        types: &[&str],
        method: Method,
        params: Params,
    ) -> Result<Response> {
        let request = Request::new(method, "_query")
            .with_indices(owned(indices))
            .with_types(owned(types))
            .with_params(params)
            .with_query(query);
        self.execute(&request).await
    }

    /// Delete every document matching a query
    pub async fn delete_by_query(
        &self,
        query: Value,
        indices: &[&str],
        types: &[&str],
        params: Params,
    ) -> Result<Response> {
        self.query(query, indices, types, Method::Delete, params)
            .await
    }

    /// Open a scan cursor. The token is in `Response::scroll_id`.
    pub async fn scan(
        &self,
        query: Value,
        indices: &[&str],
        types: &[&str],
        timeout: &str,
        size: usize,
    ) -> Result<Response> {
        let mut params = Params::new();
        params
            .add("search_type", "scan")
            .add("scroll", timeout)
            .add("size", size.to_string());

        self.search(query, indices, types, params).await
    }

    /// Fetch the next page of a cursor opened by [`Client::scan`]
    pub async fn scroll(&self, scroll_id: &str, timeout: &str) -> Result<Response> {
        let mut params = Params::new();
        params.add("scroll", timeout);

        let request = Request::new(Method::Post, "_search/scroll")
            .with_params(params)
            .with_body(scroll_id.as_bytes());
        self.execute(&request).await
    }

    /// Get a document by id
    pub async fn get(
        &self,
        index: &str,
        doc_type: &str,
        id: &str,
        params: Params,
    ) -> Result<Response> {
        let request = Request::new(Method::Get, format!("{doc_type}/{id}"))
            .with_indices([index])
            .with_params(params);
        self.execute(&request).await
    }

    /// Index a document: PUT under its explicit id, POST otherwise
    pub async fn index_document(&self, document: &Document, params: Params) -> Result<Response> {
        let mut request = Request::new(Method::Post, "")
            .with_indices([document_index(document)?])
            .with_types(document_types(document))
            .with_params(params);
        request.query = record_fields(document)?;

        if let DocumentId::Explicit(id) = &document.id {
            request.method = Method::Put;
            request.id = Some(id.clone());
        }

        self.execute(&request).await
    }

    /// Delete a document by its explicit id.
    ///
    /// A missing document is not an error: check `found` on the response.
    pub async fn delete_document(&self, document: &Document, params: Params) -> Result<Response> {
        let id = document.id.as_deref().ok_or(EncodingError::MissingId)?;
        let request = Request::new(Method::Delete, "")
            .with_indices([document_index(document)?])
            .with_types(document_types(document))
            .with_id(id)
            .with_params(params);
        self.execute(&request).await
    }

    /// Partially update a document through the `_update` endpoint
    pub async fn update_document(
        &self,
        document: &Document,
        query: Value,
        params: Params,
    ) -> Result<Response> {
        let mut request = Request::new(Method::Post, "_update")
            .with_indices([document_index(document)?])
            .with_types(document_types(document))
            .with_params(params)
            .with_query(query);
        request.id = document.id.as_deref().map(str::to_string);
        self.execute(&request).await
    }

    /// Create or update the mapping of a type
    pub async fn put_mapping(
        &self,
        type_name: &str,
        mapping: Value,
        indices: &[&str],
    ) -> Result<Response> {
        let request = Request::new(Method::Put, format!("_mappings/{type_name}"))
            .with_indices(owned(indices))
            .with_query(mapping);
        self.execute(&request).await
    }

    /// Get the mappings of the given types
    pub async fn get_mapping(&self, types: &[&str], indices: &[&str]) -> Result<Response> {
        let request = Request::new(Method::Get, format!("_mapping/{}", types.join(",")))
            .with_indices(owned(indices));
        self.execute(&request).await
    }

    /// Delete a mapping together with every document of the type
    pub async fn delete_mapping(&self, type_name: &str, indices: &[&str]) -> Result<Response> {
        let request = Request::new(Method::Delete, format!("_mappings/{type_name}"))
            .with_indices(owned(indices));
        self.execute(&request).await
    }

    /// Check whether all the given indices exist
    pub async fn indices_exist(&self, indices: &[&str]) -> Result<bool> {
        let response = self
            .execute(&Request::new(Method::Head, "").with_indices(owned(indices)))
            .await?;
        Ok(response.status == 200)
    }

    async fn modify_alias(
        &self,
        change: AliasChange,
        alias: &str,
        indices: &[&str],
    ) -> Result<Response> {
        let command = AliasCommand {
            actions: indices
                .iter()
                .map(|&index| {
                    let target = AliasTarget { index, alias };
                    match change {
                        AliasChange::Add => AliasAction::Add(target),
                        AliasChange::Remove => AliasAction::Remove(target),
                    }
                })
                .collect(),
        };
        let query = serde_json::to_value(&command).map_err(EncodingError::from)?;

        self.execute(&Request::new(Method::Post, "_aliases").with_query(query))
            .await
    }

    /// Point an alias at the given indices
    pub async fn add_alias(&self, alias: &str, indices: &[&str]) -> Result<Response> {
        self.modify_alias(AliasChange::Add, alias, indices).await
    }

    /// Remove an alias from the given indices
    pub async fn remove_alias(&self, alias: &str, indices: &[&str]) -> Result<Response> {
        self.modify_alias(AliasChange::Remove, alias, indices).await
    }

    /// Check whether an alias exists
    pub async fn alias_exists(&self, alias: &str) -> Result<bool> {
        let response = self
            .execute(&Request::new(Method::Head, format!("_alias/{alias}")))
            .await?;
        Ok(response.status == 200)
    }
}
