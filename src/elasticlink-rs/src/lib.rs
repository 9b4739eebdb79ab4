//! elasticlink Client Library
//!
//! Async client for a search engine's REST API. Requests are built and
//! decoded by `elasticlink-core`; the HTTP exchange itself goes through an
//! injected [`Transport`], by default [`ReqwestTransport`].
//!
//! ```rust,no_run
//! use elasticlink_rs::{Client, ClientConfig, Params};
//! use serde_json::json;
//!
//! # async fn run() -> elasticlink_rs::Result<()> {
//! let client = Client::from_config(&ClientConfig::new("localhost", "9200"))?;
//! let query = json!({"query": {"match_all": {}}});
//! let response = client.search(query, &["tweets"], &[], Params::new()).await?;
//! println!("{} hits", response.hits.total);
//! # Ok(())
//! # }
//! ```

mod classify;
mod client;
pub mod transport;

pub use client::Client;
pub use elasticlink_core::{
    Aggregation, BulkCommand, Bucket, ClientConfig, Document, DocumentId, EncodingError, Method,
    Params, Request, Response,
};
pub use transport::{ReqwestTransport, Transport, TransportError};

/// Message used when the bulk endpoint flags errors without naming one
pub const UNKNOWN_BULK_ERROR: &str = "unknown bulk error";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    Connectivity(#[from] TransportError),

    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("[{status}] {message}")]
    Server {
        status: u16,
        message: String,
        response: Box<Response>,
    },

    #[error("[{}] {message}", .status.unwrap_or_default())]
    BulkItem {
        status: Option<u16>,
        message: String,
        response: Box<Response>,
    },

    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("invalid response from server (status {status}): {source}")]
    InvalidResponse {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Status code attached to the error, when there is one
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. }
            | ClientError::UnexpectedStatus { status, .. }
            | ClientError::InvalidResponse { status, .. } => Some(*status),
            ClientError::BulkItem { status, .. } => *status,
            _ => None,
        }
    }

    /// Envelope decoded before the error was classified
    pub fn response(&self) -> Option<&Response> {
        match self {
            ClientError::Server { response, .. } | ClientError::BulkItem { response, .. } => {
                Some(response)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
