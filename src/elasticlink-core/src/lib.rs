//! elasticlink Core Library
//!
//! Transport-free building blocks of the elasticlink client:
//! - Request model and path/query building
//! - Bulk payload encoding
//! - Response envelope and best-effort decoding
//! - Aggregation traversal
//! - Connection configuration

pub mod aggregation;
pub mod bulk;
pub mod config;
pub mod decode;
pub mod error;
pub mod models;
pub mod request;

// Re-export commonly used types
pub use aggregation::{Aggregation, Bucket};
pub use bulk::encode_bulk;
pub use config::ClientConfig;
pub use decode::decode_response;
pub use error::{AccessError, EncodingError};
pub use models::*;
pub use request::{Method, Params, Request, BULK_API, JSON_CONTENT_TYPE};
pub use url::Url;
