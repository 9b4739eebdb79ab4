//! Bulk payload encoding.
//!
//! The bulk endpoint takes newline-delimited JSON rather than one JSON
//! document: an action line per document, optionally followed by a source
//! line, and a mandatory trailing newline. Results come back one per action
//! line in submission order.

use serde::Serialize;
use serde_json::Value;

use crate::error::{kind_of, EncodingError};
use crate::models::{BulkCommand, Document, DocumentId};

#[derive(Serialize)]
struct ActionMeta<'a> {
    #[serde(rename = "_index")]
    index: Option<&'a str>,
    #[serde(rename = "_type", skip_serializing_if = "str::is_empty")]
    doc_type: &'a str,
    #[serde(rename = "_id")]
    id: &'a DocumentId,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum ActionLine<'a> {
    Index(ActionMeta<'a>),
    Delete(ActionMeta<'a>),
}

/// The source line of a document, or `None` when the action has no content.
///
/// Deletes never carry content, nor do documents whose fields are absent or
/// an empty record. Anything other than a record is rejected.
pub fn source_line(document: &Document) -> Result<Option<&serde_json::Map<String, Value>>, EncodingError> {
    if document.bulk_command == BulkCommand::Delete {
        return Ok(None);
    }

    match &document.fields {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(fields)) if fields.is_empty() => Ok(None),
        Some(Value::Object(fields)) => Ok(Some(fields)),
        Some(other) => Err(EncodingError::InvalidFields {
            found: kind_of(other),
        }),
    }
}

/// Encode documents into a bulk request body.
///
/// Every line, the last one included, ends with `\n`, so splitting the
/// output on `\n` yields an empty final line. An empty input encodes to an
/// empty body.
pub fn encode_bulk(documents: &[Document]) -> Result<Vec<u8>, EncodingError> {
    let mut body = Vec::new();
    let mut sources = 0;

    for document in documents {
        let meta = ActionMeta {
            index: document.index.as_deref(),
            doc_type: &document.doc_type,
            id: &document.id,
        };
        let action = match document.bulk_command {
            BulkCommand::Index => ActionLine::Index(meta),
            BulkCommand::Delete => ActionLine::Delete(meta),
        };

        let source = source_line(document)?;

        serde_json::to_writer(&mut body, &action)?;
        body.push(b'\n');

        if let Some(fields) = source {
            serde_json::to_writer(&mut body, fields)?;
            body.push(b'\n');
            sources += 1;
        }
    }

    tracing::debug!(
        actions = documents.len(),
        sources,
        bytes = body.len(),
        "Encoded bulk payload"
    );

    Ok(body)
}
