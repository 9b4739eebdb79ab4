use elasticlink_core::{Request, Response};

use crate::{ClientError, Result, UNKNOWN_BULK_ERROR};

/// Decide between success, a bulk item failure and a top-level error.
///
/// Bulk responses answer 200 even when items fail and carry no top-level
/// error, so their items are inspected first.
pub(crate) fn classify(request: &Request, response: Response) -> Result<Response> {
    if request.is_bulk() && response.errors {
        let failure = response
            .items
            .iter()
            .flat_map(|item| item.values())
            .find(|item| !item.error.is_empty())
            .map(|item| ((item.status != 0).then_some(item.status), item.error.clone()));

        let (status, message) = failure.unwrap_or((None, UNKNOWN_BULK_ERROR.to_string()));
        return Err(ClientError::BulkItem {
            status,
            message,
            response: Box::new(response),
        });
    }

    if !response.error.is_empty() {
        return Err(ClientError::Server {
            status: response.status,
            message: response.error.clone(),
            response: Box::new(response),
        });
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use elasticlink_core::{decode_response, Method, BULK_API};

    fn bulk() -> Request {
        Request::new(Method::Post, BULK_API)
    }

    fn search() -> Request {
        Request::new(Method::Post, "_search").with_indices(["x"])
    }

    #[test]
    fn test_top_level_error() {
        let body = br#"{"error":"index_not_found_exception: no such index [x]","status":404}"#;
        let response = decode_response(404, body).unwrap();

        match classify(&search(), response).unwrap_err() {
            ClientError::Server {
                status,
                message,
                response,
            } => {
                assert_eq!(status, 404);
                assert!(message.contains('x'));
                assert_eq!(response.status, 404);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_bulk_item_error_wins_over_ok_status() {
        let body = br#"{"took":1,"errors":true,"items":[
            {"index":{"_id":"1","status":201}},
            {"index":{"status":409,"error":"conflict"}}
        ]}"#;
        let response = decode_response(200, body).unwrap();

        let err = classify(&bulk(), response).unwrap_err();
        assert_eq!(err.to_string(), "[409] conflict");
        match err {
            ClientError::BulkItem {
                status,
                message,
                response,
            } => {
                assert_eq!(status, Some(409));
                assert_eq!(message, "conflict");
                assert_eq!(response.items.len(), 2, "successful items are kept");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_bulk_flag_without_item_error() {
        let body = br#"{"errors":true,"items":[{"index":{"status":201}}]}"#;
        let response = decode_response(200, body).unwrap();

        match classify(&bulk(), response).unwrap_err() {
            ClientError::BulkItem {
                status, message, ..
            } => {
                assert_eq!(status, None);
                assert_eq!(message, UNKNOWN_BULK_ERROR);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_repeated_keys_still_classify_as_errors() {
        let response =
            decode_response(500, br#"{"error":"boom","status":500,"status":500}"#).unwrap();
        let err = classify(&search(), response).unwrap_err();
        assert_eq!(err.to_string(), "[500] boom");

        let body = br#"{"errors":true,"errors":true,"items":[{"index":{"status":409,"error":"conflict"}}]}"#;
        let response = decode_response(200, body).unwrap();
        let err = classify(&bulk(), response).unwrap_err();
        assert_eq!(err.to_string(), "[409] conflict");
    }

    #[test]
    fn test_errors_flag_ignored_outside_bulk() {
        let response = decode_response(200, br#"{"errors":true}"#).unwrap();
        assert!(classify(&search(), response).is_ok());
    }

    #[test]
    fn test_success_passes_envelope_through() {
        let response = decode_response(200, br#"{"acknowledged":true}"#).unwrap();
        let response = classify(&search(), response).unwrap();
        assert!(response.acknowledged);
        assert_eq!(response.status, 200);
    }
}
