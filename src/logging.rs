//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::header::CONTENT_TYPE,
    middleware::Next,
    response::Response,
};
use serde_json::Value;

/// Bodies longer than this many bytes are truncated in the `info` log.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The text logged in place of redacted values.
const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
///
/// SMS text is redacted from JSON bodies since bank messages carry balances
/// and account numbers.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body_bytes) = split_request(request).await;

    let body_text = String::from_utf8_lossy(&body_bytes);
    if is_json(parts.headers.get(CONTENT_TYPE)) {
        log_request(&parts, &redact_json_field(&body_text, "message"));
    } else {
        log_request(&parts, &body_text);
    }

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body_bytes) = split_response(response).await;

    let body_text = String::from_utf8_lossy(&body_bytes);
    if is_json(parts.headers.get(CONTENT_TYPE)) {
        log_response(&parts, &redact_json_field(&body_text, "raw_sms"));
    } else {
        log_response(&parts, &body_text);
    }

    Response::from_parts(parts, Body::from(body_bytes))
}

fn is_json(content_type: Option<&axum::http::HeaderValue>) -> bool {
    content_type
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Replace every string value stored under `field_name` in a JSON document.
///
/// Text that is not valid JSON is returned unchanged.
fn redact_json_field(json_text: &str, field_name: &str) -> String {
    let mut value: Value = match serde_json::from_str(json_text) {
        Ok(value) => value,
        Err(_) => return json_text.to_owned(),
    };

    redact_value(&mut value, field_name);

    value.to_string()
}

fn redact_value(value: &mut Value, field_name: &str) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                if key == field_name && child.is_string() {
                    *child = Value::String(REDACTED.to_owned());
                } else {
                    redact_value(child, field_name);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                redact_value(item, field_name);
            }
        }
        _ => {}
    }
}

async fn split_request(request: Request) -> (axum::http::request::Parts, Bytes) {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("could not read request body: {error}");
            Bytes::new()
        }
    };

    (parts, body_bytes)
}

async fn split_response(response: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            Bytes::new()
        }
    };

    (parts, body_bytes)
}

fn truncate(body: &str) -> &str {
    if body.len() <= LOG_BODY_LENGTH_LIMIT {
        return body;
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {}...",
            parts.method,
            parts.uri,
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {}...",
            parts.status,
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}

#[cfg(test)]
mod redact_tests {
    use serde_json::{Value, json};

    use super::{LOG_BODY_LENGTH_LIMIT, redact_json_field, truncate};

    #[test]
    fn redacts_top_level_field() {
        let body = json!({"message": "Rs 500 debited from A/c XX1234", "sender": "HDFCBK"});

        let redacted = redact_json_field(&body.to_string(), "message");

        let redacted: Value = serde_json::from_str(&redacted).unwrap();
        assert_eq!(redacted["message"], "********");
        assert_eq!(redacted["sender"], "HDFCBK");
    }

    #[test]
    fn redacts_nested_fields() {
        let body = json!({"sms_transactions": [{"raw_sms": "secret"}, {"raw_sms": "also"}]});

        let redacted = redact_json_field(&body.to_string(), "raw_sms");

        assert!(!redacted.contains("secret"));
        assert!(!redacted.contains("also"));
    }

    #[test]
    fn leaves_non_json_untouched() {
        assert_eq!(redact_json_field("message=hi", "message"), "message=hi");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "₹".repeat(LOG_BODY_LENGTH_LIMIT);

        let truncated = truncate(&body);

        assert!(truncated.len() <= LOG_BODY_LENGTH_LIMIT);
        assert!(truncated.chars().all(|c| c == '₹'));
    }
}
