//! Shared fixtures for integration tests.

use lambda_pipeline::error::ErrorEnvelope;
use lambda_pipeline::{Request, Response};
use serde::{Deserialize, Serialize};

pub const JSON: &str = "application/json; charset=utf-8";
pub const FORM: &str = "application/x-www-form-urlencoded";

/// Request body used by most test functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRequest {
    pub value: String,
}

/// Response body used by most test functions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResponse {
    pub value: String,
}

/// A POST to `/{name}` carrying a JSON `TestRequest`, the way the platform
/// delivers it: both header maps populated and a request id set.
pub fn json_request(name: &str, value: &str) -> Request {
    let body = serde_json::to_string(&TestRequest {
        value: value.to_string(),
    })
    .unwrap();
    Request::new("POST", format!("/{name}"))
        .with_header("Content-Type", JSON)
        .with_request_id(format!("{name}-request-id"))
        .with_body(body)
}

/// Like [`json_request`], but form-encoded.
pub fn form_request(name: &str, value: &str) -> Request {
    let body = serde_urlencoded::to_string(&TestRequest {
        value: value.to_string(),
    })
    .unwrap();
    Request::new("POST", format!("/{name}"))
        .with_header("Content-Type", FORM)
        .with_request_id(format!("{name}-request-id"))
        .with_body(body)
}

/// A POST to `/{name}` with no body.
#[allow(dead_code)]
pub fn empty_request(name: &str) -> Request {
    Request::new("POST", format!("/{name}"))
        .with_header("Content-Type", JSON)
        .with_request_id(format!("{name}-request-id"))
}

pub fn decode_error(response: &Response) -> ErrorEnvelope {
    serde_json::from_str(&response.body).unwrap()
}

#[allow(dead_code)]
pub fn decode_body<T: for<'de> Deserialize<'de>>(response: &Response) -> T {
    serde_json::from_str(&response.body).unwrap()
}

/// Assert the error status, public message and, in debug mode, the single
/// internal message.
#[allow(dead_code)]
pub fn assert_error(response: &Response, status: u16, public_message: &str, message: Option<&str>) {
    assert_eq!(response.status_code, status, "{}", response.body);
    assert_eq!(response.header("Content-Type"), Some(JSON));

    let envelope = decode_error(response);
    assert_eq!(envelope.status_code, status);
    assert_eq!(envelope.public_message, public_message);

    match message {
        Some(message) => {
            let errors = envelope.errors.expect("debug errors");
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].error, message);
            assert!(!errors[0].stack_trace.is_empty());
        }
        None => {
            assert!(envelope.errors.is_none());
            assert!(!response.body.contains("\"errors\""));
        }
    }
}
