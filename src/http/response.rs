//! Outbound response descriptor and builder.
//!
//! # Responsibilities
//! - Define the response handed back to the hosting runtime
//! - Render bodies: JSON, raw string, base64 binary, pre-serialized
//! - Attach the no-cache header set when asked
//!
//! # Design Decisions
//! - Body-setting methods consume the builder, so a response carries at
//!   most one body strategy
//! - Headers are kept sorted so identical inputs render byte-identical output
//! - JSON is pretty-printed with two-space indentation

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::FunctionError;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Headers marking a response as non-cacheable.
pub const NO_CACHE_HEADERS: [(&str, &str); 3] = [
    ("Cache-Control", "no-cache, no-store, must-revalidate"),
    ("Pragma", "no-cache"),
    ("Expires", "0"),
];

/// One response as returned to the hosting runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl Response {
    /// Shorthand for `ResponseBuilder::new()`.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::new()
    }

    /// Header lookup by exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// A body the handler already rendered; passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedResponse {
    pub content_type: String,
    pub is_base64_encoded: bool,
    pub body: String,
}

/// Assembles a [`Response`] from a status code, headers and one body strategy.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    status_code: u16,
    headers: BTreeMap<String, String>,
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseBuilder {
    /// Status 200, no headers.
    pub fn new() -> Self {
        Self {
            status_code: 200,
            headers: BTreeMap::new(),
        }
    }

    pub fn status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add `Cache-Control`, `Pragma` and `Expires` headers disabling caching.
    pub fn no_cache(mut self) -> Self {
        for (name, value) in NO_CACHE_HEADERS {
            self.headers.insert(name.to_string(), value.to_string());
        }
        self
    }

    /// Finish without a body.
    pub fn empty(self) -> Response {
        self.finish(String::new(), false)
    }

    /// Serialize `body` as pretty JSON and set the JSON content type.
    pub fn json<T: Serialize + ?Sized>(self, body: &T) -> Result<Response, FunctionError> {
        let rendered = serde_json::to_string_pretty(body).map_err(|e| {
            FunctionError::new(e.to_string()).with_prefix("unable to serialize response body")
        })?;
        Ok(self.header(CONTENT_TYPE, JSON_CONTENT_TYPE).finish(rendered, false))
    }

    /// Use `body` as-is with an explicit content type and encoding flag.
    pub fn string(
        self,
        body: impl Into<String>,
        content_type: impl Into<String>,
        is_base64_encoded: bool,
    ) -> Response {
        self.header(CONTENT_TYPE, content_type)
            .finish(body.into(), is_base64_encoded)
    }

    /// Base64-encode raw bytes and flag the response as binary.
    pub fn binary(self, body: &[u8], content_type: impl Into<String>) -> Response {
        self.header(CONTENT_TYPE, content_type)
            .finish(STANDARD.encode(body), true)
    }

    /// Pass a handler-rendered body through untouched.
    pub fn serialized(self, body: SerializedResponse) -> Response {
        self.string(body.body, body.content_type, body.is_base64_encoded)
    }

    fn finish(self, body: String, is_base64_encoded: bool) -> Response {
        Response {
            status_code: self.status_code,
            headers: self.headers,
            body,
            is_base64_encoded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_response() {
        let resp = ResponseBuilder::new().empty();
        assert_eq!(resp.status_code, 200);
        assert!(resp.headers.is_empty());
        assert!(resp.body.is_empty());
        assert!(!resp.is_base64_encoded);
    }

    #[test]
    fn test_status_and_string_body() {
        let resp = Response::builder()
            .status(400)
            .string("body", "text/plain", false);
        assert_eq!(resp.status_code, 400);
        assert_eq!(resp.header(CONTENT_TYPE), Some("text/plain"));
        assert_eq!(resp.headers.len(), 1);
        assert_eq!(resp.body, "body");
        assert!(!resp.is_base64_encoded);
    }

    #[test]
    fn test_json_body() {
        let resp = Response::builder().json(&json!({"key": "value"})).unwrap();
        assert_eq!(resp.status_code, 200);
        assert_eq!(resp.header(CONTENT_TYPE), Some(JSON_CONTENT_TYPE));
        assert_eq!(resp.headers.len(), 1);
        assert_eq!(resp.body, "{\n  \"key\": \"value\"\n}");
        assert!(!resp.is_base64_encoded);
    }

    #[test]
    fn test_binary_body() {
        let resp = Response::builder().binary(&[1, 2, 3], "application/octet-stream");
        assert_eq!(resp.header(CONTENT_TYPE), Some("application/octet-stream"));
        assert_eq!(resp.body, "AQID");
        assert!(resp.is_base64_encoded);
    }

    #[test]
    fn test_serialized_body_passes_through() {
        let resp = Response::builder().serialized(SerializedResponse {
            content_type: "text/plain".into(),
            is_base64_encoded: false,
            body: "Hello world!".into(),
        });
        assert_eq!(resp.header(CONTENT_TYPE), Some("text/plain"));
        assert_eq!(resp.body, "Hello world!");
        assert!(!resp.is_base64_encoded);
    }

    #[test]
    fn test_no_cache_and_custom_headers() {
        let resp = Response::builder()
            .no_cache()
            .header("X-Trace", "abc")
            .status(204)
            .empty();
        assert_eq!(resp.status_code, 204);
        assert_eq!(resp.header("Cache-Control"), Some("no-cache, no-store, must-revalidate"));
        assert_eq!(resp.header("Pragma"), Some("no-cache"));
        assert_eq!(resp.header("Expires"), Some("0"));
        assert_eq!(resp.header("X-Trace"), Some("abc"));
    }

    #[test]
    fn test_wire_field_names() {
        let resp = Response::builder().string("x", "text/plain", true);
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["isBase64Encoded"], true);
        assert_eq!(value["headers"]["Content-Type"], "text/plain");
    }
}
