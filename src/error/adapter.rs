//! Converts failures into the canonical JSON error response.
//!
//! # Responsibilities
//! - Resolve status code (default 500) and public message (default: slug of
//!   the status reason phrase)
//! - Attach the request id
//! - Attach internal messages and call stacks only in debug mode
//!
//! # Design Decisions
//! - Pure: the same failure and scope always render the same bytes
//! - Returned errors and recovered panics share this single path, so the
//!   wire shape never reveals which one happened

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::FunctionError;
use crate::http::{Response, ResponseBuilder, JSON_CONTENT_TYPE};

/// The per-invocation facts the adapter needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorScope {
    pub debug: bool,
    pub request_id: String,
}

impl ErrorScope {
    pub fn new(debug: bool, request_id: impl Into<String>) -> Self {
        Self {
            debug,
            request_id: request_id.into(),
        }
    }
}

impl From<&Context> for ErrorScope {
    fn from(ctx: &Context) -> Self {
        Self::new(ctx.debug(), ctx.request_id())
    }
}

/// Wire format of an error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub public_message: String,
    pub request_id: String,

    /// Present only in debug mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ErrorDetail>>,
}

/// Internal detail for one constituent error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ErrorDetail {
    pub error: String,
    pub stack_trace: Vec<String>,
}

impl ErrorEnvelope {
    pub fn new(scope: &ErrorScope, err: &FunctionError) -> Self {
        let status_code = err.status_or_default();
        let public_message = err
            .public_message()
            .map(str::to_string)
            .unwrap_or_else(|| default_public_message(status_code));

        let errors = scope.debug.then(|| {
            err.causes()
                .map(|cause| ErrorDetail {
                    error: cause.message().to_string(),
                    stack_trace: cause.stack_frames(),
                })
                .collect()
        });

        Self {
            status_code,
            public_message,
            request_id: scope.request_id.clone(),
            errors,
        }
    }
}

/// Render `err` as a no-cache JSON error response.
pub fn adapt_error(scope: &ErrorScope, err: &FunctionError) -> Response {
    let envelope = ErrorEnvelope::new(scope, err);
    let builder = ResponseBuilder::new()
        .status(envelope.status_code)
        .no_cache();

    match builder.clone().json(&envelope) {
        Ok(response) => response,
        // Only strings and integers are serialized; kept for completeness.
        Err(_) => builder.string(
            format!(
                "{{\"statusCode\":{},\"publicMessage\":{:?},\"requestId\":{:?}}}",
                envelope.status_code, envelope.public_message, envelope.request_id
            ),
            JSON_CONTENT_TYPE,
            false,
        ),
    }
}

/// Slug of the standard reason phrase: lowercase, spaces to hyphens,
/// apostrophes dropped. Unknown codes are `unknown`. A few codes use their
/// older registered names (413 is `request-entity-too-large`).
pub fn default_public_message(status_code: u16) -> String {
    let legacy = match status_code {
        103 => Some("early-hints"),
        413 => Some("request-entity-too-large"),
        414 => Some("request-uri-too-long"),
        416 => Some("requested-range-not-satisfiable"),
        418 => Some("i-am-a-teapot"),
        425 => Some("too-early"),
        _ => None,
    };
    if let Some(slug) = legacy {
        return slug.to_string();
    }

    ::http::StatusCode::from_u16(status_code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .map(|reason| reason.to_lowercase().replace(' ', "-").replace('\'', ""))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::CONTENT_TYPE;

    fn decode(response: &Response) -> ErrorEnvelope {
        serde_json::from_str(&response.body).unwrap()
    }

    #[test]
    fn test_default_public_messages() {
        assert_eq!(default_public_message(400), "bad-request");
        assert_eq!(default_public_message(404), "not-found");
        assert_eq!(default_public_message(409), "conflict");
        assert_eq!(default_public_message(418), "i-am-a-teapot");
        assert_eq!(default_public_message(500), "internal-server-error");
        assert_eq!(default_public_message(599), "unknown");
    }

    #[test]
    fn test_default_public_messages_keep_legacy_names() {
        assert_eq!(default_public_message(413), "request-entity-too-large");
        assert_eq!(default_public_message(414), "request-uri-too-long");
        assert_eq!(default_public_message(416), "requested-range-not-satisfiable");
        assert_eq!(default_public_message(425), "too-early");
        assert_eq!(default_public_message(422), "unprocessable-entity");
        assert_eq!(default_public_message(429), "too-many-requests");
        assert_eq!(default_public_message(42), "unknown");
    }

    #[test]
    fn test_adapt_cases() {
        let cases = [
            (FunctionError::from_panic(Box::new("test error")), 500, "internal-server-error"),
            (FunctionError::from_panic(Box::new(100_u8)), 500, "internal-server-error"),
            (FunctionError::new("test error"), 500, "internal-server-error"),
            (FunctionError::invalid_body("test error"), 400, "invalid-body"),
            (FunctionError::rejected(401, "test error"), 401, "unauthorized"),
            (
                FunctionError::new("test error").with_status(409).with_public_message("test-error"),
                409,
                "test-error",
            ),
        ];

        for (err, status, public_message) in cases {
            for debug in [false, true] {
                for request_id in ["", "request-id"] {
                    let scope = ErrorScope::new(debug, request_id);
                    let out = adapt_error(&scope, &err);
                    let envelope = decode(&out);

                    assert_eq!(out.status_code, status);
                    assert_eq!(out.header(CONTENT_TYPE), Some(JSON_CONTENT_TYPE));
                    assert_eq!(out.header("Cache-Control"), Some("no-cache, no-store, must-revalidate"));
                    assert!(!out.is_base64_encoded);

                    assert_eq!(envelope.status_code, status);
                    assert_eq!(envelope.public_message, public_message);
                    assert_eq!(envelope.request_id, request_id);

                    if debug {
                        let errors = envelope.errors.expect("debug errors");
                        assert_eq!(errors.len(), 1);
                        assert_eq!(errors[0].error, err.message());
                        assert!(!errors[0].stack_trace.is_empty());
                    } else {
                        assert!(envelope.errors.is_none());
                        assert!(!out.body.contains("\"errors\""));
                    }
                }
            }
        }
    }

    #[test]
    fn test_composite_renders_each_cause() {
        let err = FunctionError::new("first")
            .with_status(422)
            .and(FunctionError::new("second"));
        let envelope = decode(&adapt_error(&ErrorScope::new(true, "r"), &err));

        let errors = envelope.errors.unwrap();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].error, "first");
        assert_eq!(errors[1].error, "second");
        assert_eq!(envelope.public_message, "unprocessable-entity");
    }

    #[test]
    fn test_adapter_is_idempotent() {
        let err = FunctionError::new("boom").with_status(503);
        let scope = ErrorScope::new(true, "abc");
        assert_eq!(adapt_error(&scope, &err), adapt_error(&scope, &err));
    }
}
