//! Request body parsing.
//!
//! # Responsibilities
//! - Reject base64-flagged bodies
//! - Enforce an empty body when the function expects none
//! - Decode JSON or form-encoded bodies into the configured request type
//!
//! # Design Decisions
//! - The request type is a compile-time generic; `RequestShape` only records
//!   whether a body is expected at all
//! - JSON decodes straight from text into the target type, so numbers never
//!   pass through an intermediate float
//! - Unknown fields are rejected at any depth, for JSON and forms alike

use std::marker::PhantomData;

use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::FunctionError;
use crate::http::Request;

const INVALID_BODY_PREFIX: &str = "invalid Body";

/// How the raw body is decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyStrategy {
    #[default]
    Json,
    Form,
}

impl BodyStrategy {
    /// Media type the built-in content-type checker expects.
    pub fn media_type(self) -> &'static str {
        match self {
            BodyStrategy::Json => "application/json",
            BodyStrategy::Form => "application/x-www-form-urlencoded",
        }
    }
}

/// Request type of functions that take no body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoBody;

/// Describes the request body a function accepts.
pub struct RequestShape<T> {
    expects_body: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RequestShape<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// A body decoded into `T`.
    pub fn of() -> Self {
        Self {
            expects_body: true,
            _marker: PhantomData,
        }
    }
}

impl RequestShape<NoBody> {
    /// No body; a non-empty body is rejected.
    pub fn none() -> Self {
        Self {
            expects_body: false,
            _marker: PhantomData,
        }
    }
}

impl<T> RequestShape<T> {
    pub fn expects_body(&self) -> bool {
        self.expects_body
    }

    pub fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl<T> Clone for RequestShape<T> {
    fn clone(&self) -> Self {
        Self {
            expects_body: self.expects_body,
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for RequestShape<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestShape")
            .field("type", &self.type_name())
            .field("expects_body", &self.expects_body)
            .finish()
    }
}

/// Parse the request body according to `strategy` and `shape`.
///
/// Returns `Ok(None)` only for the no-body shape with an empty body.
pub fn parse_body<T>(
    strategy: BodyStrategy,
    shape: &RequestShape<T>,
    request: &Request,
) -> Result<Option<T>, FunctionError>
where
    T: DeserializeOwned,
{
    if request.is_base64_encoded {
        return Err(FunctionError::invalid_body(
            "invalid IsBase64Encoded: expected 'false', got 'true'",
        ));
    }

    if !shape.expects_body() {
        if !request.body.is_empty() {
            return Err(FunctionError::unexpected_body("unexpected Body"));
        }
        return Ok(None);
    }

    let parsed = match strategy {
        BodyStrategy::Json => decode_json(&request.body)?,
        BodyStrategy::Form => decode_form(&request.body)?,
    };
    Ok(Some(parsed))
}

fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, FunctionError> {
    let mut unknown = Vec::new();
    let mut de = serde_json::Deserializer::from_str(body);

    let parsed: T = serde_ignored::deserialize(&mut de, |path| unknown.push(path.to_string()))
        .map_err(|e| invalid_body(e.to_string()))?;
    de.end().map_err(|e| invalid_body(e.to_string()))?;

    reject_unknown(&unknown)?;
    Ok(parsed)
}

fn decode_form<T: DeserializeOwned>(body: &str) -> Result<T, FunctionError> {
    validate_form(body).map_err(invalid_body)?;

    let mut unknown = Vec::new();
    let de = serde_urlencoded::Deserializer::new(url::form_urlencoded::parse(body.as_bytes()));

    let parsed: T = serde_ignored::deserialize(de, |path| unknown.push(path.to_string()))
        .map_err(|e| invalid_body(e.to_string()))?;

    reject_unknown(&unknown)?;
    Ok(parsed)
}

fn reject_unknown(unknown: &[String]) -> Result<(), FunctionError> {
    match unknown.first() {
        Some(field) => Err(invalid_body(format!("unknown field `{field}`"))),
        None => Ok(()),
    }
}

fn invalid_body(message: String) -> FunctionError {
    FunctionError::invalid_body(message).with_prefix(INVALID_BODY_PREFIX)
}

/// Syntax checks the form decoder is lenient about: `;` separators,
/// malformed percent escapes and escapes that decode to invalid UTF-8 are
/// rejected.
fn validate_form(body: &str) -> Result<(), String> {
    for pair in body.split('&') {
        if pair.contains(';') {
            return Err("invalid semicolon separator in query".to_string());
        }
        check_escapes(pair)?;

        for part in pair.splitn(2, '=') {
            if let Err(e) = percent_decode_str(part).decode_utf8() {
                return Err(format!("invalid UTF-8 in {part:?}: {e}"));
            }
        }
    }
    Ok(())
}

fn check_escapes(pair: &str) -> Result<(), String> {
    let bytes = pair.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                let end = (i + 3).min(bytes.len());
                let escape = String::from_utf8_lossy(&bytes[i..end]);
                return Err(format!("invalid URL escape \"{escape}\""));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}
