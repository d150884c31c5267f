//! Inbound request descriptor.
//!
//! # Responsibilities
//! - Mirror the API Gateway proxy event the hosting runtime hands over
//! - Tolerate `null` / missing maps and strings from the platform
//! - Offer small builders so checkers and handlers can be tested offline
//!
//! # Design Decisions
//! - Field names follow the platform's camelCase wire format exactly
//! - Unknown platform fields are ignored (the event grows over time)

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// One inbound request as delivered by the hosting runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Request {
    /// Resource template, e.g. `/users/{id}`.
    #[serde(deserialize_with = "null_as_default")]
    pub resource: String,

    /// Concrete request path, e.g. `/users/42`.
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,

    #[serde(deserialize_with = "null_as_default")]
    pub http_method: String,

    #[serde(deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,

    #[serde(deserialize_with = "null_as_default")]
    pub multi_value_headers: HashMap<String, Vec<String>>,

    #[serde(deserialize_with = "null_as_default")]
    pub query_string_parameters: HashMap<String, String>,

    #[serde(deserialize_with = "null_as_default")]
    pub multi_value_query_string_parameters: HashMap<String, Vec<String>>,

    #[serde(deserialize_with = "null_as_default")]
    pub path_parameters: HashMap<String, String>,

    #[serde(deserialize_with = "null_as_default")]
    pub stage_variables: HashMap<String, String>,

    #[serde(deserialize_with = "null_as_default")]
    pub request_context: RequestContext,

    /// Raw body; base64 text when `is_base64_encoded` is set.
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,

    #[serde(deserialize_with = "null_as_default")]
    pub is_base64_encoded: bool,
}

impl Request {
    /// Create a request for the given method and path (resource = path).
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            resource: path.clone(),
            path,
            http_method: method.into(),
            ..Self::default()
        }
    }

    /// Set the resource template.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    /// Append a header value to both the single- and multi-value maps.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        self.multi_value_headers
            .entry(name.clone())
            .or_default()
            .push(value.clone());
        self.headers.insert(name, value);
        self
    }

    /// Append a query string value to both the single- and multi-value maps.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        self.multi_value_query_string_parameters
            .entry(name.clone())
            .or_default()
            .push(value.clone());
        self.query_string_parameters.insert(name, value);
        self
    }

    pub fn with_path_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_stage_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.stage_variables.insert(name.into(), value.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_context.request_id = request_id.into();
        self
    }

    /// Set a plain-text body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.is_base64_encoded = false;
        self
    }

    /// Set a body the platform flagged as base64-encoded.
    pub fn with_base64_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.is_base64_encoded = true;
        self
    }
}

/// Platform metadata attached to every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestContext {
    /// Correlation id assigned by the platform; empty if omitted.
    #[serde(deserialize_with = "null_as_default")]
    pub request_id: String,

    #[serde(deserialize_with = "null_as_default")]
    pub account_id: String,

    #[serde(deserialize_with = "null_as_default")]
    pub api_id: String,

    #[serde(deserialize_with = "null_as_default")]
    pub resource_id: String,

    #[serde(deserialize_with = "null_as_default")]
    pub resource_path: String,

    #[serde(deserialize_with = "null_as_default")]
    pub http_method: String,

    #[serde(deserialize_with = "null_as_default")]
    pub stage: String,

    #[serde(deserialize_with = "null_as_default")]
    pub identity: Identity,
}

/// Caller identity as reported by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Identity {
    #[serde(deserialize_with = "null_as_default")]
    pub source_ip: String,

    #[serde(deserialize_with = "null_as_default")]
    pub user_agent: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
