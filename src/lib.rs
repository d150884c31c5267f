//! Request pipeline for serverless HTTP functions.
//!
//! One inbound API Gateway style request goes through context building,
//! providers, body parsing, checkers and a business handler, and comes out
//! as exactly one response. Failures and panics at any stage render the
//! same JSON error envelope.

// Core pipeline
pub mod context;
pub mod error;
pub mod http;
pub mod pipeline;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use config::schema::FunctionConfig;
pub use context::{Context, Key};
pub use error::{adapt_error, ErrorKind, FunctionError, FunctionResult};
pub use http::{Request, Response, ResponseBuilder, SerializedResponse};
pub use pipeline::{BodyStrategy, Function, NoBody, Reply, RequestShape};
