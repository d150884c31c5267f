//! Request and response descriptors exchanged with the hosting runtime.
//!
//! # Data Flow
//! ```text
//! platform event (JSON)
//!     → request.rs (Request, RequestContext)
//!     → pipeline (context, providers, parser, checkers, handler)
//!     → response.rs (ResponseBuilder → Response)
//!     → platform
//! ```

pub mod request;
pub mod response;

pub use request::{Identity, Request, RequestContext};
pub use response::{
    Response, ResponseBuilder, SerializedResponse, CONTENT_TYPE, JSON_CONTENT_TYPE,
    NO_CACHE_HEADERS,
};
