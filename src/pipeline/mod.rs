//! Request pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Request → function.rs (orchestrator)
//!     → provider.rs (context enrichment, in order)
//!     → parser.rs (JSON or form body → Req)
//!     → checker.rs (content type, caller checks; may reject or enrich)
//!     → handler → Reply → Response
//! ```
//!
//! # Design Decisions
//! - Stages are explicit ordered lists walked by one loop, not nested wrappers
//! - The request type is a generic parameter; decoding is statically typed
//! - Stages and handler are read-only after setup, so one `Function` may
//!   serve concurrent invocations

pub mod checker;
pub mod function;
pub mod parser;
pub mod provider;

pub use checker::{header_matches, Checker, ContentTypeChecker};
pub use function::{Function, Reply};
pub use parser::{parse_body, BodyStrategy, NoBody, RequestShape};
pub use provider::{generated, providers, singleton, Generated, Provider, Providers, Singleton};
