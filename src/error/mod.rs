//! Error taxonomy and the error-to-response adapter.
//!
//! # Data Flow
//! ```text
//! parser / checker / handler error ─┐
//!                                   ├→ FunctionError → adapter.rs → Response
//! recovered panic payload ──────────┘   (from_panic)
//! ```
//!
//! # Design Decisions
//! - One error type for every stage; the kind records the origin
//! - Status and public message are optional on the error and resolved by
//!   the adapter, so generic errors degrade to 500 `internal-server-error`
//! - Internal text and stacks leave the process only in debug mode

pub mod adapter;
pub mod types;

pub use adapter::{adapt_error, default_public_message, ErrorDetail, ErrorEnvelope, ErrorScope};
pub use types::{ErrorKind, FunctionError, FunctionResult, StackCapture};
