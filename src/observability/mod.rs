//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Function::invoke
//!     → tracing span `invocation` (request_id, method, path)
//!         → stage events at debug, failures at warn / error
//!     → metrics.rs (invocation counter + duration histogram)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr, pretty or JSON)
//!     → whatever metrics recorder the host installs
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID is attached to the invocation span, so every event carries it
//! - Metrics go through the `metrics` facade; without a recorder they are no-ops

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
