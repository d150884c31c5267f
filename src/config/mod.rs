//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! function.toml
//!     → loader.rs (read & deserialize)
//!     → FunctionConfig::apply_env (FUNCTION_DEBUG override)
//!     → validation.rs (semantic checks)
//!     → Function::configure / init_logging
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a function is configured once at setup
//! - All fields have defaults to allow minimal (or empty) files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{FunctionConfig, LogFormat, LoggingConfig};
pub use validation::{validate_config, ValidationError};
