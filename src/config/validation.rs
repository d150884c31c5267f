//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the log filter parses as an `EnvFilter` directive
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FunctionConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::FunctionConfig;

/// One semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("logging.level must not be empty")]
    EmptyLogLevel,

    #[error("logging.level '{level}' is not a valid filter: {reason}")]
    InvalidLogLevel { level: String, reason: String },
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &FunctionConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let level = config.logging.level.trim();
    if level.is_empty() {
        errors.push(ValidationError::EmptyLogLevel);
    } else if let Err(e) = EnvFilter::try_new(level) {
        errors.push(ValidationError::InvalidLogLevel {
            level: level.to_string(),
            reason: e.to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
