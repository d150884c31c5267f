//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};

use crate::pipeline::BodyStrategy;

/// Environment variable that overrides [`FunctionConfig::debug`].
pub const DEBUG_ENV: &str = "FUNCTION_DEBUG";

/// Root configuration for one function.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FunctionConfig {
    /// Include internal messages and stacks in error responses.
    pub debug: bool,

    /// Body decoding strategy ("json" or "form").
    pub body_strategy: BodyStrategy,

    /// Run the built-in `Content-Type` checker.
    pub check_content_type: bool,

    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for FunctionConfig {
    fn default() -> Self {
        Self {
            debug: false,
            body_strategy: BodyStrategy::Json,
            check_content_type: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl FunctionConfig {
    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        let value = std::env::var(DEBUG_ENV).ok();
        self.apply_debug_override(value.as_deref());
    }

    /// `"1"` or `"true"` enable debug, `"0"` or `"false"` disable it;
    /// anything else leaves the setting alone.
    pub(crate) fn apply_debug_override(&mut self, value: Option<&str>) {
        match value.map(str::trim) {
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => self.debug = true,
            Some(v) if v == "0" || v.eq_ignore_ascii_case("false") => self.debug = false,
            _ => {}
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive). `RUST_LOG` takes precedence.
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, for development.
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}
