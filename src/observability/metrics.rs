//! Invocation metrics.
//!
//! # Metrics
//! - `function_invocations_total` (counter): invocations by status, outcome
//! - `function_invocation_duration_seconds` (histogram): end-to-end latency
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; exporting is left to the host
//! - `outcome` is `success`, `error` or `panic`

use std::time::Instant;

pub const INVOCATIONS_TOTAL: &str = "function_invocations_total";
pub const INVOCATION_DURATION: &str = "function_invocation_duration_seconds";

/// Record one finished invocation.
pub fn record_invocation(status: u16, outcome: &'static str, started: Instant) {
    let status = status.to_string();
    ::metrics::counter!(INVOCATIONS_TOTAL, "status" => status.clone(), "outcome" => outcome)
        .increment(1);
    ::metrics::histogram!(INVOCATION_DURATION, "status" => status, "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}
