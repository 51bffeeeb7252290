//! Error types for the monitor

use thiserror::Error;

/// Result type alias for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors raised by the monitor itself
///
/// Failures of the instrumented operations are never translated into this
/// type; they reach the caller unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// Measurement was requested while the monitor is not active
    #[error("Cannot measure while the monitor is not active")]
    NotActive,
}
