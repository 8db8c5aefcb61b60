//! Utility modules.

/// Timestamp parsing for `located-at` values.
pub mod datetime;

/// Log sanitization: keeps OAuth secrets and long bodies out of logs.
pub mod log_sanitizer;
