//! # vexcept Utilities
//!
//! Shared utilities, logging, and helpers for vexcept.
//!
//! This crate provides common functionality used across the vexcept workspace:
//! logging infrastructure built on `tracing`, and parsing of the numeric
//! arguments the command line accepts.

pub mod logging;
pub mod parse;

// Re-export commonly used logging functions for convenience
pub use logging::{init_logging, init_logging_with_level, LogFormat, LogLevel, LoggingError, LoggingGuard};
pub use parse::parse_u32;
pub use tracing::{debug, error, info, trace, warn};
