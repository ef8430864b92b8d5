//! Result type alias shared across the workspace.
//!
//! Functions can simply return `Result<T>` and get `PulseError` as the error type.
use crate::error::PulseError;

/// Workspace-wide `Result` alias with `PulseError` as the default error.
pub type Result<T, E = PulseError> = std::result::Result<T, E>;
