//! Error types shared by the feed simulator and the terminal dashboard.
//!
//! The `PulseError` enum unifies the few failure cases the workspace has: reading
//! board and config files, decoding JSON and validating configuration. The feed
//! core itself never fails; these errors belong to loading and wiring.
use std::io;

use thiserror::Error;

/// Unified error type shared across the workspace.
#[derive(Error, Debug)]
pub enum PulseError {
    /// I/O error originating from the standard library (board/config files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Feed configuration rejected by validation.
    #[error("Invalid feed config: {0}")]
    Config(String),
}
