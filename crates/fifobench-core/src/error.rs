use std::io;

use thiserror::Error;

/// Closed error taxonomy for the benchmark engine.
///
/// Mirrors the plug-in result taxonomy at the boundary (`PluginResult`) but
/// covers everything outside a single storage call: configuration mistakes,
/// checkpoint I/O, and cohort abort requests raised by rank 0.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown plug-in: {0}")]
    UnknownPlugin(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("plug-in initialize failed: {0}")]
    PluginInit(String),

    /// Not a failure on its own; signals that the cohort must abort with the
    /// given exit code. The driver matches on this to call the transport's
    /// `abort()` before unwinding.
    #[error("cohort abort requested (code {0})")]
    Abort(i32),
}

impl EngineError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidArgument(msg.into())
    }
}
