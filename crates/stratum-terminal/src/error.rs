//! Error types for stratum-terminal.

use thiserror::Error;

/// Errors from the terminal engine.
#[derive(Debug, Error)]
pub enum TermError {
    /// Plane, blit or render failure from the core.
    #[error(transparent)]
    Core(#[from] stratum_core::Error),

    /// IO error from terminal operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Standard output is not a terminal.
    #[error("Terminal not available")]
    TerminalNotAvailable,

    /// `input_start` was called while the reader thread is running.
    #[error("Input reader already running")]
    InputAlreadyRunning,
}

/// Result alias for the terminal engine.
pub type Result<T> = std::result::Result<T, TermError>;
