//! Error types for the query runner.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

use crate::service::ExecutionState;

/// Main error type for query runner operations.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The service rejected the statement or its target (bad SQL, unknown database/workgroup).
    #[error("Submission rejected: {0}")]
    Submission(String),

    /// The execution reached a terminal FAILED or CANCELLED state.
    #[error("Query {state}: {reason}")]
    ExecutionFailed {
        state: ExecutionState,
        reason: String,
    },

    /// The execution was still running when the wait deadline passed.
    #[error("Query did not finish within {timeout_secs} seconds")]
    WaitTimeout { timeout_secs: u64 },

    /// A call to the query service itself failed (network, HTTP status, bad payload).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading the statement or writing the output failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RunnerError {
    /// Creates a submission error with the given message.
    pub fn submission(msg: impl Into<String>) -> Self {
        Self::Submission(msg.into())
    }

    /// Creates an execution failure for a terminal state.
    ///
    /// An empty or missing reason is replaced with a placeholder so the
    /// message is never blank.
    pub fn execution_failed(state: ExecutionState, reason: Option<&str>) -> Self {
        let reason = match reason.map(str::trim) {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => "no reason given".to_string(),
        };
        Self::ExecutionFailed { state, reason }
    }

    /// Creates a wait timeout error.
    pub fn wait_timeout(timeout_secs: u64) -> Self {
        Self::WaitTimeout { timeout_secs }
    }

    /// Creates a transport error with the given message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an I/O error with the given message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Submission(_) => "Submission Error",
            Self::ExecutionFailed { .. } => "Execution Failed",
            Self::WaitTimeout { .. } => "Wait Timeout",
            Self::Transport(_) => "Transport Error",
            Self::Config(_) => "Configuration Error",
            Self::Io(_) => "I/O Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns true if the remote execution may still be running.
    pub fn execution_may_continue(&self) -> bool {
        matches!(self, Self::WaitTimeout { .. })
    }
}

/// Result type alias using RunnerError.
pub type Result<T> = std::result::Result<T, RunnerError>;
