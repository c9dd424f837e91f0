//! Query safety module.
//!
//! Classifies statements as reads or everything else and bounds reads with a
//! trailing row ceiling before they are submitted.

mod limit;

pub use limit::{classify_statement, enforce_limit};

use std::fmt;

/// Lexical classification of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// Starts with `SELECT`; gets a row ceiling.
    Read,
    /// Anything else (DDL, DML, `WITH`, empty); passed through untouched.
    Other,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// What the enforcer did to the statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitAction {
    /// Nothing beyond trimming.
    Unchanged,
    /// No trailing ceiling existed; one was appended.
    Appended,
    /// The trailing ceiling was above the row limit and was lowered.
    Reduced {
        /// The ceiling literal as written in the statement.
        original: String,
    },
}

/// A statement that is safe to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitedStatement {
    /// Text to send to the service.
    pub sql: String,
    pub kind: StatementKind,
    pub action: LimitAction,
}

impl LimitedStatement {
    /// Returns a warning for the caller when an existing ceiling was lowered.
    pub fn warning(&self) -> Option<String> {
        match &self.action {
            LimitAction::Reduced { original } => Some(format!(
                "LIMIT {original} exceeded the row limit and was reduced"
            )),
            _ => None,
        }
    }
}
