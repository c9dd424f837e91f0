//! Query service abstraction.
//!
//! Provides a trait-based interface to the remote query-execution service,
//! allowing the HTTP backend and the scripted mock to be used interchangeably.

mod http;
mod mock;

pub use http::HttpQueryService;
pub use mock::{MockQueryService, PageRequest};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest page the service will return in one `fetch_page` call, header included.
pub const DEFAULT_MAX_PAGE_SIZE: usize = 1000;

/// Opaque identifier the service assigns to a submitted statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionHandle(String);

impl ExecutionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a submitted execution, as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl ExecutionState {
    /// Returns the wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a state from its wire name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "QUEUED" => Some(Self::Queued),
            "RUNNING" => Some(Self::Running),
            "SUCCEEDED" => Some(Self::Succeeded),
            "FAILED" => Some(Self::Failed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if the service will not move the execution out of this state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot of an execution's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionStatus {
    pub state: ExecutionState,

    /// Service-provided explanation, usually only set on FAILED/CANCELLED.
    pub reason: Option<String>,

    /// Bytes scanned, reported once the execution has succeeded.
    pub data_scanned_bytes: Option<u64>,

    /// Engine execution time in milliseconds.
    pub execution_time_ms: Option<u64>,
}

impl ExecutionStatus {
    /// Creates a status with no reason or statistics.
    pub fn new(state: ExecutionState) -> Self {
        Self {
            state,
            reason: None,
            data_scanned_bytes: None,
            execution_time_ms: None,
        }
    }

    /// Creates a SUCCEEDED status carrying scan statistics.
    pub fn succeeded(data_scanned_bytes: u64, execution_time_ms: u64) -> Self {
        Self {
            state: ExecutionState::Succeeded,
            reason: None,
            data_scanned_bytes: Some(data_scanned_bytes),
            execution_time_ms: Some(execution_time_ms),
        }
    }

    /// Creates a terminal failure status with the given reason.
    pub fn failed(state: ExecutionState, reason: impl Into<String>) -> Self {
        Self {
            state,
            reason: Some(reason.into()),
            data_scanned_bytes: None,
            execution_time_ms: None,
        }
    }
}

/// Everything the service needs to start an execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    /// Statement text exactly as it should run (already limited).
    pub sql: String,
    pub database: String,
    pub catalog: String,
    pub workgroup: String,
    /// Result storage override; the workgroup default is used when absent.
    pub output_location: Option<String>,
}

/// A single cell as delivered by the service; `None` means SQL NULL.
pub type Cell = Option<String>;

/// One page of raw rows.
///
/// On the first page of a result, `rows[0]` holds the column names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    pub rows: Vec<Vec<Cell>>,
    pub next_token: Option<String>,
}

impl ResultPage {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self {
            rows,
            next_token: None,
        }
    }

    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Trait defining the interface to the query-execution service.
///
/// Every call is a single request; implementations do not retry.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Starts executing a statement and returns its handle.
    async fn submit(&self, request: &SubmitRequest) -> Result<ExecutionHandle>;

    /// Returns the current status of an execution.
    async fn get_status(&self, handle: &ExecutionHandle) -> Result<ExecutionStatus>;

    /// Fetches up to `max_results` rows, continuing from `next_token` when given.
    ///
    /// The size is a request; the service may return fewer rows.
    async fn fetch_page(
        &self,
        handle: &ExecutionHandle,
        max_results: usize,
        next_token: Option<&str>,
    ) -> Result<ResultPage>;
}
