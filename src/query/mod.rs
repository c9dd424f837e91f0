//! Query lifecycle for the runner.
//!
//! This module isolates waiting, result materialization and the run
//! orchestration from the binary and the service backends.

pub mod materializer;
pub mod runner;
pub mod types;
pub mod waiter;

pub use materializer::ResultMaterializer;
pub use runner::QueryRunner;
pub use types::{ColumnSchema, RowObject, RunOptions, RunOutcome};
pub use waiter::{ExecutionWaiter, DEFAULT_POLL_INTERVAL};
