//! Query run orchestration.
//!
//! Limits the statement, submits it, waits for completion and materializes
//! the bounded result. Each step runs only after the previous one succeeded;
//! any error ends the run with no partial result.

use tracing::{info, warn};

use super::materializer::ResultMaterializer;
use super::types::{RunOptions, RunOutcome};
use super::waiter::ExecutionWaiter;
use crate::error::Result;
use crate::safety::enforce_limit;
use crate::service::{QueryService, SubmitRequest};

/// Runs statements against a query service.
///
/// Holds no per-run state: the handle, schema and rows of a run live only
/// inside [`QueryRunner::run`].
pub struct QueryRunner<'a> {
    service: &'a dyn QueryService,
    options: RunOptions,
}

impl<'a> QueryRunner<'a> {
    /// Creates a new query runner.
    pub fn new(service: &'a dyn QueryService, options: RunOptions) -> Self {
        Self { service, options }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Runs `request` to completion.
    ///
    /// `request.sql` is the raw statement; the text actually submitted is the
    /// limited form, reported back in [`RunOutcome::submitted_sql`].
    pub async fn run(&self, request: &SubmitRequest) -> Result<RunOutcome> {
        let limited = enforce_limit(&request.sql, self.options.row_limit);
        if let Some(warning) = limited.warning() {
            warn!("{}", warning);
        }

        let submit = SubmitRequest {
            sql: limited.sql,
            ..request.clone()
        };
        let handle = self.service.submit(&submit).await?;
        info!(
            "Submitted query {} to {}.{} in workgroup {}",
            handle, submit.catalog, submit.database, submit.workgroup
        );

        let status = ExecutionWaiter::new(self.service)
            .with_poll_interval(self.options.poll_interval)
            .wait(&handle, self.options.timeout)
            .await?;

        let rows = ResultMaterializer::new(self.service)
            .with_max_page_size(self.options.max_page_size)
            .materialize(&handle, self.options.row_limit)
            .await?;

        Ok(RunOutcome {
            query_execution_id: handle,
            state: status.state,
            submitted_sql: submit.sql,
            data_scanned_bytes: status.data_scanned_bytes.unwrap_or(0),
            execution_time_ms: status.execution_time_ms.unwrap_or(0),
            row_count: rows.len(),
            rows,
        })
    }
}
