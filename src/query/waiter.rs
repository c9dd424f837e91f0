//! Execution waiting.
//!
//! Polls the service until the execution reaches a terminal state or the
//! deadline passes. The deadline is measured on a monotonic clock from the
//! moment waiting starts, so slow status calls count against it.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{Result, RunnerError};
use crate::service::{ExecutionHandle, ExecutionState, ExecutionStatus, QueryService};

/// Delay between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Waits for a single execution to finish.
pub struct ExecutionWaiter<'a> {
    service: &'a dyn QueryService,
    poll_interval: Duration,
}

impl<'a> ExecutionWaiter<'a> {
    /// Creates a waiter that polls at the default interval.
    pub fn new(service: &'a dyn QueryService) -> Self {
        Self {
            service,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Sets the delay between polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Polls until the execution succeeds, fails, or `timeout` elapses.
    ///
    /// Returns the first SUCCEEDED status observed. FAILED and CANCELLED end
    /// the wait immediately with [`RunnerError::ExecutionFailed`]; running
    /// past `timeout` ends it with [`RunnerError::WaitTimeout`] and issues no
    /// further polls. Transport errors from a poll are returned as-is.
    pub async fn wait(
        &self,
        handle: &ExecutionHandle,
        timeout: Duration,
    ) -> Result<ExecutionStatus> {
        let started = Instant::now();

        loop {
            let status = self.service.get_status(handle).await?;
            let elapsed = started.elapsed();

            match status.state {
                ExecutionState::Succeeded => {
                    info!(
                        "Query {} succeeded (scanned {} bytes, engine time {} ms)",
                        handle,
                        status.data_scanned_bytes.unwrap_or(0),
                        status.execution_time_ms.unwrap_or(0)
                    );
                    return Ok(status);
                }
                ExecutionState::Failed | ExecutionState::Cancelled => {
                    return Err(RunnerError::execution_failed(
                        status.state,
                        status.reason.as_deref(),
                    ));
                }
                ExecutionState::Queued | ExecutionState::Running => {
                    debug!("Query {} is {} after {:?}", handle, status.state, elapsed);
                }
            }

            if elapsed > timeout {
                return Err(RunnerError::wait_timeout(timeout.as_secs()));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
