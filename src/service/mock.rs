//! Mock query service for testing.
//!
//! Replays scripted statuses and pages and records every call, so the
//! orchestrator can be exercised without a network.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{
    ExecutionHandle, ExecutionState, ExecutionStatus, QueryService, ResultPage, SubmitRequest,
};
use crate::error::{Result, RunnerError};

/// A recorded `fetch_page` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub max_results: usize,
    pub next_token: Option<String>,
}

#[derive(Debug, Default)]
struct Calls {
    submitted: Vec<SubmitRequest>,
    status_calls: usize,
    page_requests: Vec<PageRequest>,
}

/// A query service that returns predefined responses.
///
/// Statuses are consumed in order; the last one repeats forever. Pages are
/// consumed in order; once exhausted, empty pages are returned.
#[derive(Debug)]
pub struct MockQueryService {
    execution_id: String,
    statuses: Mutex<VecDeque<ExecutionStatus>>,
    pages: Mutex<VecDeque<ResultPage>>,
    submit_error: Option<String>,
    transport_error: Option<String>,
    calls: Mutex<Calls>,
}

impl MockQueryService {
    /// Creates a mock that succeeds immediately and returns no rows.
    pub fn new() -> Self {
        Self {
            execution_id: "mock-execution-1".to_string(),
            statuses: Mutex::new(VecDeque::from([ExecutionStatus::succeeded(0, 0)])),
            pages: Mutex::new(VecDeque::new()),
            submit_error: None,
            transport_error: None,
            calls: Mutex::new(Calls::default()),
        }
    }

    /// Sets the execution id returned by `submit`.
    pub fn with_execution_id(mut self, id: impl Into<String>) -> Self {
        self.execution_id = id.into();
        self
    }

    /// Replaces the status script.
    pub fn with_statuses(self, statuses: Vec<ExecutionStatus>) -> Self {
        *lock(&self.statuses) = statuses.into();
        self
    }

    /// Reports `running` non-terminal polls, then the given final status.
    pub fn with_running_then(self, running: usize, last: ExecutionStatus) -> Self {
        let mut statuses = vec![ExecutionStatus::new(ExecutionState::Running); running];
        statuses.push(last);
        self.with_statuses(statuses)
    }

    /// Replaces the page script.
    pub fn with_pages(self, pages: Vec<ResultPage>) -> Self {
        *lock(&self.pages) = pages.into();
        self
    }

    /// Makes `submit` reject every statement with the given message.
    pub fn rejecting_submit(mut self, message: impl Into<String>) -> Self {
        self.submit_error = Some(message.into());
        self
    }

    /// Makes every call fail at the transport level.
    pub fn failing_transport(mut self, message: impl Into<String>) -> Self {
        self.transport_error = Some(message.into());
        self
    }

    /// Returns the statement texts submitted so far.
    pub fn submitted_sql(&self) -> Vec<String> {
        lock(&self.calls)
            .submitted
            .iter()
            .map(|r| r.sql.clone())
            .collect()
    }

    /// Returns the full submit requests received so far.
    pub fn submitted_requests(&self) -> Vec<SubmitRequest> {
        lock(&self.calls).submitted.clone()
    }

    /// Returns how many times `get_status` was called.
    pub fn status_calls(&self) -> usize {
        lock(&self.calls).status_calls
    }

    /// Returns the `fetch_page` calls received so far, in order.
    pub fn page_requests(&self) -> Vec<PageRequest> {
        lock(&self.calls).page_requests.clone()
    }

    fn check_transport(&self) -> Result<()> {
        match &self.transport_error {
            Some(msg) => Err(RunnerError::transport(msg.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MockQueryService {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl QueryService for MockQueryService {
    async fn submit(&self, request: &SubmitRequest) -> Result<ExecutionHandle> {
        lock(&self.calls).submitted.push(request.clone());
        self.check_transport()?;

        if let Some(msg) = &self.submit_error {
            return Err(RunnerError::submission(msg.clone()));
        }

        Ok(ExecutionHandle::new(self.execution_id.clone()))
    }

    async fn get_status(&self, _handle: &ExecutionHandle) -> Result<ExecutionStatus> {
        lock(&self.calls).status_calls += 1;
        self.check_transport()?;

        let mut statuses = lock(&self.statuses);
        let status = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        status.ok_or_else(|| RunnerError::internal("mock has no scripted status"))
    }

    async fn fetch_page(
        &self,
        _handle: &ExecutionHandle,
        max_results: usize,
        next_token: Option<&str>,
    ) -> Result<ResultPage> {
        lock(&self.calls).page_requests.push(PageRequest {
            max_results,
            next_token: next_token.map(String::from),
        });
        self.check_transport()?;

        Ok(lock(&self.pages).pop_front().unwrap_or_default())
    }
}
