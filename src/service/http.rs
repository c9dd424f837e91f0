//! HTTP query service implementation.
//!
//! Implements the QueryService trait over the Athena JSON 1.1 protocol
//! (`StartQueryExecution`, `GetQueryExecution`, `GetQueryResults`).
//! Requests are not signed; point the endpoint at an Athena-compatible
//! service or a signing proxy.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{
    Cell, ExecutionHandle, ExecutionState, ExecutionStatus, QueryService, ResultPage,
    SubmitRequest,
};
use crate::config::ServiceConfig;
use crate::error::{Result, RunnerError};

/// Content type of the Athena JSON protocol.
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Prefix of the `X-Amz-Target` header value.
const TARGET_PREFIX: &str = "AmazonAthena";

/// Error types that mean the statement or its target was rejected.
const SUBMISSION_ERROR_TYPES: &[&str] = &["InvalidRequestException", "ResourceNotFoundException"];

/// Query service client speaking the Athena JSON protocol over HTTP.
#[derive(Debug, Clone)]
pub struct HttpQueryService {
    endpoint: Url,
    client: Client,
}

impl HttpQueryService {
    /// Creates a new client for the configured endpoint.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let endpoint = config.endpoint_url()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RunnerError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { endpoint, client })
    }

    /// Returns the endpoint requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends one protocol call and decodes the response body.
    ///
    /// Returns the HTTP status and raw body on failure so the caller can
    /// decide how to classify the error.
    async fn call<Req, Resp>(
        &self,
        operation: &str,
        request: &Req,
    ) -> std::result::Result<Resp, CallError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        debug!("{} request to {}", operation, self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", format!("{}.{}", TARGET_PREFIX, operation))
            .json(request)
            .send()
            .await
            .map_err(|e| CallError::Request(format!("{} request failed: {}", operation, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| {
                CallError::Request(format!("Failed to read {} response: {}", operation, e))
            })?;

        if !status.is_success() {
            return Err(CallError::Status { status, body });
        }

        serde_json::from_str(&body).map_err(|e| {
            CallError::Request(format!("Failed to parse {} response: {}", operation, e))
        })
    }
}

/// Failure of a single protocol call, before classification.
#[derive(Debug)]
enum CallError {
    Request(String),
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl CallError {
    /// Classifies every failure as a transport error.
    fn into_transport(self, operation: &str) -> RunnerError {
        match self {
            Self::Request(msg) => RunnerError::transport(msg),
            Self::Status { status, body } => {
                let (_, message) = parse_error_body(&body);
                RunnerError::transport(format!("{} failed ({}): {}", operation, status, message))
            }
        }
    }

    /// Classifies a rejected statement or target as a submission error.
    fn into_submission(self) -> RunnerError {
        match self {
            Self::Status { status, body } if status.is_client_error() => {
                let (error_type, message) = parse_error_body(&body);
                if SUBMISSION_ERROR_TYPES.contains(&error_type.as_str()) {
                    RunnerError::submission(message)
                } else {
                    Self::Status { status, body }.into_transport("StartQueryExecution")
                }
            }
            other => other.into_transport("StartQueryExecution"),
        }
    }
}

/// Extracts (error type, message) from an error response body.
///
/// The type may arrive namespaced (`com.amazonaws...#InvalidRequestException`);
/// only the part after `#` is kept. Unparseable bodies are returned verbatim.
fn parse_error_body(body: &str) -> (String, String) {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => {
            let error_type = err
                .error_type
                .as_deref()
                .map(|t| t.rsplit('#').next().unwrap_or(t).to_string())
                .unwrap_or_default();
            let message = err
                .message
                .or(err.message_lower)
                .unwrap_or_else(|| body.to_string());
            (error_type, message)
        }
        Err(_) => (String::new(), body.to_string()),
    }
}

#[async_trait]
impl QueryService for HttpQueryService {
    async fn submit(&self, request: &SubmitRequest) -> Result<ExecutionHandle> {
        let body = StartQueryExecutionRequest {
            query_string: &request.sql,
            query_execution_context: QueryExecutionContext {
                database: &request.database,
                catalog: &request.catalog,
            },
            work_group: &request.workgroup,
            result_configuration: request
                .output_location
                .as_deref()
                .map(|location| ResultConfiguration {
                    output_location: location,
                }),
        };

        let response: StartQueryExecutionResponse = self
            .call("StartQueryExecution", &body)
            .await
            .map_err(CallError::into_submission)?;

        Ok(ExecutionHandle::new(response.query_execution_id))
    }

    async fn get_status(&self, handle: &ExecutionHandle) -> Result<ExecutionStatus> {
        let body = QueryExecutionIdRequest {
            query_execution_id: handle.as_str(),
        };

        let response: GetQueryExecutionResponse = self
            .call("GetQueryExecution", &body)
            .await
            .map_err(|e| e.into_transport("GetQueryExecution"))?;

        response.query_execution.into_status()
    }

    async fn fetch_page(
        &self,
        handle: &ExecutionHandle,
        max_results: usize,
        next_token: Option<&str>,
    ) -> Result<ResultPage> {
        let body = GetQueryResultsRequest {
            query_execution_id: handle.as_str(),
            max_results,
            next_token,
        };

        let response: GetQueryResultsResponse = self
            .call("GetQueryResults", &body)
            .await
            .map_err(|e| e.into_transport("GetQueryResults"))?;

        Ok(response.into_page())
    }
}

// Athena JSON protocol types

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct StartQueryExecutionRequest<'a> {
    query_string: &'a str,
    query_execution_context: QueryExecutionContext<'a>,
    work_group: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result_configuration: Option<ResultConfiguration<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecutionContext<'a> {
    database: &'a str,
    catalog: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ResultConfiguration<'a> {
    output_location: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StartQueryExecutionResponse {
    query_execution_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecutionIdRequest<'a> {
    query_execution_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetQueryExecutionResponse {
    query_execution: QueryExecution,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecution {
    status: QueryExecutionStatus,
    #[serde(default)]
    statistics: Option<QueryExecutionStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecutionStatus {
    state: String,
    #[serde(default)]
    state_change_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct QueryExecutionStatistics {
    #[serde(default)]
    data_scanned_in_bytes: Option<u64>,
    #[serde(default)]
    engine_execution_time_in_millis: Option<u64>,
}

impl QueryExecution {
    fn into_status(self) -> Result<ExecutionStatus> {
        let state = ExecutionState::parse(&self.status.state).ok_or_else(|| {
            RunnerError::transport(format!(
                "Unknown execution state '{}'",
                self.status.state
            ))
        })?;
        let statistics = self.statistics.unwrap_or_default();

        Ok(ExecutionStatus {
            state,
            reason: self.status.state_change_reason,
            data_scanned_bytes: statistics.data_scanned_in_bytes,
            execution_time_ms: statistics.engine_execution_time_in_millis,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct GetQueryResultsRequest<'a> {
    query_execution_id: &'a str,
    max_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetQueryResultsResponse {
    result_set: WireResultSet,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireResultSet {
    #[serde(default)]
    rows: Vec<WireRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireRow {
    #[serde(default)]
    data: Vec<WireDatum>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireDatum {
    #[serde(default)]
    var_char_value: Option<String>,
}

impl GetQueryResultsResponse {
    fn into_page(self) -> ResultPage {
        let rows = self
            .result_set
            .rows
            .into_iter()
            .map(|row| row.data.into_iter().map(|d| d.var_char_value).collect::<Vec<Cell>>())
            .collect();

        ResultPage {
            rows,
            next_token: self.next_token.filter(|t| !t.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "__type", default)]
    error_type: Option<String>,
    #[serde(rename = "Message", default)]
    message: Option<String>,
    #[serde(rename = "message", default)]
    message_lower: Option<String>,
}
