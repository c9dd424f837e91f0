//! Configuration management for the query runner.
//!
//! Handles loading configuration from a TOML file, with defaults for the
//! service endpoint and for every per-query setting the CLI can override.

use crate::error::{Result, RunnerError};
use crate::query::RunOptions;
use crate::service::{SubmitRequest, DEFAULT_MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Query service connection settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Defaults for each query run.
    #[serde(default)]
    pub query: QueryConfig,
}

/// Query service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Explicit endpoint URL; derived from `region` when absent.
    pub endpoint: Option<String>,

    /// Service region, used to build the default endpoint.
    #[serde(default = "default_region")]
    pub region: String,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: default_region(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ServiceConfig {
    /// Returns the endpoint to send requests to, validated as an http(s) URL.
    pub fn endpoint_url(&self) -> Result<Url> {
        let raw = match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://athena.{}.amazonaws.com", self.region),
        };

        let url = Url::parse(&raw)
            .map_err(|e| RunnerError::config(format!("Invalid endpoint '{raw}': {e}")))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(RunnerError::config(format!(
                "Invalid endpoint scheme '{}'. Expected 'http' or 'https'",
                url.scheme()
            )));
        }

        Ok(url)
    }
}

/// Per-query settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Target database (required at run time).
    pub database: Option<String>,

    /// Target data catalog.
    #[serde(default = "default_catalog")]
    pub catalog: String,

    /// Workgroup the query runs in.
    #[serde(default = "default_workgroup")]
    pub workgroup: String,

    /// Result storage override.
    pub output_location: Option<String>,

    /// Maximum number of rows a read query may return.
    #[serde(default = "default_row_limit")]
    pub row_limit: usize,

    /// How long to wait for the query to finish, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay between status polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Largest page the service returns, header row included.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

fn default_catalog() -> String {
    "AwsDataCatalog".to_string()
}

fn default_workgroup() -> String {
    "primary".to_string()
}

fn default_row_limit() -> usize {
    1000
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_page_size() -> usize {
    DEFAULT_MAX_PAGE_SIZE
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            database: None,
            catalog: default_catalog(),
            workgroup: default_workgroup(),
            output_location: None,
            row_limit: default_row_limit(),
            timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl QueryConfig {
    /// Checks that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        match self.database.as_deref().map(str::trim) {
            Some(db) if !db.is_empty() => {}
            _ => {
                return Err(RunnerError::config(
                    "Database is required (use --database or set query.database)",
                ))
            }
        }
        if self.catalog.trim().is_empty() {
            return Err(RunnerError::config("Catalog must not be empty"));
        }
        if self.workgroup.trim().is_empty() {
            return Err(RunnerError::config("Workgroup must not be empty"));
        }
        if self.row_limit == 0 {
            return Err(RunnerError::config("Row limit must be at least 1"));
        }
        if self.max_page_size < 2 {
            return Err(RunnerError::config(
                "Max page size must be at least 2 (header row plus one data row)",
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(RunnerError::config("Poll interval must be at least 1 ms"));
        }
        Ok(())
    }

    /// Builds the run options after validation.
    pub fn run_options(&self) -> Result<RunOptions> {
        self.validate()?;
        Ok(RunOptions {
            row_limit: self.row_limit,
            timeout: Duration::from_secs(self.timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_page_size: self.max_page_size,
        })
    }

    /// Builds a submit request for `sql` after validation.
    ///
    /// The statement is sent as given; limiting happens in the runner.
    pub fn submit_request(&self, sql: &str) -> Result<SubmitRequest> {
        self.validate()?;
        if sql.trim().is_empty() {
            return Err(RunnerError::config("SQL statement is empty"));
        }

        Ok(SubmitRequest {
            sql: sql.to_string(),
            database: self.database.clone().unwrap_or_default(),
            catalog: self.catalog.clone(),
            workgroup: self.workgroup.clone(),
            output_location: self.output_location.clone(),
        })
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("athena-query")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| RunnerError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            RunnerError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}
