//! Command-line argument parsing.
//!
//! Uses clap to parse CLI arguments; every query setting can also come from
//! an environment variable.

use athena_query_runner::config::{Config, QueryConfig, ServiceConfig};
use athena_query_runner::error::{Result, RunnerError};
use athena_query_runner::output::OutputFormat;
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;

/// Run a SQL statement on Athena with a row ceiling and print the result.
#[derive(Parser, Debug)]
#[command(name = "athena-query")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQL statement to run
    #[arg(value_name = "SQL", conflicts_with = "file")]
    pub sql: Option<String>,

    /// Read the SQL statement from a file (use "-" for stdin)
    #[arg(short = 'f', long, value_name = "PATH")]
    pub file: Option<String>,

    /// Target database
    #[arg(short = 'd', long, value_name = "DATABASE", env = "ATHENA_DATABASE")]
    pub database: Option<String>,

    /// Target data catalog [default: AwsDataCatalog]
    #[arg(long, value_name = "CATALOG", env = "ATHENA_CATALOG")]
    pub catalog: Option<String>,

    /// Workgroup to run in [default: primary]
    #[arg(short = 'w', long, value_name = "WORKGROUP", env = "ATHENA_WORKGROUP")]
    pub workgroup: Option<String>,

    /// Result storage location override (e.g., s3://bucket/prefix/)
    #[arg(long, value_name = "URI", env = "ATHENA_OUTPUT_LOCATION")]
    pub output_location: Option<String>,

    /// Maximum rows a SELECT may return [default: 1000]
    #[arg(short = 'n', long, value_name = "ROWS", env = "ATHENA_ROW_LIMIT")]
    pub row_limit: Option<usize>,

    /// Seconds to wait for the query to finish [default: 300]
    #[arg(short = 't', long, value_name = "SECONDS", env = "ATHENA_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Milliseconds between status polls [default: 1000]
    #[arg(long, value_name = "MS", env = "ATHENA_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Service endpoint URL (defaults to the regional Athena endpoint)
    #[arg(long, value_name = "URL", env = "ATHENA_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Service region [default: us-east-1]
    #[arg(long, value_name = "REGION", env = "AWS_REGION")]
    pub region: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format: json or ndjson
    #[arg(short = 'o', long, value_name = "FORMAT", default_value = "json")]
    pub output: String,

    /// Write output to file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Applies CLI arguments on top of the file configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        self.apply_service_overrides(&mut config.service);
        self.apply_query_overrides(&mut config.query);
    }

    fn apply_service_overrides(&self, service: &mut ServiceConfig) {
        if self.endpoint.is_some() {
            service.endpoint = self.endpoint.clone();
        }
        if let Some(region) = &self.region {
            service.region = region.clone();
        }
    }

    fn apply_query_overrides(&self, query: &mut QueryConfig) {
        if self.database.is_some() {
            query.database = self.database.clone();
        }
        if let Some(catalog) = &self.catalog {
            query.catalog = catalog.clone();
        }
        if let Some(workgroup) = &self.workgroup {
            query.workgroup = workgroup.clone();
        }
        if self.output_location.is_some() {
            query.output_location = self.output_location.clone();
        }
        if let Some(row_limit) = self.row_limit {
            query.row_limit = row_limit;
        }
        if let Some(timeout) = self.timeout {
            query.timeout_secs = timeout;
        }
        if let Some(poll_interval_ms) = self.poll_interval_ms {
            query.poll_interval_ms = poll_interval_ms;
        }
    }

    /// Returns the SQL statement from the argument, a file, or stdin.
    pub fn read_sql(&self) -> Result<String> {
        if let Some(sql) = &self.sql {
            return Ok(sql.clone());
        }

        match self.file.as_deref() {
            Some("-") => {
                let mut sql = String::new();
                std::io::stdin()
                    .read_to_string(&mut sql)
                    .map_err(|e| RunnerError::io(format!("Failed to read SQL from stdin: {e}")))?;
                Ok(sql)
            }
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| RunnerError::io(format!("Failed to read SQL file '{path}': {e}"))),
            None => Err(RunnerError::config(
                "No SQL statement given. Pass it as an argument or use --file",
            )),
        }
    }

    /// Parses the output format from the --output argument.
    pub fn output_format(&self) -> Result<OutputFormat> {
        self.output.parse().map_err(RunnerError::config)
    }
}
