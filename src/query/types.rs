//! Result types produced by a query run.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::service::{Cell, ExecutionHandle, ExecutionState};

/// Ordered column names, taken from the header row of the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    names: Vec<String>,
}

impl ColumnSchema {
    /// Builds a schema from a header row. A null header cell becomes an empty name.
    pub fn from_header(header: Vec<Cell>) -> Self {
        Self {
            names: header.into_iter().map(Option::unwrap_or_default).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

/// One result row, keyed by column name.
///
/// Every column of the schema is present; a cell the row did not carry is null.
/// Serializes as a JSON object with keys in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowObject {
    schema: Arc<ColumnSchema>,
    values: Vec<Cell>,
}

impl RowObject {
    /// Zips `cells` against `schema` by position.
    ///
    /// Missing trailing cells become null; cells beyond the schema are dropped.
    pub fn new(schema: Arc<ColumnSchema>, mut cells: Vec<Cell>) -> Self {
        cells.resize(schema.len(), None);
        Self {
            schema,
            values: cells,
        }
    }

    /// Returns the value of a column: `None` if there is no such column,
    /// `Some(None)` if the value is null.
    pub fn get(&self, column: &str) -> Option<Option<&str>> {
        self.schema
            .position(column)
            .map(|i| self.values[i].as_deref())
    }

    /// Iterates over `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.schema
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Option::as_deref))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for RowObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Everything a successful run reports back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub query_execution_id: ExecutionHandle,
    pub state: ExecutionState,
    /// The statement exactly as submitted, after limiting.
    pub submitted_sql: String,
    pub data_scanned_bytes: u64,
    pub execution_time_ms: u64,
    pub row_count: usize,
    pub rows: Vec<RowObject>,
}

/// Settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Maximum rows a read statement may return.
    pub row_limit: usize,
    /// How long to wait for the execution to finish.
    pub timeout: Duration,
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Largest page the service returns, header row included.
    pub max_page_size: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            row_limit: 1000,
            timeout: Duration::from_secs(300),
            poll_interval: super::waiter::DEFAULT_POLL_INTERVAL,
            max_page_size: crate::service::DEFAULT_MAX_PAGE_SIZE,
        }
    }
}
