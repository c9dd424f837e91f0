//! Result materialization.
//!
//! Walks the result pages of a finished execution and turns them into row
//! objects, never holding more than the row limit and never asking for a
//! page once the limit is reached.

use std::sync::Arc;
use tracing::{debug, info};

use super::types::{ColumnSchema, RowObject};
use crate::error::Result;
use crate::service::{Cell, ExecutionHandle, QueryService, DEFAULT_MAX_PAGE_SIZE};

/// Fetches and converts the rows of one execution.
pub struct ResultMaterializer<'a> {
    service: &'a dyn QueryService,
    max_page_size: usize,
}

impl<'a> ResultMaterializer<'a> {
    pub fn new(service: &'a dyn QueryService) -> Self {
        Self {
            service,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    /// Sets the largest page size the service accepts.
    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size.max(1);
        self
    }

    /// Collects at most `row_limit` rows, in service order.
    ///
    /// The first page's first row is the header and is the only header read;
    /// the first request asks for one extra row to make room for it. An empty
    /// first page yields no rows.
    pub async fn materialize(
        &self,
        handle: &ExecutionHandle,
        row_limit: usize,
    ) -> Result<Vec<RowObject>> {
        let first_size = row_limit.saturating_add(1).min(self.max_page_size);
        let first = self.service.fetch_page(handle, first_size, None).await?;
        debug!(
            "Fetched first page: requested {}, got {} rows, more: {}",
            first_size,
            first.rows.len(),
            first.next_token.is_some()
        );

        let mut page_rows = first.rows.into_iter();
        let Some(header) = page_rows.next() else {
            info!("Query {} returned no rows", handle);
            return Ok(Vec::new());
        };

        let schema = Arc::new(ColumnSchema::from_header(header));
        let mut rows = Vec::with_capacity(row_limit.min(self.max_page_size));
        push_rows(&schema, page_rows, &mut rows, row_limit);

        let mut next_token = first.next_token;
        while rows.len() < row_limit {
            let Some(token) = next_token.take() else {
                break;
            };

            let size = (row_limit - rows.len()).min(self.max_page_size);
            let page = self.service.fetch_page(handle, size, Some(&token)).await?;
            debug!(
                "Fetched page: requested {}, got {} rows, more: {}",
                size,
                page.rows.len(),
                page.next_token.is_some()
            );

            push_rows(&schema, page.rows.into_iter(), &mut rows, row_limit);
            next_token = page.next_token;
        }

        info!("Query {} materialized {} rows", handle, rows.len());
        Ok(rows)
    }
}

/// Appends data rows until `row_limit` is reached.
fn push_rows(
    schema: &Arc<ColumnSchema>,
    data: impl Iterator<Item = Vec<Cell>>,
    rows: &mut Vec<RowObject>,
    row_limit: usize,
) {
    let room = row_limit.saturating_sub(rows.len());
    rows.extend(
        data.take(room)
            .map(|cells| RowObject::new(Arc::clone(schema), cells)),
    );
}
