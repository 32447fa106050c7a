//! Row cursor over a job's paginated results
//!
//! The result schema only becomes known once the first page has been
//! fetched, so asking for column metadata before reading any row pulls one
//! row ahead. That row (or the error the pull produced) is buffered and
//! replayed to the next call to [`Rows::next`], which keeps the lookahead
//! invisible to the consumer.

use std::sync::Arc;
use tracing::debug;

use crate::client::RowSource;
use crate::column::ColumnType;
use crate::context::Context;
use crate::convert::convert_row;
use crate::error::Result;
use crate::types::{FieldSchema, RawValue, Row};

type Pulled = Result<Option<Vec<RawValue>>>;

/// Cursor over the rows of one query
pub struct Rows {
    source: Option<Box<dyn RowSource>>,
    ctx: Context,
    pulled: bool,
    lookahead: Option<Pulled>,
    columns: Option<Arc<[String]>>,
    exhausted: bool,
    closed: bool,
}

impl Rows {
    /// Cursor that yields nothing (dry runs)
    pub fn empty() -> Self {
        Self {
            source: None,
            ctx: Context::background(),
            pulled: true,
            lookahead: None,
            columns: None,
            exhausted: true,
            closed: false,
        }
    }

    /// Wrap a row source; page pulls run under `ctx`
    pub fn new(source: Box<dyn RowSource>, ctx: Context) -> Self {
        Self {
            source: Some(source),
            ctx,
            pulled: false,
            lookahead: None,
            columns: None,
            exhausted: false,
            closed: false,
        }
    }

    /// Pull once so the schema is available, buffering what was pulled
    async fn prime(&mut self) {
        if self.pulled || self.closed {
            return;
        }
        self.pulled = true;
        if let Some(source) = self.source.as_mut() {
            let pulled = self.ctx.run(source.next_row()).await;
            self.lookahead = Some(pulled);
        }
    }

    /// Result schema
    pub async fn schema(&mut self) -> &[FieldSchema] {
        self.prime().await;
        match &self.source {
            Some(source) => source.schema(),
            None => &[],
        }
    }

    /// Column names in schema order
    pub async fn columns(&mut self) -> Arc<[String]> {
        self.prime().await;
        self.column_names()
    }

    /// Type metadata of every column
    pub async fn column_types(&mut self) -> Vec<ColumnType> {
        self.schema()
            .await
            .iter()
            .map(ColumnType::from_field)
            .collect()
    }

    /// Column names; cached only once the source has reported a schema
    fn column_names(&mut self) -> Arc<[String]> {
        if let Some(columns) = &self.columns {
            return columns.clone();
        }
        let Some(source) = self.source.as_ref() else {
            return Arc::from(Vec::new());
        };
        let columns: Arc<[String]> = source.schema().iter().map(|f| f.name.clone()).collect();
        if !columns.is_empty() {
            self.columns = Some(columns.clone());
        }
        columns
    }

    /// Next row, or `None` once the results are exhausted.
    ///
    /// A row whose cells fail to convert is consumed and the conversion error
    /// returned; the following call continues with the next row.
    pub async fn next(&mut self) -> Result<Option<Row>> {
        if self.closed || self.exhausted {
            return Ok(None);
        }

        let pulled = match self.lookahead.take() {
            Some(buffered) => buffered,
            None => match self.source.as_mut() {
                Some(source) => self.ctx.run(source.next_row()).await,
                None => Ok(None),
            },
        };
        self.pulled = true;

        let Some(values) = pulled? else {
            self.exhausted = true;
            return Ok(None);
        };

        let schema = match &self.source {
            Some(source) => source.schema(),
            None => &[],
        };
        let values = convert_row(schema, values)?;
        let columns = self.column_names();
        Ok(Some(Row::new(columns, values)))
    }

    /// Collect every remaining row
    pub async fn collect(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Total rows reported by the service
    pub fn total_rows(&self) -> u64 {
        self.source.as_ref().map_or(0, |s| s.total_rows())
    }

    /// Drain the remaining pages and release the source. Errors while
    /// draining are dropped. Calling close again is a no-op.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.lookahead = None;

        let Some(mut source) = self.source.take() else {
            return Ok(());
        };
        if self.exhausted {
            return Ok(());
        }

        let mut drained = 0_u64;
        loop {
            match self.ctx.run(source.next_row()).await {
                Ok(Some(_)) => drained += 1,
                Ok(None) => break,
                Err(e) => {
                    debug!(error = %e, "Stopped draining result rows");
                    break;
                }
            }
        }
        self.exhausted = true;
        debug!(drained, "Closed row cursor");
        Ok(())
    }

    /// Whether the cursor has been closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl std::fmt::Debug for Rows {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rows")
            .field("pulled", &self.pulled)
            .field("buffered", &self.lookahead.is_some())
            .field("exhausted", &self.exhausted)
            .field("closed", &self.closed)
            .finish()
    }
}
