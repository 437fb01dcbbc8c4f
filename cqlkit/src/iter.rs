use tracing::debug;

use crate::database::ResultSet;
use crate::decode::FromRow;
use crate::errors::CassError;

/// Outcome of advancing an [`Iter`] by one row.
#[derive(Debug, PartialEq)]
pub enum ScanStep<T> {
    Row(T),
    Exhausted,
    Failed,
}

/// Cursor over the rows returned by a query.
///
/// `scan` returns `None` both when the rows run out and when a row fails;
/// the difference is only visible through [`Iter::close`] (or
/// [`Iter::next_step`], which reports it directly).
pub struct Iter {
    err: Option<CassError>,
    result: Option<Box<dyn ResultSet>>,
}

impl Iter {
    pub(crate) fn new(result: Box<dyn ResultSet>) -> Self {
        Self {
            err: None,
            result: Some(result),
        }
    }

    /// An iterator that carries only an error and never yields rows.
    pub(crate) fn failed(err: CassError) -> Self {
        Self {
            err: Some(err),
            result: None,
        }
    }

    /// Advance one row and decode it into `T`.
    pub fn scan<T: FromRow>(&mut self) -> Option<T> {
        match self.next_step() {
            ScanStep::Row(row) => Some(row),
            ScanStep::Exhausted | ScanStep::Failed => None,
        }
    }

    /// Advance one row, telling exhaustion and failure apart. A failure is
    /// also stored and returned again by `close`.
    pub fn next_step<T: FromRow>(&mut self) -> ScanStep<T> {
        if self.err.is_some() {
            return ScanStep::Failed;
        }
        let Some(result) = self.result.as_mut() else {
            return ScanStep::Exhausted;
        };

        match result.next_row() {
            None => ScanStep::Exhausted,
            Some(row) => match row.and_then(T::from_row) {
                Ok(decoded) => ScanStep::Row(decoded),
                Err(e) => {
                    debug!("Row scan failed: {}", e);
                    self.err = Some(e);
                    ScanStep::Failed
                }
            },
        }
    }

    /// Column names of the result, empty when the query failed.
    pub fn columns(&self) -> &[String] {
        self.result
            .as_ref()
            .map(|r| r.column_names())
            .unwrap_or(&[])
    }

    /// The stored error, if any, without closing the iterator.
    pub fn err(&self) -> Option<&CassError> {
        self.err.as_ref()
    }

    /// Release the result. Returns the stored error if one occurred while
    /// executing or scanning.
    pub fn close(mut self) -> Result<(), CassError> {
        if let Some(err) = self.err.take() {
            return Err(err);
        }
        self.result.take();
        Ok(())
    }

    /// Drain the remaining rows into a vector, then close.
    pub fn collect_rows<T: FromRow>(mut self) -> Result<Vec<T>, CassError> {
        let mut rows = Vec::new();
        while let Some(row) = self.scan() {
            rows.push(row);
        }
        self.close()?;
        Ok(rows)
    }
}

impl Drop for Iter {
    fn drop(&mut self) {
        if self.result.is_some() {
            debug!("Iter dropped without close, releasing result");
        }
    }
}
