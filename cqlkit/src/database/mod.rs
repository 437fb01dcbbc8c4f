pub mod scylla;
pub mod memory;
pub mod query_builder;
pub mod factory;

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::errors::CassError;
use crate::statement::Statement;
use crate::types::Row;

pub use self::scylla::ScyllaDriver;
pub use memory::MemoryDriver;
pub use query_builder::QueryBuilder;
pub use factory::{DatabaseDriver, DriverFactory};

/// The native driver underneath a [`Session`](crate::Session).
///
/// Awaiting `execute` is the wait on the execution future; the future and
/// the statement are released when the call returns.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn execute(&self, statement: &Statement) -> Result<Box<dyn ResultSet>, CassError>;
    async fn health_check(&self) -> Result<(), CassError>;
    fn driver_name(&self) -> &str;
}

/// A driver-owned result. Dropping it finalizes it.
pub trait ResultSet: Send {
    /// Advance to the next row. `None` once the rows are exhausted, or an
    /// error when the driver fails to produce the row.
    fn next_row(&mut self) -> Option<Result<Row, CassError>>;

    fn column_names(&self) -> &[String];
}

/// Rows already materialized by the driver.
#[derive(Debug, Default)]
pub struct BufferedResultSet {
    columns: Vec<String>,
    rows: VecDeque<Result<Row, CassError>>,
}

impl BufferedResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Result<Row, CassError>>) -> Self {
        Self {
            columns,
            rows: rows.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl ResultSet for BufferedResultSet {
    fn next_row(&mut self) -> Option<Result<Row, CassError>> {
        self.rows.pop_front()
    }

    fn column_names(&self) -> &[String] {
        &self.columns
    }
}
