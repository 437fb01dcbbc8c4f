use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{BufferedResultSet, Driver, ResultSet};
use crate::errors::CassError;
use crate::statement::Statement;
use crate::types::Row;

#[derive(Debug, Clone)]
enum Response {
    Rows {
        columns: Vec<String>,
        rows: Vec<Result<Row, CassError>>,
    },
    Error(CassError),
}

/// In-process driver answering statements from a script.
///
/// Statements with no scripted response succeed with zero rows. Every
/// statement that reaches the driver is recorded, so callers can assert on
/// what was (or was not) sent.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    responses: Mutex<HashMap<String, Response>>,
    executed: Mutex<Vec<Statement>>,
    healthy: Mutex<bool>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self {
            healthy: Mutex::new(true),
            ..Default::default()
        }
    }

    /// Answer `text` with `rows`.
    pub fn with_rows(self, text: &str, columns: &[&str], rows: Vec<Row>) -> Self {
        self.with_row_results(text, columns, rows.into_iter().map(Ok).collect())
    }

    /// Answer `text` with rows some of which fail to decode.
    pub fn with_row_results(
        self,
        text: &str,
        columns: &[&str],
        rows: Vec<Result<Row, CassError>>,
    ) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|r| {
                r.map(|row| Row {
                    columns: columns.clone(),
                    values: row.values,
                })
            })
            .collect();
        self.responses
            .lock()
            .insert(text.to_string(), Response::Rows { columns, rows });
        self
    }

    /// Fail every execution of `text` with `err`.
    pub fn with_error(self, text: &str, err: CassError) -> Self {
        self.responses
            .lock()
            .insert(text.to_string(), Response::Error(err));
        self
    }

    pub fn set_healthy(&self, healthy: bool) {
        *self.healthy.lock() = healthy;
    }

    pub fn executed(&self) -> Vec<Statement> {
        self.executed.lock().clone()
    }

    pub fn execution_count(&self) -> usize {
        self.executed.lock().len()
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn execute(&self, statement: &Statement) -> Result<Box<dyn ResultSet>, CassError> {
        self.executed.lock().push(statement.clone());

        let response = self.responses.lock().get(statement.text()).cloned();
        match response {
            Some(Response::Rows { columns, rows }) => {
                Ok(Box::new(BufferedResultSet::new(columns, rows)))
            }
            Some(Response::Error(err)) => Err(err),
            None => Ok(Box::new(BufferedResultSet::empty())),
        }
    }

    async fn health_check(&self) -> Result<(), CassError> {
        if *self.healthy.lock() {
            Ok(())
        } else {
            Err(CassError::NoConnections)
        }
    }

    fn driver_name(&self) -> &str {
        "memory"
    }
}
