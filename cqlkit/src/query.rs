use std::time::Duration;

use tracing::warn;

use crate::consistency::{Consistency, SerialConsistency};
use crate::errors::CassError;
use crate::iter::Iter;
use crate::metrics;
use crate::session::Session;
use crate::statement::{QueryOptions, Statement};
use crate::types::Value;

/// A statement template with its values and options, tied to the session
/// that will run it.
#[derive(Clone)]
pub struct Query<'s> {
    stmt: String,
    values: Vec<Value>,
    session: &'s Session,
    options: QueryOptions,
}

impl<'s> Query<'s> {
    pub(crate) fn new(session: &'s Session, stmt: String, values: Vec<Value>) -> Self {
        Self {
            stmt,
            values,
            session,
            options: QueryOptions::default(),
        }
    }

    pub fn consistency(mut self, consistency: Consistency) -> Self {
        self.options.consistency = consistency;
        self
    }

    pub fn serial_consistency(mut self, serial: SerialConsistency) -> Self {
        self.options.serial_consistency = Some(serial);
        self
    }

    /// Client-side write timestamp, in microseconds since the epoch.
    pub fn timestamp(mut self, micros: i64) -> Self {
        self.options.timestamp = Some(micros);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout = Some(timeout);
        self
    }

    pub fn idempotent(mut self, idempotent: bool) -> Self {
        self.options.idempotent = idempotent;
        self
    }

    pub fn get_consistency(&self) -> Consistency {
        self.options.consistency
    }

    pub fn statement(&self) -> &str {
        &self.stmt
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Execute and return a cursor over the result.
    ///
    /// Bind failures and a closed session produce an `Iter` holding only
    /// the error; the driver is not contacted. The statement is released
    /// before this returns.
    pub async fn iter(self) -> Iter {
        if self.session.is_closed() {
            metrics::record_rejected("session_closed");
            return Iter::failed(CassError::SessionClosed);
        }

        let mut statement = Statement::new(self.stmt, self.options);
        if let Err(e) = statement.bind(self.values) {
            warn!("Rejected statement {:?}: {}", statement.text(), e);
            metrics::record_rejected("bind");
            return Iter::failed(e);
        }

        match self.session.execute(&statement).await {
            Ok(result) => Iter::new(result),
            Err(e) => Iter::failed(e),
        }
    }

    /// Execute a statement whose rows are not needed.
    pub async fn exec(self) -> Result<(), CassError> {
        self.iter().await.close()
    }
}
