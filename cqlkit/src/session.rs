use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::consistency::Consistency;
use crate::database::{DriverFactory, Driver, ResultSet};
use crate::errors::CassError;
use crate::metrics;
use crate::query::Query;
use crate::statement::Statement;
use crate::types::BindValues;

/// Entry point for building and running queries against one driver.
pub struct Session {
    driver: Arc<dyn Driver>,
    default_consistency: Consistency,
    closed: AtomicBool,
}

impl Session {
    /// Connect using the driver named in `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, CassError> {
        let driver = DriverFactory::create_from_config(config).await?;
        info!(
            "Session ready on {} (default consistency {})",
            driver.driver_name(),
            config.consistency
        );
        Ok(Self::with_driver(driver).with_default_consistency(config.consistency))
    }

    pub fn with_driver(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            default_consistency: Consistency::default(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn with_default_consistency(mut self, consistency: Consistency) -> Self {
        self.default_consistency = consistency;
        self
    }

    /// Start a query. Nothing is validated until [`Query::iter`].
    pub fn query(&self, stmt: impl Into<String>, values: impl BindValues) -> Query<'_> {
        Query::new(self, stmt.into(), values.into_values())
            .consistency(self.default_consistency)
    }

    pub fn default_consistency(&self) -> Consistency {
        self.default_consistency
    }

    pub fn driver_name(&self) -> &str {
        self.driver.driver_name()
    }

    /// Reject every query issued from now on with `SessionClosed`.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            info!("Session on {} closed", self.driver.driver_name());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn health_check(&self) -> Result<(), CassError> {
        if self.is_closed() {
            return Err(CassError::SessionClosed);
        }
        self.driver.health_check().await
    }

    pub(crate) async fn execute(
        &self,
        statement: &Statement,
    ) -> Result<Box<dyn ResultSet>, CassError> {
        let start = Instant::now();
        let consistency = statement.consistency();

        let result = self.driver.execute(statement).await;

        let elapsed = start.elapsed();
        metrics::record_query(
            self.driver.driver_name(),
            consistency,
            result.is_ok(),
            elapsed.as_secs_f64(),
        );

        match &result {
            Ok(_) => debug!("Query completed at {} in {:?}", consistency, elapsed),
            Err(e) => warn!("Query failed at {}: {}", consistency, e),
        }

        result
    }
}
