// cqlkit/src/database/factory.rs
//
// Runtime driver selection
// Supports: ScyllaDB, Cassandra 4.x (both over the scylla crate)
//

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Driver, ScyllaDriver};
use crate::config::DatabaseConfig;
use crate::errors::CassError;

/// Supported database drivers
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    #[default]
    Scylla,
    Cassandra,
}

impl DatabaseDriver {
    pub fn name(&self) -> &'static str {
        match self {
            DatabaseDriver::Scylla => "scylla",
            DatabaseDriver::Cassandra => "cassandra",
        }
    }
}

impl From<&str> for DatabaseDriver {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "cassandra" | "cassandra4" | "cass" => DatabaseDriver::Cassandra,
            "scylla" | "scylladb" => DatabaseDriver::Scylla,
            _ => DatabaseDriver::Scylla, // Default to Scylla
        }
    }
}

impl From<String> for DatabaseDriver {
    fn from(s: String) -> Self {
        DatabaseDriver::from(s.as_str())
    }
}

pub struct DriverFactory;

impl DriverFactory {
    /// Create a driver connection for the given driver type
    pub async fn create(
        driver: DatabaseDriver,
        config: &DatabaseConfig,
    ) -> Result<Arc<dyn Driver>, CassError> {
        info!("Creating database connection with driver: {:?}", driver);

        if config.hosts.is_empty() {
            return Err(CassError::NoConnections);
        }

        if driver == DatabaseDriver::Cassandra {
            // Same CQL binary protocol, so the scylla driver serves both
            info!("Using Scylla driver for Cassandra 4.x compatibility");
        }

        let conn = ScyllaDriver::connect(config, driver.name()).await?;
        Ok(Arc::new(conn))
    }

    /// Create from config (reads driver field from config)
    pub async fn create_from_config(config: &DatabaseConfig) -> Result<Arc<dyn Driver>, CassError> {
        let driver = DatabaseDriver::from(config.driver.as_str());
        Self::create(driver, config).await
    }
}
