use serde::{Deserialize, Serialize};

use crate::consistency::Consistency;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub hosts: Vec<String>,
    pub port: u16,
    pub keyspace: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub connection_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub pool_size: u32,
    /// "scylla" or "cassandra"; unknown names fall back to scylla.
    pub driver: String,
    /// Consistency new queries start with.
    pub consistency: Consistency,
    pub speculative_execution: bool,
    pub speculative_delay_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["localhost".to_string()],
            port: 9042,
            keyspace: "system".to_string(),
            username: None,
            password: None,
            connection_timeout_ms: 5_000,
            request_timeout_ms: 10_000,
            pool_size: 4,
            driver: "scylla".to_string(),
            consistency: Consistency::ONE,
            speculative_execution: false,
            speculative_delay_ms: 100,
        }
    }
}
