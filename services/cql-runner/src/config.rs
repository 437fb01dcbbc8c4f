use anyhow::Result;
use config::{Config, Environment, File};
use cqlkit::config::DatabaseConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub database: DatabaseConfig,
}

pub fn load_config(path: &str) -> Result<RunnerConfig> {
    let config = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(Environment::with_prefix("CQL_RUNNER").separator("__"))
        .build()?;

    Ok(config.try_deserialize()?)
}
